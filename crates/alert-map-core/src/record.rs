// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::AlertMapError;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const DEFAULT_DATA_PATH: &str = "./upload/alerts.csv";

/// One service alert attached to a stop. Field names match the CSV header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub stop_lat: f64,
    pub stop_lon: f64,
    #[serde(default)]
    pub stop_code: String,
    #[serde(default)]
    pub alert_text: String,
    #[serde(default)]
    pub period_start: String,
    #[serde(default)]
    pub period_end: String,
    #[serde(default)]
    pub stop_name: Option<String>,
}

/// Result of reading an alert file: the usable rows, in file order, plus the rows
/// that were dropped.
#[derive(Debug, Default)]
pub struct LoadedAlerts {
    pub records: Vec<AlertRecord>,
    pub skipped: Vec<AlertMapError>,
}

impl LoadedAlerts {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct AlertLoader;

impl AlertLoader {
    /// Opens and parses an alert CSV. A missing or headerless file is a
    /// `DataLoad` error; individual bad rows are skipped.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<LoadedAlerts, AlertMapError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| AlertMapError::DataLoad {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let loaded = Self::parse(file).map_err(|e| match e {
            AlertMapError::DataLoad { reason, .. } => AlertMapError::DataLoad {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })?;

        info!(
            "Alert data loaded — path={} records={} skipped={}",
            path.display(),
            loaded.records.len(),
            loaded.skipped.len()
        );
        Ok(loaded)
    }

    pub fn parse<R: Read>(reader: R) -> Result<LoadedAlerts, AlertMapError> {
        // Blank lines are skipped by the csv reader itself.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr
            .headers()
            .map_err(|e| AlertMapError::DataLoad {
                path: String::new(),
                reason: e.to_string(),
            })?
            .clone();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AlertMapError::DataLoad {
                path: String::new(),
                reason: "missing header row".to_string(),
            });
        }

        let mut loaded = LoadedAlerts::default();

        for result in rdr.records() {
            let raw = match result {
                Ok(r) => r,
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or(0);
                    warn!("Skipping unreadable CSV row — line={} error={}", line, e);
                    loaded.skipped.push(AlertMapError::MalformedRecord {
                        line,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let line = raw.position().map(|p| p.line()).unwrap_or(0);

            match raw.deserialize::<AlertRecord>(Some(&headers)) {
                Ok(record) => {
                    if !record.stop_lat.is_finite() || !record.stop_lon.is_finite() {
                        warn!("Skipping alert with non-finite position — line={}", line);
                        loaded.skipped.push(AlertMapError::MalformedRecord {
                            line,
                            reason: "non-finite coordinate".to_string(),
                        });
                        continue;
                    }
                    loaded.records.push(record);
                }
                Err(e) => {
                    debug!("Skipping malformed alert row — line={} error={}", line, e);
                    loaded.skipped.push(AlertMapError::MalformedRecord {
                        line,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(loaded)
    }
}
