// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Builds the alert CSV from the live Auckland Transport service-alert feed and a
//! GTFS `stops.txt`.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration as ChronoDuration};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

pub const FEED_URL: &str = "https://api.at.govt.nz/realtime/legacy/servicealerts";
pub const DEFAULT_OUTPUT_PATH: &str = "./data/upload/alerts.csv";
pub const DEFAULT_STOPS_PATH: &str = "./stops.txt";
pub const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Feed timestamps are shown in New Zealand standard time.
const LOCAL_OFFSET_HOURS: i64 = 12;
const PERIOD_FORMAT: &str = "%d/%m/%Y, %H:%M:%S";

// --- Feed Model ---
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEnvelope {
    pub response: FeedMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedMessage {
    #[serde(default)]
    pub entity: Vec<FeedEntity>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedEntity {
    pub id: String,
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Alert {
    #[serde(default)]
    pub active_period: Vec<TimeRange>,
    #[serde(default)]
    pub informed_entity: Vec<InformedEntity>,
    pub header_text: Option<TranslatedString>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InformedEntity {
    pub stop_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslatedString {
    #[serde(default)]
    pub translation: Vec<Translation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Translation {
    pub text: String,
}

// --- GTFS Stops ---
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stop {
    pub stop_id: String,
    #[serde(default)]
    pub stop_code: Option<String>,
    #[serde(default)]
    pub stop_lat: Option<f64>,
    #[serde(default)]
    pub stop_lon: Option<f64>,
    #[serde(default)]
    pub stop_name: Option<String>,
}

pub fn parse_stops<R: Read>(reader: R) -> Result<HashMap<String, Stop>> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut stops = HashMap::new();

    for result in rdr.deserialize::<Stop>() {
        match result {
            Ok(stop) => {
                stops.insert(stop.stop_id.clone(), stop);
            }
            Err(e) => warn!("Skipping unreadable stop row — error={}", e),
        }
    }
    Ok(stops)
}

pub fn load_stops<P: AsRef<Path>>(path: P) -> Result<HashMap<String, Stop>> {
    let file = std::fs::File::open(path.as_ref())
        .with_context(|| format!("Failed to open stops file {}", path.as_ref().display()))?;
    let stops = parse_stops(file)?;
    debug!("Loaded GTFS stops — count={}", stops.len());
    Ok(stops)
}

// --- Output ---
/// One line of the alert CSV.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRow {
    pub stop_code: String,
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
    pub stop_name: Option<String>,
    pub alert_text: String,
    pub period_start: String,
    pub period_end: String,
}

/// Unix seconds → local wall-clock text, e.g. `01/02/2024, 22:00:00`.
pub fn format_period(secs: Option<i64>) -> String {
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|utc| {
            (utc + ChronoDuration::hours(LOCAL_OFFSET_HOURS))
                .format(PERIOD_FORMAT)
                .to_string()
        })
        .unwrap_or_default()
}

/// One row per stop named by an alert, joined with the stop's coordinates.
/// Entities without a stop are dropped; stops missing from `stops` keep empty
/// coordinates.
pub fn build_rows(feed: &FeedMessage, stops: &HashMap<String, Stop>) -> Vec<AlertRow> {
    let mut rows = Vec::new();

    for entity in &feed.entity {
        let Some(alert) = &entity.alert else {
            continue;
        };
        let alert_text = alert
            .header_text
            .as_ref()
            .and_then(|h| h.translation.first())
            .map(|t| t.text.clone())
            .unwrap_or_default();
        let period = alert.active_period.first();
        let period_start = format_period(period.and_then(|p| p.start));
        let period_end = format_period(period.and_then(|p| p.end));

        for informed in &alert.informed_entity {
            let Some(stop_id) = informed.stop_id.as_deref() else {
                continue;
            };
            let stop = stops.get(stop_id);
            if stop.is_none() {
                debug!("Alert references unknown stop — alert={} stop_id={}", entity.id, stop_id);
            }

            rows.push(AlertRow {
                stop_code: stop
                    .and_then(|s| s.stop_code.clone())
                    .unwrap_or_default(),
                stop_lat: stop.and_then(|s| s.stop_lat),
                stop_lon: stop.and_then(|s| s.stop_lon),
                stop_name: stop.and_then(|s| s.stop_name.clone()),
                alert_text: alert_text.clone(),
                period_start: period_start.clone(),
                period_end: period_end.clone(),
            });
        }
    }

    rows
}

pub fn write_rows<W: Write>(writer: W, rows: &[AlertRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv<P: AsRef<Path>>(path: P, rows: &[AlertRow]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_rows(file, rows)
}

// --- Fetch ---
pub struct AlertSync {
    client: reqwest::blocking::Client,
    api_key: String,
    url: String,
}

impl AlertSync {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            url: FEED_URL.to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn fetch_feed(&self) -> Result<FeedMessage> {
        info!("Fetching service alerts — url={}", self.url);
        let response = self
            .client
            .get(&self.url)
            .header("Cache-Control", "no-cache")
            .header(API_KEY_HEADER, &self.api_key)
            .send()?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            bail!("Alert feed returned HTTP {}", status.as_u16());
        }

        let envelope: FeedEnvelope = response.json().context("Malformed alert feed")?;
        debug!("Alert feed parsed — entities={}", envelope.response.entity.len());
        Ok(envelope.response)
    }

    /// Fetches the feed, joins it with `stops_path` and writes `out_path`.
    /// Returns the number of rows written.
    pub fn run(&self, stops_path: &Path, out_path: &Path) -> Result<usize> {
        let stops = load_stops(stops_path)?;
        let feed = self.fetch_feed()?;
        let rows = build_rows(&feed, &stops);
        write_csv(out_path, &rows)?;
        info!(
            "Alert CSV written — path={} rows={}",
            out_path.display(),
            rows.len()
        );
        Ok(rows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const STOPS: &str = "stop_id,stop_code,stop_name,stop_lat,stop_lon,location_type\n\
                         100-56c57897,100,Papatoetoe Train Station,-36.97766,174.84925,0\n\
                         7001-a1b2,7001,Britomart,-36.84429,174.76759,0\n";

    const FEED: &str = r#"{
        "status": "OK",
        "response": {
            "header": { "timestamp": 1706745600 },
            "entity": [
                {
                    "id": "alert-1",
                    "alert": {
                        "active_period": [{ "start": 1706745600, "end": 1706832000 }],
                        "informed_entity": [
                            { "stop_id": "100-56c57897" },
                            { "route_id": "STH-201" },
                            { "stop_id": "9999-missing" }
                        ],
                        "header_text": { "translation": [{ "text": "Lift out of service", "language": "en" }] }
                    }
                },
                { "id": "no-alert" }
            ]
        }
    }"#;

    fn feed() -> FeedMessage {
        serde_json::from_str::<FeedEnvelope>(FEED).unwrap().response
    }

    #[test]
    fn test_format_period_shifts_to_local_time() {
        // 2024-02-01T00:00:00Z
        assert_eq!(format_period(Some(1706745600)), "01/02/2024, 12:00:00");
        assert_eq!(format_period(None), "");
    }

    #[test]
    fn test_parse_stops() {
        let stops = parse_stops(Cursor::new(STOPS)).unwrap();
        assert_eq!(stops.len(), 2);
        let britomart = &stops["7001-a1b2"];
        assert_eq!(britomart.stop_code.as_deref(), Some("7001"));
        assert_eq!(britomart.stop_lat, Some(-36.84429));
    }

    #[test]
    fn test_build_rows_joins_stops() {
        let stops = parse_stops(Cursor::new(STOPS)).unwrap();
        let rows = build_rows(&feed(), &stops);

        // Route-only entities are dropped, unknown stops are kept without coordinates
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].stop_code, "100");
        assert_eq!(rows[0].stop_lat, Some(-36.97766));
        assert_eq!(rows[0].stop_lon, Some(174.84925));
        assert_eq!(rows[0].alert_text, "Lift out of service");
        assert_eq!(rows[0].period_start, "01/02/2024, 12:00:00");
        assert_eq!(rows[0].period_end, "02/02/2024, 12:00:00");
        assert_eq!(rows[1].stop_lat, None);
        assert_eq!(rows[1].stop_code, "");
    }

    #[test]
    fn test_write_rows_header() {
        let stops = parse_stops(Cursor::new(STOPS)).unwrap();
        let rows = build_rows(&feed(), &stops);
        let mut out = Vec::new();
        write_rows(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("stop_code,stop_lat,stop_lon,stop_name,alert_text,period_start,period_end")
        );
        assert_eq!(
            lines.next(),
            Some("100,-36.97766,174.84925,Papatoetoe Train Station,Lift out of service,\"01/02/2024, 12:00:00\",\"02/02/2024, 12:00:00\"")
        );
        assert_eq!(
            lines.next(),
            Some(",,,,Lift out of service,\"01/02/2024, 12:00:00\",\"02/02/2024, 12:00:00\"")
        );
    }
}
