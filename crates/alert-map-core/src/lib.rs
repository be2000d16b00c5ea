// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod marker;
pub mod record;
pub mod settings;
pub mod sync;
pub mod tile;
pub mod tooltip;
pub mod viewport;
pub mod view;

use std::path::PathBuf;
use thiserror::Error;

pub use record::AlertRecord;
pub use tile::TileCoords;

#[derive(Error, Debug)]
pub enum AlertMapError {
    /// The alert CSV could not be opened or its header could not be read.
    /// The marker layer renders empty; the basemap is unaffected.
    #[error("Failed to load alert data from {path}: {reason}")]
    DataLoad { path: String, reason: String },
    /// A single tile could not be fetched or decoded. Only that cell stays empty.
    #[error("Failed to load tile {coords}: {reason}")]
    TileLoad { coords: TileCoords, reason: String },
    /// A CSV row is missing a required field or holds an unparsable number.
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Root directory for settings and other per-user files.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "alert-map", "Alert-Map")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
