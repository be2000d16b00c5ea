// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::marker::MarkerLayerConfig;
use crate::record::DEFAULT_DATA_PATH;
use crate::tile::{TileLayerConfig, MAX_REQUESTS, OSM_TILE_URL};
use crate::tooltip::TooltipOptions;
use crate::view::MapOptions;
use crate::AlertMapError;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE: &str = "settings.json";
pub const DEFAULT_USER_AGENT: &str = concat!("Alert-Map/", env!("CARGO_PKG_VERSION"));

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn default_tile_url() -> String {
    OSM_TILE_URL.to_string()
}

fn default_max_requests() -> usize {
    MAX_REQUESTS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSettings {
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default)]
    pub show_border: bool,
    #[serde(default)]
    pub escape_tooltips: bool,
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            show_border: false,
            escape_tooltips: false,
            tile_url: default_tile_url(),
            max_requests: default_max_requests(),
            user_agent: default_user_agent(),
        }
    }
}

impl MapSettings {
    pub fn settings_path() -> PathBuf {
        crate::get_config_root().join(SETTINGS_FILE)
    }

    /// Loads the per-user settings; anything missing or unreadable falls back to
    /// the defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No settings file, using defaults — path={}", path.display());
            return Self::default();
        }
        match std::fs::read_to_string(path)
            .map_err(AlertMapError::from)
            .and_then(|content| serde_json::from_str::<MapSettings>(&content).map_err(Into::into))
        {
            Ok(settings) => settings,
            Err(e) => {
                warn!(
                    "Settings unreadable, using defaults — path={} error={}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AlertMapError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            show_border: self.show_border,
            on_tiles_load: None,
            tooltip: TooltipOptions {
                escape_html: self.escape_tooltips,
            },
        }
    }

    pub fn tile_layer(&self) -> TileLayerConfig {
        TileLayerConfig {
            url_template: self.tile_url.clone(),
            max_requests: self.max_requests.max(1),
            ..TileLayerConfig::with_border(self.show_border)
        }
    }

    pub fn marker_layer(&self) -> MarkerLayerConfig {
        MarkerLayerConfig {
            data_path: self.data_path.clone(),
            ..MarkerLayerConfig::default()
        }
    }
}
