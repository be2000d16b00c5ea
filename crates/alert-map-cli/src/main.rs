// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use alert_map_core::marker::render_markers;
use alert_map_core::record::{AlertLoader, LoadedAlerts};
use alert_map_core::settings::MapSettings;
use alert_map_core::sync::{AlertSync, DEFAULT_OUTPUT_PATH, DEFAULT_STOPS_PATH};
use alert_map_core::tile::{render_sub_layers, SubLayerProps};
use alert_map_core::tooltip::tooltip_with;
use alert_map_core::TileCoords;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the alert CSV
    #[arg(short, long, env = "ALERT_MAP_DATA")]
    data: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch live service alerts and write the alert CSV
    Sync {
        /// GTFS stops.txt to join alerts against
        #[arg(long, default_value = DEFAULT_STOPS_PATH)]
        stops: PathBuf,
        /// Where to write the CSV
        #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
        out: PathBuf,
        /// Subscription key for the alert feed
        #[arg(long, env = "AT_KEY", hide_env_values = true)]
        api_key: String,
        /// Override the feed URL
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the marker layer as JSON
    Markers,
    /// Print the tooltip for the record at INDEX
    Tooltip {
        index: usize,
        /// Escape record text before embedding it
        #[arg(long)]
        escape: bool,
    },
    /// Print the sub-layers drawn for one tile
    Tile {
        z: u32,
        x: u32,
        y: u32,
        #[arg(long)]
        show_border: bool,
    },
    /// Show the settings file, optionally writing the defaults first
    Settings {
        #[arg(long)]
        init: bool,
    },
}

fn load(path: &Path) -> Result<LoadedAlerts> {
    let loaded = AlertLoader::load_file(path)?;
    for skipped in &loaded.skipped {
        log::warn!("{}", skipped);
    }
    Ok(loaded)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);

    let settings = MapSettings::load();
    let data_path = cli.data.unwrap_or_else(|| settings.data_path.clone());

    match cli.command {
        Commands::Sync {
            stops,
            out,
            api_key,
            url,
        } => {
            let mut sync = AlertSync::new(api_key)?;
            if let Some(url) = url {
                sync = sync.with_url(url);
            }
            let rows = sync.run(&stops, &out)?;
            println!("Wrote {} alert rows to {}", rows, out.display());
        }
        Commands::Markers => {
            let loaded = load(&data_path)?;
            let markers = render_markers(&loaded.records);
            println!("{}", serde_json::to_string_pretty(&markers)?);
        }
        Commands::Tooltip { index, escape } => {
            let loaded = load(&data_path)?;
            let mut options = settings.map_options().tooltip;
            options.escape_html |= escape;

            match tooltip_with(loaded.records.get(index), options) {
                Some(tip) => println!("{}", tip.html),
                None => bail!(
                    "No record at index {} ({} records loaded)",
                    index,
                    loaded.records.len()
                ),
            }
        }
        Commands::Tile {
            z,
            x,
            y,
            show_border,
        } => {
            let coords = TileCoords::new(x, y, z);
            if !coords.is_valid() {
                bail!("Tile {} is outside the zoom {} grid", coords, z);
            }
            let layer = settings.tile_layer();
            let props = SubLayerProps::for_tile(&layer.id, coords, layer.tile_url(coords));
            let sub_layers = render_sub_layers(props, show_border || settings.show_border);
            println!("{}", serde_json::to_string_pretty(&sub_layers)?);
        }
        Commands::Settings { init } => {
            let path = MapSettings::settings_path();
            if init {
                MapSettings::default().save_to(&path)?;
                println!("Wrote default settings to {}", path.display());
            }
            println!("{}", path.display());
            println!("{}", serde_json::to_string_pretty(&MapSettings::load_from(&path))?);
        }
    }

    Ok(())
}
