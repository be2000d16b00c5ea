// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use alert_map_core::marker::{render_markers, Marker};
use alert_map_core::record::AlertLoader;
use alert_map_core::settings::MapSettings;
use alert_map_core::tile::TileLayerConfig;
use alert_map_core::tooltip::tooltip_with;
use alert_map_core::view::{MapOptions, ViewComposition, ViewState, OSM_ATTRIBUTION};
use alert_map_core::{AlertRecord, TileCoords};
use iced::alignment::{Horizontal, Vertical};
use iced::widget::{button, column, container, row, stack, svg, text};
use iced::{window, Element, Length, Padding, Point, Size, Subscription, Task, Theme};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod map;
mod style;
mod tiles;
use map::AlertMapView;
use tiles::TileManager;

const TICK_INTERVAL: Duration = Duration::from_millis(250);
const TOOLTIP_OFFSET: f32 = 12.0;

fn main() -> iced::Result {
    let _ = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    let mut settings = MapSettings::load();
    if let Ok(path) = std::env::var("ALERT_MAP_DATA") {
        settings.data_path = PathBuf::from(path);
    }
    if let Ok(flag) = std::env::var("ALERT_MAP_SHOW_BORDER") {
        settings.show_border = matches!(flag.as_str(), "1" | "true" | "yes");
    }

    let options = MapOptions {
        on_tiles_load: Some(Arc::new(|| log::info!("All visible tiles loaded"))),
        ..settings.map_options()
    };

    mount(
        window::Settings {
            size: Size::new(1280.0, 800.0),
            ..Default::default()
        },
        settings,
        options,
    )
}

/// Opens the map in a window built from `target` and runs it until closed.
pub fn mount(target: window::Settings, settings: MapSettings, options: MapOptions) -> iced::Result {
    log::info!(
        "Mounting map — data={} show_border={}",
        settings.data_path.display(),
        options.show_border
    );
    iced::application("Alert Map", App::update, App::view)
        .subscription(App::subscription)
        .theme(|_| Theme::Light)
        .window(target)
        .run_with(move || App::new(settings, options))
}

#[derive(Debug, Clone)]
enum Message {
    AlertsLoaded(Result<Vec<AlertRecord>, String>),
    ViewChanged(ViewState),
    HoverMarker(Option<(usize, Point)>),
    HoverTile(Option<TileCoords>),
    ScaleFactorFetched(f32),
    OpenAttribution,
    Tick,
}

struct App {
    composition: ViewComposition,
    view_state: ViewState,
    records: Vec<AlertRecord>,
    markers: Vec<Marker>,
    icons: HashMap<String, svg::Handle>,
    hovered: Option<(usize, Point)>,
    hovered_tile: Option<TileCoords>,
    tile_manager: TileManager,
    device_pixel_ratio: f64,
    status: Option<String>,
}

impl App {
    fn new(settings: MapSettings, options: MapOptions) -> (Self, Task<Message>) {
        let mut composition =
            ViewComposition::new(ViewState::default(), settings.marker_layer(), options);
        composition.tile_layer = TileLayerConfig {
            auto_highlight: composition.options.show_border,
            ..settings.tile_layer()
        };

        let app = Self {
            view_state: composition.view_state,
            tile_manager: TileManager::new(
                composition.tile_layer.clone(),
                settings.user_agent.clone(),
            ),
            composition,
            records: Vec::new(),
            markers: Vec::new(),
            icons: HashMap::new(),
            hovered: None,
            hovered_tile: None,
            device_pixel_ratio: 1.0,
            status: None,
        };

        let data_path = app.composition.marker_layer.data_path.clone();
        let tasks = Task::batch(vec![
            Task::perform(async move { load_alerts(data_path) }, Message::AlertsLoaded),
            window::get_oldest()
                .and_then(window::get_scale_factor)
                .map(Message::ScaleFactorFetched),
        ]);

        (app, tasks)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::AlertsLoaded(Ok(records)) => {
                self.markers = render_markers(&records);
                self.icons = decode_icons(&self.markers);
                self.records = records;
                self.hovered = None;
                self.status = None;
                Task::none()
            }
            Message::AlertsLoaded(Err(e)) => {
                // The basemap stays usable without alert data
                log::error!("{}", e);
                self.records.clear();
                self.markers.clear();
                self.hovered = None;
                self.status = Some(e);
                Task::none()
            }
            Message::ViewChanged(view_state) => {
                self.view_state = view_state;
                Task::none()
            }
            Message::HoverMarker(hovered) => {
                self.hovered = hovered;
                Task::none()
            }
            Message::HoverTile(coords) => {
                self.hovered_tile = coords;
                Task::none()
            }
            Message::ScaleFactorFetched(factor) => {
                log::debug!("Display scale factor — factor={}", factor);
                self.device_pixel_ratio = f64::from(factor);
                Task::none()
            }
            Message::OpenAttribution => {
                if let Err(e) = open::that(OSM_ATTRIBUTION.href) {
                    log::warn!(
                        "Failed to open attribution link — href={} error={}",
                        OSM_ATTRIBUTION.href,
                        e
                    );
                }
                Task::none()
            }
            Message::Tick => {
                if self.tile_manager.poll_viewport_load() {
                    self.composition.options.notify_tiles_loaded();
                }
                Task::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(TICK_INTERVAL).map(|_| Message::Tick)
    }

    fn view(&self) -> Element<'_, Message> {
        let map: Element<'_, Message> = AlertMapView {
            composition: &self.composition,
            view_state: self.view_state,
            records: &self.records,
            markers: &self.markers,
            icons: &self.icons,
            hovered: self.hovered.map(|(index, _)| index),
            hovered_tile: self.hovered_tile,
            tile_manager: &self.tile_manager,
            device_pixel_ratio: self.device_pixel_ratio,
        }
        .into();

        let mut layers = stack![map];

        if let Some(tip) = self.view_tooltip() {
            layers = layers.push(tip);
        }
        if let Some(status) = &self.status {
            layers = layers.push(
                container(
                    container(text(status.as_str()).size(13))
                        .padding([4, 8])
                        .style(style::container_status),
                )
                .padding(10),
            );
        }

        layers.push(self.view_attribution()).into()
    }

    fn view_tooltip(&self) -> Option<Element<'_, Message>> {
        let (index, point) = self.hovered?;
        let tip = tooltip_with(self.records.get(index), self.composition.options.tooltip)?;

        let scale = tip
            .font_size
            .trim_end_matches("em")
            .parse::<f32>()
            .unwrap_or(1.0);
        let size = style::BASE_FONT_SIZE * scale;
        let [title, from, to] = tip.lines();

        let card = container(
            column![
                text(title).size(size).color(style::palette::TOOLTIP_TITLE),
                text(from).size(size),
                text(to).size(size),
            ]
            .spacing(2),
        )
        .padding(10)
        .max_width(320.0)
        .style(style::container_tooltip);

        Some(
            container(card)
                .padding(Padding {
                    top: point.y + TOOLTIP_OFFSET,
                    right: 0.0,
                    bottom: 0.0,
                    left: point.x + TOOLTIP_OFFSET,
                })
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
        )
    }

    fn view_attribution(&self) -> Element<'_, Message> {
        let link = button(text(OSM_ATTRIBUTION.link_text).size(style::ATTRIBUTION_FONT_SIZE))
            .padding(0)
            .style(style::button_link)
            .on_press(Message::OpenAttribution);

        let attribution = container(
            row![
                text(OSM_ATTRIBUTION.prefix).size(style::ATTRIBUTION_FONT_SIZE),
                link
            ]
            .align_y(Vertical::Center),
        )
        .padding([0, 5])
        .style(style::container_attribution);

        container(attribution)
            .width(Length::Fill)
            .height(Length::Fill)
            .align_x(Horizontal::Right)
            .align_y(Vertical::Bottom)
            .into()
    }
}

fn load_alerts(path: PathBuf) -> Result<Vec<AlertRecord>, String> {
    let loaded = AlertLoader::load_file(&path).map_err(|e| e.to_string())?;
    for skipped in &loaded.skipped {
        log::warn!("{}", skipped);
    }
    Ok(loaded.records)
}

/// One SVG handle per distinct icon URL.
fn decode_icons(markers: &[Marker]) -> HashMap<String, svg::Handle> {
    let mut icons = HashMap::new();
    for marker in markers {
        if icons.contains_key(&marker.icon.url) {
            continue;
        }
        match marker.icon.svg_bytes() {
            Some(bytes) => {
                icons.insert(marker.icon.url.clone(), svg::Handle::from_memory(bytes));
            }
            None => log::warn!("Unsupported marker icon — index={}", marker.index),
        }
    }
    icons
}
