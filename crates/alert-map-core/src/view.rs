// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Composition of the map: camera, tile layer, marker layer, tooltip and the
//! attribution that has to accompany the OSM basemap.

use crate::marker::{Marker, MarkerLayerConfig};
use crate::record::AlertRecord;
use crate::tile::{render_sub_layers, SubLayer, SubLayerProps, TileCoords, TileLayerConfig};
use crate::tooltip::{tooltip_with, Tooltip, TooltipOptions};
use crate::viewport::Viewport;
use std::fmt;
use std::sync::Arc;

// --- Camera ---
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub max_pitch: f64,
    pub pitch: f64,
    pub bearing: f64,
}

/// Auckland, New Zealand.
pub const INITIAL_VIEW_STATE: ViewState = ViewState {
    latitude: -36.9,
    longitude: 174.8,
    zoom: 10.0,
    min_zoom: 0.0,
    max_zoom: 20.0,
    max_pitch: 89.0,
    pitch: 0.0,
    bearing: 0.0,
};

impl Default for ViewState {
    fn default() -> Self {
        INITIAL_VIEW_STATE
    }
}

impl ViewState {
    pub fn viewport(&self, width: f32, height: f32) -> Viewport {
        Viewport {
            longitude: self.longitude,
            latitude: self.latitude,
            zoom: self.zoom,
            width,
            height,
        }
    }

    /// Takes the camera position of a viewport, respecting this state's zoom limits.
    pub fn follow(&self, viewport: &Viewport) -> ViewState {
        ViewState {
            latitude: viewport.latitude,
            longitude: viewport.longitude,
            zoom: viewport.zoom.clamp(self.min_zoom, self.max_zoom),
            ..*self
        }
    }
}

// --- Options ---
pub type TilesLoadedCallback = Arc<dyn Fn() + Send + Sync>;

/// Caller-facing switches of the map view.
#[derive(Clone, Default)]
pub struct MapOptions {
    /// Outline every tile in red and highlight the tile under the pointer.
    pub show_border: bool,
    /// Called whenever the tiles of the current viewport have all finished loading.
    pub on_tiles_load: Option<TilesLoadedCallback>,
    pub tooltip: TooltipOptions,
}

impl fmt::Debug for MapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapOptions")
            .field("show_border", &self.show_border)
            .field("on_tiles_load", &self.on_tiles_load.is_some())
            .field("tooltip", &self.tooltip)
            .finish()
    }
}

impl MapOptions {
    pub fn notify_tiles_loaded(&self) {
        if let Some(callback) = &self.on_tiles_load {
            callback();
        }
    }
}

// --- Attribution ---
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribution {
    pub prefix: &'static str,
    pub link_text: &'static str,
    pub href: &'static str,
    pub target: &'static str,
}

/// Required by the OSM tile usage policy on every rendered map.
pub const OSM_ATTRIBUTION: Attribution = Attribution {
    prefix: "© ",
    link_text: "OpenStreetMap contributors",
    href: "http://www.openstreetmap.org/copyright",
    target: "blank",
};

impl Attribution {
    pub fn html(&self) -> String {
        format!(
            "{}<a href=\"{}\" target=\"{}\">{}</a>",
            self.prefix, self.href, self.target, self.link_text
        )
    }

    pub fn text(&self) -> String {
        format!("{}{}", self.prefix, self.link_text)
    }
}

// --- Composition ---
#[derive(Debug, Clone)]
pub struct ViewComposition {
    pub view_state: ViewState,
    pub tile_layer: TileLayerConfig,
    pub marker_layer: MarkerLayerConfig,
    pub options: MapOptions,
}

impl ViewComposition {
    pub fn new(
        view_state: ViewState,
        marker_layer: MarkerLayerConfig,
        options: MapOptions,
    ) -> Self {
        Self {
            view_state,
            tile_layer: TileLayerConfig::with_border(options.show_border),
            marker_layer,
            options,
        }
    }

    /// Everything to draw for one frame, bottom to top: tile sub-layers, the
    /// highlighted tile, markers, tooltip, attribution.
    pub fn compose<'a, I, T>(
        &self,
        tiles: T,
        markers: &'a [Marker],
        hovered_record: Option<&AlertRecord>,
        hovered_tile: Option<TileCoords>,
    ) -> Frame<'a, I>
    where
        T: IntoIterator<Item = (TileCoords, I)>,
    {
        let show_border = self.options.show_border;
        let tile_layers = tiles
            .into_iter()
            .flat_map(|(coords, image)| {
                render_sub_layers(
                    SubLayerProps::for_tile(&self.tile_layer.id, coords, image),
                    show_border,
                )
            })
            .collect();

        let highlight = if self.tile_layer.auto_highlight {
            hovered_tile.map(|coords| (coords, self.tile_layer.highlight_color))
        } else {
            None
        };

        Frame {
            tile_layers,
            highlight,
            markers,
            tooltip: tooltip_with(hovered_record, self.options.tooltip),
            attribution: OSM_ATTRIBUTION,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Frame<'a, I> {
    pub tile_layers: Vec<SubLayer<I>>,
    pub highlight: Option<(TileCoords, [u8; 4])>,
    pub markers: &'a [Marker],
    pub tooltip: Option<Tooltip>,
    pub attribution: Attribution,
}
