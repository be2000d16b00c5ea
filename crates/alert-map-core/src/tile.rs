// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Basemap tiles: slippy-map coordinates, the tile layer configuration and the
//! sub-layers drawn for each loaded tile.

use serde::Serialize;
use std::f64::consts::PI;
use std::fmt;

pub const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const TILE_SIZE: u32 = 256;
pub const MIN_TILE_ZOOM: u32 = 0;
pub const MAX_TILE_ZOOM: u32 = 19;
/// OSM tiles are served over HTTP/2, so many requests can be in flight at once.
pub const MAX_REQUESTS: usize = 20;

pub const BORDER_COLOR: [u8; 3] = [255, 0, 0];
pub const BORDER_WIDTH_MIN_PIXELS: f32 = 4.0;
pub const HIGHLIGHT_COLOR: [u8; 4] = [60, 60, 60, 40];

// --- Tile Coordinates ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileCoords {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl fmt::Display for TileCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

impl TileCoords {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Stable identifier used to name the sub-layers of this tile.
    pub fn id(&self) -> String {
        format!("{}-{}-{}", self.x, self.y, self.z)
    }

    pub fn is_valid(&self) -> bool {
        self.z <= MAX_TILE_ZOOM && self.x < (1 << self.z) && self.y < (1 << self.z)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let n = f64::from(1u32 << self.z);
        BoundingBox {
            west: tile_x_to_lon(f64::from(self.x), n),
            south: tile_y_to_lat(f64::from(self.y + 1), n),
            east: tile_x_to_lon(f64::from(self.x + 1), n),
            north: tile_y_to_lat(f64::from(self.y), n),
        }
    }
}

fn tile_x_to_lon(x: f64, n: f64) -> f64 {
    x / n * 360.0 - 180.0
}

fn tile_y_to_lat(y: f64, n: f64) -> f64 {
    (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees()
}

/// Geographic extent of a tile, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn bounds(&self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Closed outline NW → SW → SE → NE → NW.
    pub fn outline(&self) -> Vec<[f64; 2]> {
        vec![
            [self.west, self.north],
            [self.west, self.south],
            [self.east, self.south],
            [self.east, self.north],
            [self.west, self.north],
        ]
    }
}

// --- Tile Layer ---
#[derive(Debug, Clone, PartialEq)]
pub struct TileLayerConfig {
    pub id: String,
    pub url_template: String,
    pub min_zoom: u32,
    pub max_zoom: u32,
    pub tile_size: u32,
    pub max_requests: usize,
    pub pickable: bool,
    pub auto_highlight: bool,
    pub highlight_color: [u8; 4],
}

impl Default for TileLayerConfig {
    fn default() -> Self {
        Self {
            id: "tiles".to_string(),
            url_template: OSM_TILE_URL.to_string(),
            min_zoom: MIN_TILE_ZOOM,
            max_zoom: MAX_TILE_ZOOM,
            tile_size: TILE_SIZE,
            max_requests: MAX_REQUESTS,
            pickable: false,
            auto_highlight: false,
            highlight_color: HIGHLIGHT_COLOR,
        }
    }
}

impl TileLayerConfig {
    /// Tile layer with hover highlighting tied to the debug border toggle.
    pub fn with_border(show_border: bool) -> Self {
        Self {
            auto_highlight: show_border,
            ..Self::default()
        }
    }

    pub fn tile_url(&self, coords: TileCoords) -> String {
        self.url_template
            .replace("{z}", &coords.z.to_string())
            .replace("{x}", &coords.x.to_string())
            .replace("{y}", &coords.y.to_string())
    }

    /// Standard-density displays fetch one level coarser than the view zoom.
    pub fn zoom_offset(device_pixel_ratio: f64) -> i32 {
        if device_pixel_ratio == 1.0 {
            -1
        } else {
            0
        }
    }

    /// Tile level fetched for a view zoom. The view uses 512px world units, one
    /// zoom level above the 256px tile grid.
    pub fn tile_zoom(&self, view_zoom: f64, device_pixel_ratio: f64) -> u32 {
        let grid_offset = (crate::viewport::WORLD_SIZE / f64::from(self.tile_size)).log2();
        let z = (view_zoom + grid_offset).round() as i64
            + i64::from(Self::zoom_offset(device_pixel_ratio));
        z.clamp(i64::from(self.min_zoom), i64::from(self.max_zoom)) as u32
    }
}

// --- Sub-layers ---
/// A loaded tile handed to [`render_sub_layers`].
#[derive(Debug, Clone)]
pub struct SubLayerProps<I> {
    pub id: String,
    pub bounding_box: BoundingBox,
    pub data: I,
}

impl<I> SubLayerProps<I> {
    pub fn for_tile(layer_id: &str, coords: TileCoords, data: I) -> Self {
        Self {
            id: format!("{}-{}", layer_id, coords.id()),
            bounding_box: coords.bounding_box(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BitmapLayer<I> {
    pub id: String,
    pub image: I,
    pub bounds: [f64; 4],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathLayer {
    pub id: String,
    pub path: Vec<[f64; 2]>,
    pub color: [u8; 3],
    pub width_min_pixels: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SubLayer<I> {
    Bitmap(BitmapLayer<I>),
    Path(PathLayer),
}

/// Drawables for one tile: the bitmap stretched over the tile's bounding box, then
/// a red outline when `show_border` is set.
pub fn render_sub_layers<I>(props: SubLayerProps<I>, show_border: bool) -> Vec<SubLayer<I>> {
    let SubLayerProps {
        id,
        bounding_box,
        data,
    } = props;

    let border = show_border.then(|| PathLayer {
        id: format!("{}-border", id),
        path: bounding_box.outline(),
        color: BORDER_COLOR,
        width_min_pixels: BORDER_WIDTH_MIN_PIXELS,
    });

    let mut layers = vec![SubLayer::Bitmap(BitmapLayer {
        id,
        image: data,
        bounds: bounding_box.bounds(),
    })];
    layers.extend(border.map(SubLayer::Path));
    layers
}

// --- Viewport Load ---
/// Reports when every tile of the visible set has finished loading, once per
/// distinct visible set.
#[derive(Debug, Default)]
pub struct ViewportLoadTracker {
    reported: Option<Vec<TileCoords>>,
}

impl ViewportLoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `is_settled` answers whether a tile's fetch has completed, successfully or
    /// not. Returns `true` the first time the given set is fully settled.
    pub fn observe<F>(&mut self, visible: &[TileCoords], is_settled: F) -> bool
    where
        F: Fn(&TileCoords) -> bool,
    {
        if visible.is_empty() {
            return false;
        }
        let mut key = visible.to_vec();
        key.sort();
        key.dedup();

        if self.reported.as_ref() == Some(&key) {
            return false;
        }
        if key.iter().all(|c| is_settled(c)) {
            self.reported = Some(key);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_template() {
        let config = TileLayerConfig::default();
        assert_eq!(
            config.tile_url(TileCoords::new(1012, 641, 10)),
            "https://tile.openstreetmap.org/10/1012/641.png"
        );
    }

    #[test]
    fn test_bounding_box_of_root_tile() {
        let bbox = TileCoords::new(0, 0, 0).bounding_box();
        assert_eq!(bbox.west, -180.0);
        assert_eq!(bbox.east, 180.0);
        assert!((bbox.north - 85.0511).abs() < 1e-4);
        assert!((bbox.south + 85.0511).abs() < 1e-4);
    }

    #[test]
    fn test_bounding_box_quadrant() {
        // z=1, x=1, y=1 is the south-east quadrant
        let bbox = TileCoords::new(1, 1, 1).bounding_box();
        assert_eq!(bbox.west, 0.0);
        assert_eq!(bbox.east, 180.0);
        assert!(bbox.north.abs() < 1e-9);
        assert!(bbox.south < -85.0);
    }

    #[test]
    fn test_zoom_offset_by_pixel_ratio() {
        assert_eq!(TileLayerConfig::zoom_offset(1.0), -1);
        assert_eq!(TileLayerConfig::zoom_offset(2.0), 0);
        assert_eq!(TileLayerConfig::zoom_offset(1.5), 0);
    }

    #[test]
    fn test_tile_zoom_is_clamped() {
        let config = TileLayerConfig::default();
        assert_eq!(config.tile_zoom(10.0, 1.0), 10);
        assert_eq!(config.tile_zoom(10.0, 2.0), 11);
        assert_eq!(config.tile_zoom(20.0, 2.0), 19);
        assert_eq!(config.tile_zoom(-3.0, 1.0), 0);
    }

    #[test]
    fn test_highlight_follows_border_toggle() {
        assert!(!TileLayerConfig::with_border(false).auto_highlight);
        let config = TileLayerConfig::with_border(true);
        assert!(config.auto_highlight);
        assert_eq!(config.highlight_color, [60, 60, 60, 40]);
        assert!(!config.pickable);
    }

    #[test]
    fn test_sub_layer_ids() {
        let props = SubLayerProps::for_tile("tiles", TileCoords::new(3, 5, 4), ());
        assert_eq!(props.id, "tiles-3-5-4");
        let layers = render_sub_layers(props, true);
        match &layers[1] {
            SubLayer::Path(path) => assert_eq!(path.id, "tiles-3-5-4-border"),
            other => panic!("expected border path, got {:?}", other),
        }
    }

    #[test]
    fn test_tracker_reports_once_per_viewport() {
        let mut tracker = ViewportLoadTracker::new();
        let a = [TileCoords::new(0, 0, 1), TileCoords::new(1, 0, 1)];

        assert!(!tracker.observe(&a, |c| c.x == 0));
        assert!(tracker.observe(&a, |_| true));
        assert!(!tracker.observe(&a, |_| true));

        // Same set in another order is the same viewport
        let reordered = [a[1], a[0]];
        assert!(!tracker.observe(&reordered, |_| true));

        let b = [TileCoords::new(1, 1, 1)];
        assert!(tracker.observe(&b, |_| true));
        assert!(!tracker.observe(&[], |_| true));
    }
}
