// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::tile::TileCoords;

// --- Web Mercator Math ---
/// Width of the whole world at zoom 0, in screen pixels.
pub const WORLD_SIZE: f64 = 512.0;
pub const MAX_LATITUDE: f64 = 85.051_128_78;

pub fn lon_to_x(lon: f64, zoom: f64) -> f64 {
    ((lon + 180.0) / 360.0) * 2.0f64.powf(zoom) * WORLD_SIZE
}

pub fn lat_to_y(lat: f64, zoom: f64) -> f64 {
    let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0
        * 2.0f64.powf(zoom)
        * WORLD_SIZE
}

pub fn x_to_lon(x: f64, zoom: f64) -> f64 {
    (x / (WORLD_SIZE * 2.0f64.powf(zoom))) * 360.0 - 180.0
}

pub fn y_to_lat(y: f64, zoom: f64) -> f64 {
    let n =
        std::f64::consts::PI - 2.0 * std::f64::consts::PI * y / (WORLD_SIZE * 2.0f64.powf(zoom));
    (0.5 * (n.exp() - (-n).exp())).atan().to_degrees()
}

/// Folds any longitude into [-180, 180).
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// A tile placed on screen, relative to the viewport's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleTile {
    pub coords: TileCoords,
    pub x: f32,
    pub y: f32,
    pub size: f32,
}

impl VisibleTile {
    pub fn contains(&self, point: (f32, f32)) -> bool {
        point.0 >= self.x
            && point.0 < self.x + self.size
            && point.1 >= self.y
            && point.1 < self.y + self.size
    }
}

/// The tile under a screen position, if any.
pub fn tile_at(tiles: &[VisibleTile], point: (f32, f32)) -> Option<TileCoords> {
    tiles.iter().find(|t| t.contains(point)).map(|t| t.coords)
}

/// What the camera currently shows. The map repeats horizontally, so longitudes
/// outside [-180, 180) are valid and land on a neighbouring world copy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub longitude: f64,
    pub latitude: f64,
    pub zoom: f64,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn world_width(&self) -> f64 {
        WORLD_SIZE * 2.0f64.powf(self.zoom)
    }

    fn center_world(&self) -> (f64, f64) {
        (
            lon_to_x(self.longitude, self.zoom),
            lat_to_y(self.latitude, self.zoom),
        )
    }

    /// Screen position of a geographic point, on the world copy nearest the centre.
    pub fn project(&self, lon: f64, lat: f64) -> (f32, f32) {
        let (cx, cy) = self.center_world();
        let world = self.world_width();
        let mut x = lon_to_x(lon, self.zoom);
        x += ((cx - x) / world).round() * world;
        let y = lat_to_y(lat, self.zoom);

        (
            (x - cx + f64::from(self.width) / 2.0) as f32,
            (y - cy + f64::from(self.height) / 2.0) as f32,
        )
    }

    /// Screen positions of a geographic point on every world copy whose x lies
    /// within `margin` pixels of the viewport, left to right.
    pub fn project_copies(&self, lon: f64, lat: f64, margin: f32) -> Vec<(f32, f32)> {
        let (x, y) = self.project(lon, lat);
        let world = self.world_width() as f32;
        let (lo, hi) = (-margin, self.width + margin);

        let mut first = x;
        while first - world >= lo {
            first -= world;
        }

        let mut copies = Vec::new();
        let mut cx = first;
        while cx <= hi {
            if cx >= lo {
                copies.push((cx, y));
            }
            cx += world;
        }
        copies
    }

    /// Geographic point under a screen position, as `(lon, lat)`.
    pub fn unproject(&self, sx: f32, sy: f32) -> (f64, f64) {
        let (cx, cy) = self.center_world();
        let x = cx + f64::from(sx) - f64::from(self.width) / 2.0;
        let y = (cy + f64::from(sy) - f64::from(self.height) / 2.0)
            .clamp(0.0, self.world_width());
        (wrap_lon(x_to_lon(x, self.zoom)), y_to_lat(y, self.zoom))
    }

    /// Moves the camera so the content follows a drag of `(dx, dy)` pixels.
    pub fn pan(&self, dx: f32, dy: f32) -> Viewport {
        let (lon, lat) = self.unproject(self.width / 2.0 - dx, self.height / 2.0 - dy);
        Viewport {
            longitude: lon,
            latitude: lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            ..*self
        }
    }

    /// Zooms by `delta` levels keeping the point under `anchor` fixed on screen.
    pub fn zoom_around(
        &self,
        delta: f64,
        anchor: (f32, f32),
        min_zoom: f64,
        max_zoom: f64,
    ) -> Viewport {
        let new_zoom = (self.zoom + delta).clamp(min_zoom, max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return *self;
        }

        let (cx, cy) = self.center_world();
        let rx = f64::from(anchor.0) - f64::from(self.width) / 2.0;
        let ry = f64::from(anchor.1) - f64::from(self.height) / 2.0;
        let scale = 2.0f64.powf(new_zoom - self.zoom);

        let new_cx = (cx + rx) * scale - rx;
        let new_cy = ((cy + ry) * scale - ry).clamp(0.0, WORLD_SIZE * 2.0f64.powf(new_zoom));

        Viewport {
            longitude: wrap_lon(x_to_lon(new_cx, new_zoom)),
            latitude: y_to_lat(new_cy, new_zoom),
            zoom: new_zoom,
            ..*self
        }
    }

    /// Tiles of level `z` covering the viewport. Columns beyond the antimeridian
    /// wrap onto the repeated world.
    pub fn visible_tiles(&self, z: u32) -> Vec<VisibleTile> {
        let num_tiles = 1i64 << z;
        let tile_size = self.world_width() / num_tiles as f64;
        let (cx, cy) = self.center_world();
        let left = cx - f64::from(self.width) / 2.0;
        let top = cy - f64::from(self.height) / 2.0;

        let min_tx = (left / tile_size).floor() as i64;
        let max_tx = ((left + f64::from(self.width)) / tile_size).ceil() as i64 - 1;
        let min_ty = ((top / tile_size).floor() as i64).max(0);
        let max_ty =
            (((top + f64::from(self.height)) / tile_size).ceil() as i64 - 1).min(num_tiles - 1);

        let mut tiles = Vec::new();
        for tx in min_tx..=max_tx {
            for ty in min_ty..=max_ty {
                tiles.push(VisibleTile {
                    coords: TileCoords {
                        x: tx.rem_euclid(num_tiles) as u32,
                        y: ty as u32,
                        z,
                    },
                    x: (tx as f64 * tile_size - left) as f32,
                    y: (ty as f64 * tile_size - top) as f32,
                    size: tile_size as f32,
                });
            }
        }
        tiles
    }
}
