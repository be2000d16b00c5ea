// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Marker icons for alert records.
//!
//! Icons are self-contained `data:` URIs so that no renderer ever has to fetch them.

use crate::record::{AlertRecord, DEFAULT_DATA_PATH};
use crate::viewport::Viewport;
use serde::Serialize;
use std::path::PathBuf;

pub const SVG_DATA_URL_PREFIX: &str = "data:image/svg+xml;charset=utf-8,";

/// Intrinsic size of the marker texture. Only the aspect ratio reaches the screen.
pub const ICON_WIDTH: u32 = 30;
pub const ICON_HEIGHT: u32 = 35;
/// Smallest on-screen icon height, in pixels.
pub const SIZE_MIN_PIXELS: f32 = 30.0;

const WARNING_GLYPH: &str = r##"
    <svg width="60" height="70" viewBox="0 0 60 70" fill="none" xmlns="http://www.w3.org/2000/svg">
<path d="M25.5187 9.05546C27.3546 5.34567 32.6454 5.34568 34.4813 9.05546L52.4089 45.2823C54.0535 48.6056 51.6356 52.5 47.9277 52.5H12.0723C8.36441 52.5 5.94646 48.6056 7.59105 45.2823L25.5187 9.05546Z" fill="#FFAB2E"/>
<path d="M31.6919 20.5455L31.4433 38.8409H28.5598L28.3112 20.5455H31.6919ZM30.0016 46.1989C29.3884 46.1989 28.8622 45.9793 28.4231 45.5401C27.9839 45.101 27.7643 44.5748 27.7643 43.9616C27.7643 43.3485 27.9839 42.8223 28.4231 42.3832C28.8622 41.944 29.3884 41.7244 30.0016 41.7244C30.6147 41.7244 31.1409 41.944 31.58 42.3832C32.0192 42.8223 32.2388 43.3485 32.2388 43.9616C32.2388 44.3677 32.1352 44.7405 31.928 45.0803C31.7292 45.42 31.4599 45.6934 31.1202 45.9006C30.7887 46.0994 30.4159 46.1989 30.0016 46.1989Z" fill="black"/>
</svg>
  "##;

/// SVG source of the marker glyph for the record at `index`.
///
/// Every index currently yields the same warning triangle.
pub fn marker_svg(_index: usize) -> String {
    WARNING_GLYPH.to_string()
}

pub fn svg_to_data_url(svg: &str) -> String {
    format!("{}{}", SVG_DATA_URL_PREFIX, urlencoding::encode(svg))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkerIcon {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

impl MarkerIcon {
    pub fn for_index(index: usize) -> Self {
        Self {
            url: svg_to_data_url(&marker_svg(index)),
            width: ICON_WIDTH,
            height: ICON_HEIGHT,
        }
    }

    /// Anchor point inside the icon. The icon is centred on its position.
    pub fn anchor(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Decodes the embedded SVG document. Returns `None` for anything that is not
    /// an SVG data URI.
    pub fn svg_bytes(&self) -> Option<Vec<u8>> {
        let encoded = self.url.strip_prefix(SVG_DATA_URL_PREFIX)?;
        urlencoding::decode(encoded)
            .ok()
            .map(|svg| svg.into_owned().into_bytes())
    }
}

/// Screen anchor for a record: `[longitude, latitude]`, untouched.
pub fn marker_position(record: &AlertRecord) -> [f64; 2] {
    [record.stop_lon, record.stop_lat]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub index: usize,
    pub position: [f64; 2],
    pub icon: MarkerIcon,
}

/// Builds one marker per record, in record order.
pub fn render_markers(records: &[AlertRecord]) -> Vec<Marker> {
    render_markers_with(records, |_, index| MarkerIcon::for_index(index))
}

/// Same as [`render_markers`] with a caller-supplied icon accessor. The accessor
/// is called exactly once per record, with that record's zero-based index.
pub fn render_markers_with<F>(records: &[AlertRecord], mut get_icon: F) -> Vec<Marker>
where
    F: FnMut(&AlertRecord, usize) -> MarkerIcon,
{
    records
        .iter()
        .enumerate()
        .map(|(index, record)| Marker {
            index,
            position: marker_position(record),
            icon: get_icon(record, index),
        })
        .collect()
}

impl Marker {
    /// On-screen `(width, height)`: one pixel tall, raised to `min_height`, with
    /// the icon's aspect ratio kept.
    pub fn display_size(&self, min_height: f32) -> (f32, f32) {
        let height = min_height.max(1.0);
        let aspect = self.icon.width as f32 / self.icon.height.max(1) as f32;
        (height * aspect, height)
    }

    /// Screen rectangles `(x, y, width, height)` of the icon, one per visible copy
    /// of the repeated world.
    pub fn screen_rects(
        &self,
        viewport: &Viewport,
        min_height: f32,
    ) -> Vec<(f32, f32, f32, f32)> {
        let (w, h) = self.display_size(min_height);
        let (ax, ay) = self.icon.anchor();
        let (sx, sy) = (
            w / self.icon.width.max(1) as f32,
            h / self.icon.height.max(1) as f32,
        );

        viewport
            .project_copies(self.position[0], self.position[1], w.max(h))
            .into_iter()
            .map(|(x, y)| (x - ax * sx, y - ay * sy, w, h))
            .collect()
    }
}

/// Index of the topmost marker under `point`, on any world copy. Later markers
/// draw over earlier ones.
pub fn pick_marker(
    viewport: &Viewport,
    markers: &[Marker],
    min_height: f32,
    point: (f32, f32),
) -> Option<usize> {
    markers.iter().rev().find_map(|marker| {
        let hit = marker
            .screen_rects(viewport, min_height)
            .into_iter()
            .any(|(x, y, w, h)| {
                point.0 >= x && point.0 <= x + w && point.1 >= y && point.1 <= y + h
            });
        hit.then_some(marker.index)
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLayerConfig {
    pub id: String,
    pub data_path: PathBuf,
    pub pickable: bool,
    pub size_min_pixels: f32,
}

impl Default for MarkerLayerConfig {
    fn default() -> Self {
        Self {
            id: "icon".to_string(),
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            pickable: true,
            size_min_pixels: SIZE_MIN_PIXELS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(lat: f64, lon: f64, code: &str) -> AlertRecord {
        AlertRecord {
            stop_lat: lat,
            stop_lon: lon,
            stop_code: code.to_string(),
            alert_text: format!("Alert at {}", code),
            period_start: "S".to_string(),
            period_end: "E".to_string(),
            stop_name: None,
        }
    }

    #[test]
    fn test_position_is_lon_lat() {
        let r = record(-36.8485, 174.7633, "7001");
        assert_eq!(marker_position(&r), [174.7633, -36.8485]);
    }

    #[test]
    fn test_icon_is_embedded_svg() {
        let icon = MarkerIcon::for_index(0);
        assert!(icon.url.starts_with("data:image/svg+xml;charset=utf-8,"));
        assert!(!icon.url.contains('<'));
        assert!(!icon.url.contains(' '));
        assert!(icon.url.contains("%23FFAB2E"));
        assert_eq!((icon.width, icon.height), (30, 35));
    }

    #[test]
    fn test_icon_decodes_back_to_glyph() {
        let bytes = MarkerIcon::for_index(3).svg_bytes().unwrap();
        let svg = String::from_utf8(bytes).unwrap();
        assert_eq!(svg, marker_svg(3));
        assert!(svg.contains("viewBox=\"0 0 60 70\""));
    }

    #[test]
    fn test_icons_identical_across_indices() {
        assert_eq!(MarkerIcon::for_index(0), MarkerIcon::for_index(41));
    }

    #[test]
    fn test_non_svg_url_has_no_bytes() {
        let icon = MarkerIcon {
            url: "https://example.com/pin.png".to_string(),
            width: 30,
            height: 35,
        };
        assert!(icon.svg_bytes().is_none());
    }

    #[test]
    fn test_icon_lookup_follows_row_order() {
        let records = vec![
            record(-36.9, 174.8, "b"),
            record(-36.9, 174.8, "b"),
            record(-37.0, 175.0, "a"),
        ];
        let mut calls = Vec::new();
        let markers = render_markers_with(&records, |r, index| {
            calls.push((r.stop_code.clone(), index));
            MarkerIcon::for_index(index)
        });

        assert_eq!(
            calls,
            vec![
                ("b".to_string(), 0),
                ("b".to_string(), 1),
                ("a".to_string(), 2)
            ]
        );
        assert_eq!(markers[2].index, 2);
        assert_eq!(markers[2].position, [175.0, -37.0]);
    }

    #[test]
    fn test_pick_topmost_marker() {
        let viewport = Viewport {
            longitude: 174.8,
            latitude: -36.9,
            zoom: 10.0,
            width: 800.0,
            height: 600.0,
        };
        let records = vec![record(-36.9, 174.8, "a"), record(-36.9, 174.8, "b")];
        let markers = render_markers(&records);

        // Icon is 30px tall, keeps its 30:35 aspect and is centred on (400, 300)
        let rects = markers[0].screen_rects(&viewport, 30.0);
        assert_eq!(rects.len(), 1);
        let (x, y, w, h) = rects[0];
        assert!((w - 30.0 * 30.0 / 35.0).abs() < 1e-4);
        assert_eq!(h, 30.0);
        assert!((x - (400.0 - w / 2.0)).abs() < 1e-2);
        assert!((y - 285.0).abs() < 1e-2);

        assert_eq!(pick_marker(&viewport, &markers, 30.0, (400.0, 290.0)), Some(1));
        assert_eq!(pick_marker(&viewport, &markers, 30.0, (400.0, 310.0)), Some(1));
        assert_eq!(pick_marker(&viewport, &markers, 30.0, (400.0, 320.0)), None);
        assert_eq!(pick_marker(&viewport, &markers, 30.0, (420.0, 300.0)), None);
        assert_eq!(pick_marker(&viewport, &[], 30.0, (400.0, 290.0)), None);
    }

    #[test]
    fn test_markers_repeat_with_the_world() {
        let viewport = Viewport {
            longitude: 0.0,
            latitude: 0.0,
            zoom: 0.0,
            width: 1536.0,
            height: 512.0,
        };
        let markers = render_markers(&[record(0.0, 0.0, "null-island")]);

        // Three 512px worlds side by side
        let centres: Vec<f32> = markers[0]
            .screen_rects(&viewport, 30.0)
            .iter()
            .map(|(x, _, w, _)| (x + w / 2.0).round())
            .collect();
        assert_eq!(centres, vec![256.0, 768.0, 1280.0]);

        for x in [256.0, 768.0, 1280.0] {
            assert_eq!(pick_marker(&viewport, &markers, 30.0, (x, 256.0)), Some(0));
        }
        assert_eq!(pick_marker(&viewport, &markers, 30.0, (512.0, 256.0)), None);
    }
}
