// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz
//
// End-to-end tests from an alert CSV on disk to markers and tooltips.
// Covers: file-order indices, exact positions, skipped rows, missing files.

use alert_map_core::marker::{render_markers, render_markers_with, MarkerIcon};
use alert_map_core::record::AlertLoader;
use alert_map_core::tooltip::tooltip;
use alert_map_core::AlertMapError;
use std::fs;
use tempfile::tempdir;

const ALERTS: &str = "\
stop_lat,stop_lon,stop_code,alert_text,period_start,period_end
-36.84429,174.76759,7001,Britomart lift out of service,\"01/02/2024, 12:00:00\",\"02/02/2024, 12:00:00\"

-36.97766,174.84925,100,Papatoetoe platform change,\"03/02/2024, 06:00:00\",\"03/02/2024, 23:00:00\"
,,9999,Stop without coordinates,a,b
-36.90000,174.80000,8002,Detour via Queen St,\"05/02/2024, 07:00:00\",\"06/02/2024, 07:00:00\"
";

#[test]
fn test_markers_follow_file_order_and_positions() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("alerts.csv");
    fs::write(&path, ALERTS).unwrap();

    let loaded = AlertLoader::load_file(&path).unwrap();
    assert_eq!(loaded.records.len(), 3);
    assert_eq!(loaded.skipped.len(), 1);
    assert!(matches!(
        loaded.skipped[0],
        AlertMapError::MalformedRecord { .. }
    ));

    let mut seen = Vec::new();
    let markers = render_markers_with(&loaded.records, |record, index| {
        seen.push((index, record.stop_code.clone()));
        MarkerIcon::for_index(index)
    });

    assert_eq!(
        seen,
        vec![
            (0, "7001".to_string()),
            (1, "100".to_string()),
            (2, "8002".to_string())
        ]
    );
    for (marker, record) in markers.iter().zip(&loaded.records) {
        assert_eq!(marker.position, [record.stop_lon, record.stop_lat]);
    }
    assert_eq!(markers[1].position, [174.84925, -36.97766]);
}

#[test]
fn test_tooltip_for_loaded_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("alerts.csv");
    fs::write(&path, ALERTS).unwrap();

    let loaded = AlertLoader::load_file(&path).unwrap();
    let tip = tooltip(loaded.records.get(1)).unwrap();

    assert_eq!(
        tip.lines(),
        [
            "Papatoetoe platform change".to_string(),
            "From: 03/02/2024, 06:00:00".to_string(),
            "To: 03/02/2024, 23:00:00".to_string(),
        ]
    );
    assert!(!tip.html.contains("Britomart"));
    assert!(tooltip(None).is_none());
}

#[test]
fn test_missing_file_is_data_load_error() {
    let dir = tempdir().unwrap();
    let err = AlertLoader::load_file(dir.path().join("absent.csv")).unwrap_err();
    match err {
        AlertMapError::DataLoad { path, .. } => assert!(path.ends_with("absent.csv")),
        other => panic!("expected DataLoad, got {:?}", other),
    }
}

#[test]
fn test_every_marker_uses_the_same_embedded_icon() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("alerts.csv");
    fs::write(&path, ALERTS).unwrap();

    let markers = render_markers(&AlertLoader::load_file(&path).unwrap().records);
    assert!(markers
        .iter()
        .all(|m| m.icon == markers[0].icon && m.icon.url.starts_with("data:image/svg+xml")));
}
