// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz
//
// The CSV written by the alert sync must load straight back into the marker layer.

use alert_map_core::marker::render_markers;
use alert_map_core::record::AlertLoader;
use alert_map_core::sync::{build_rows, parse_stops, write_csv, FeedEnvelope};
use simplelog::{Config, LevelFilter, TestLogger};
use std::io::Cursor;
use tempfile::tempdir;

const STOPS: &str = "\
stop_id,stop_code,stop_name,stop_lat,stop_lon
7001-a1b2,7001,Britomart,-36.84429,174.76759
8002-c3d4,8002,Queen St,-36.84900,174.76500
";

const FEED: &str = r#"{
    "response": {
        "entity": [
            {
                "id": "a",
                "alert": {
                    "active_period": [{ "start": 1706745600 }],
                    "informed_entity": [{ "stop_id": "7001-a1b2" }, { "stop_id": "8002-c3d4" }],
                    "header_text": { "translation": [{ "text": "Buses <b>diverted</b>" }] }
                }
            },
            {
                "id": "b",
                "alert": {
                    "informed_entity": [{ "stop_id": "0000-gone" }],
                    "header_text": { "translation": [{ "text": "Stop closed" }] }
                }
            }
        ]
    }
}"#;

#[test]
fn test_synced_csv_loads_as_markers() {
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());

    let stops = parse_stops(Cursor::new(STOPS)).unwrap();
    let feed = serde_json::from_str::<FeedEnvelope>(FEED).unwrap().response;
    let rows = build_rows(&feed, &stops);
    assert_eq!(rows.len(), 3);

    let dir = tempdir().unwrap();
    let path = dir.path().join("data").join("upload").join("alerts.csv");
    write_csv(&path, &rows).unwrap();

    let loaded = AlertLoader::load_file(&path).unwrap();
    // The stop missing from stops.txt has no coordinates and is skipped
    assert_eq!(loaded.records.len(), 2);
    assert_eq!(loaded.skipped.len(), 1);

    let first = &loaded.records[0];
    assert_eq!(first.stop_code, "7001");
    assert_eq!(first.stop_name.as_deref(), Some("Britomart"));
    assert_eq!(first.alert_text, "Buses <b>diverted</b>");
    assert_eq!(first.period_start, "01/02/2024, 12:00:00");
    assert_eq!(first.period_end, "");

    let markers = render_markers(&loaded.records);
    assert_eq!(markers[1].position, [174.765, -36.849]);
}
