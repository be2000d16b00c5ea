// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz
//
// Tests for tile sub-layer composition.
// Covers: drawable count per border toggle, border loop order, bitmap bounds.

use alert_map_core::tile::{render_sub_layers, BoundingBox, SubLayer, SubLayerProps, TileCoords};

fn props(bbox: BoundingBox) -> SubLayerProps<&'static str> {
    SubLayerProps {
        id: "tiles-test".to_string(),
        bounding_box: bbox,
        data: "png-bytes",
    }
}

fn auckland_box() -> BoundingBox {
    BoundingBox::new(174.0, -37.0, 174.1, -36.9)
}

#[test]
fn test_border_off_yields_only_bitmap() {
    let layers = render_sub_layers(props(auckland_box()), false);
    assert_eq!(layers.len(), 1);
    match &layers[0] {
        SubLayer::Bitmap(bitmap) => {
            assert_eq!(bitmap.bounds, [174.0, -37.0, 174.1, -36.9]);
            assert_eq!(bitmap.image, "png-bytes");
        }
        other => panic!("expected bitmap, got {:?}", other),
    }
}

#[test]
fn test_border_on_yields_closed_loop_from_north_west() {
    let layers = render_sub_layers(props(auckland_box()), true);
    assert_eq!(layers.len(), 2);
    assert!(matches!(layers[0], SubLayer::Bitmap(_)));

    let SubLayer::Path(border) = &layers[1] else {
        panic!("expected border path");
    };
    assert_eq!(border.path.len(), 5);
    assert_eq!(border.path[0], [174.0, -36.9]);
    assert_eq!(border.path[1], [174.0, -37.0]);
    assert_eq!(border.path[2], [174.1, -37.0]);
    assert_eq!(border.path[3], [174.1, -36.9]);
    assert_eq!(border.path[4], [174.0, -36.9]);
    assert_eq!(border.color, [255, 0, 0]);
    assert_eq!(border.width_min_pixels, 4.0);
}

#[test]
fn test_real_tile_border_matches_its_bounds() {
    let coords = TileCoords::new(1009, 625, 10);
    let bbox = coords.bounding_box();
    let layers = render_sub_layers(SubLayerProps::for_tile("tiles", coords, ()), true);

    let SubLayer::Path(border) = &layers[1] else {
        panic!("expected border path");
    };
    assert_eq!(border.path.first(), Some(&[bbox.west, bbox.north]));
    assert_eq!(border.path.first(), border.path.last());
    assert!(bbox.west < 174.8 && 174.8 < bbox.east);
}
