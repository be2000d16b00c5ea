// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::tiles::TileManager;
use crate::Message;
use alert_map_core::marker::{pick_marker, Marker};
use alert_map_core::tile::{PathLayer, SubLayer};
use alert_map_core::view::{ViewComposition, ViewState};
use alert_map_core::viewport::{tile_at, Viewport};
use alert_map_core::{AlertRecord, TileCoords};
use iced::advanced::{self, layout, renderer, widget, Layout, Widget};
use iced::widget::{image, svg};
use iced::{mouse, Color, Element, Event, Length, Point, Radians, Rectangle};
use std::collections::HashMap;

/// Wheel notches to zoom levels.
const WHEEL_ZOOM_STEP: f64 = 0.2;

/// A fetched tile and where it lands on screen this frame.
#[derive(Debug, Clone)]
struct PlacedTile {
    handle: image::Handle,
    rect: Rectangle,
}

pub struct AlertMapView<'a> {
    pub composition: &'a ViewComposition,
    pub view_state: ViewState,
    pub records: &'a [AlertRecord],
    pub markers: &'a [Marker],
    /// Decoded marker glyphs keyed by icon URL.
    pub icons: &'a HashMap<String, svg::Handle>,
    pub hovered: Option<usize>,
    pub hovered_tile: Option<TileCoords>,
    pub tile_manager: &'a TileManager,
    pub device_pixel_ratio: f64,
}

impl<'a> AlertMapView<'a> {
    fn camera(&self, state: &MapState) -> ViewState {
        // Prefer internal state for zero-latency feedback during interactions
        if state.last_prop.is_some() {
            state.current
        } else {
            self.view_state
        }
    }

    fn tile_zoom(&self, viewport: &Viewport) -> u32 {
        self.composition
            .tile_layer
            .tile_zoom(viewport.zoom, self.device_pixel_ratio)
    }

    /// Publishes hover changes. A marker under the cursor hides the tile below it.
    fn update_hover(
        &self,
        viewport: &Viewport,
        point: Option<Point>,
        shell: &mut advanced::Shell<'_, Message>,
    ) -> bool {
        let marker_layer = &self.composition.marker_layer;
        let picked = point
            .filter(|_| marker_layer.pickable)
            .and_then(|p| {
                pick_marker(
                    viewport,
                    self.markers,
                    marker_layer.size_min_pixels,
                    (p.x, p.y),
                )
            });

        let tile = if picked.is_none() && self.composition.tile_layer.auto_highlight {
            let visible = viewport.visible_tiles(self.tile_zoom(viewport));
            point.and_then(|p| tile_at(&visible, (p.x, p.y)))
        } else {
            None
        };

        let mut changed = false;
        // The tooltip follows the cursor, so a hovered marker republishes every move
        if picked.is_some() || self.hovered.is_some() {
            shell.publish(Message::HoverMarker(picked.zip(point)));
            changed = true;
        }
        if tile != self.hovered_tile {
            shell.publish(Message::HoverTile(tile));
            changed = true;
        }
        changed
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct MapState {
    is_dragging: bool,
    last_cursor: Option<Point>,
    // Track values between prop updates to handle multiple events per frame
    current: ViewState,
    last_prop: Option<ViewState>,
}

fn to_color(rgba: [u8; 4]) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], f32::from(rgba[3]) / 255.0)
}

/// Strokes a tile outline. Tile outlines only have axis-aligned segments, so each
/// segment is a single quad.
fn draw_outline<Renderer: renderer::Renderer>(
    renderer: &mut Renderer,
    points: &[(f32, f32)],
    path: &PathLayer,
) {
    let half = path.width_min_pixels / 2.0;
    let color = Color::from_rgb8(path.color[0], path.color[1], path.color[2]);

    for segment in points.windows(2) {
        let (x1, y1) = segment[0];
        let (x2, y2) = segment[1];
        renderer.fill_quad(
            renderer::Quad {
                bounds: Rectangle {
                    x: x1.min(x2) - half,
                    y: y1.min(y2) - half,
                    width: (x2 - x1).abs() + path.width_min_pixels,
                    height: (y2 - y1).abs() + path.width_min_pixels,
                },
                ..Default::default()
            },
            color,
        );
    }
}

impl<'a, Theme, Renderer> Widget<Message, Theme, Renderer> for AlertMapView<'a>
where
    Renderer: renderer::Renderer
        + advanced::image::Renderer<Handle = image::Handle>
        + advanced::svg::Renderer,
{
    fn size(&self) -> iced::Size<Length> {
        iced::Size {
            width: Length::Fill,
            height: Length::Fill,
        }
    }

    fn tag(&self) -> widget::tree::Tag {
        widget::tree::Tag::of::<MapState>()
    }

    fn state(&self) -> widget::tree::State {
        widget::tree::State::new(MapState::default())
    }

    fn layout(
        &self,
        _tree: &mut widget::Tree,
        _renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        layout::Node::new(limits.max())
    }

    fn draw(
        &self,
        tree: &widget::Tree,
        renderer: &mut Renderer,
        _theme: &Theme,
        _style: &renderer::Style,
        layout: Layout<'_>,
        _cursor: mouse::Cursor,
        _viewport: &Rectangle,
    ) {
        let state = tree.state.downcast_ref::<MapState>();
        let bounds = layout.bounds();
        let camera = self.camera(state);
        let viewport = camera.viewport(bounds.width, bounds.height);

        let visible = viewport.visible_tiles(self.tile_zoom(&viewport));
        self.tile_manager
            .set_visible(visible.iter().map(|t| t.coords).collect());

        let mut loaded = Vec::new();
        let mut missing = Vec::new();
        for tile in &visible {
            let rect = Rectangle {
                x: bounds.x + tile.x,
                y: bounds.y + tile.y,
                width: tile.size,
                height: tile.size,
            };
            match self.tile_manager.get_tile(tile.coords) {
                Some(handle) => loaded.push((tile.coords, PlacedTile { handle, rect })),
                None => {
                    missing.push(rect);
                    self.tile_manager.request_tile(tile.coords);
                }
            }
        }

        let hovered_record = self.hovered.and_then(|i| self.records.get(i));
        let frame = self
            .composition
            .compose(loaded, self.markers, hovered_record, self.hovered_tile);

        // --- Tile Layer ---
        renderer.with_layer(bounds, |renderer| {
            renderer.fill_quad(
                renderer::Quad {
                    bounds,
                    border: iced::Border::default(),
                    ..Default::default()
                },
                Color::from_rgb(0.87, 0.87, 0.85),
            );

            for rect in &missing {
                renderer.fill_quad(
                    renderer::Quad {
                        bounds: *rect,
                        ..Default::default()
                    },
                    Color::from_rgb(0.93, 0.93, 0.91),
                );
            }

            let mut last_rect = None;
            for layer in &frame.tile_layers {
                match layer {
                    SubLayer::Bitmap(bitmap) => {
                        renderer.draw_image(
                            advanced::image::Image {
                                handle: bitmap.image.handle.clone(),
                                filter_method: image::FilterMethod::Linear,
                                rotation: Radians(0.0),
                                opacity: 1.0,
                                snap: true,
                            },
                            bitmap.image.rect,
                        );
                        last_rect = Some(bitmap.image.rect);
                    }
                    SubLayer::Path(path) => {
                        let (Some(rect), Some(first)) = (last_rect, path.path.first()) else {
                            continue;
                        };
                        // Pin the outline to the world copy its bitmap was drawn on
                        let origin = viewport.project(first[0], first[1]);
                        let shift = (rect.x - origin.0, rect.y - origin.1);
                        let points: Vec<(f32, f32)> = path
                            .path
                            .iter()
                            .map(|p| {
                                let (x, y) = viewport.project(p[0], p[1]);
                                (x + shift.0, y + shift.1)
                            })
                            .collect();
                        draw_outline(renderer, &points, path);
                    }
                }
            }

            if let Some((coords, rgba)) = frame.highlight {
                for tile in visible.iter().filter(|t| t.coords == coords) {
                    renderer.fill_quad(
                        renderer::Quad {
                            bounds: Rectangle {
                                x: bounds.x + tile.x,
                                y: bounds.y + tile.y,
                                width: tile.size,
                                height: tile.size,
                            },
                            ..Default::default()
                        },
                        to_color(rgba),
                    );
                }
            }
        });

        // --- Marker Layer ---
        renderer.with_layer(bounds, |renderer| {
            let min_height = self.composition.marker_layer.size_min_pixels;
            for marker in frame.markers {
                let Some(handle) = self.icons.get(&marker.icon.url) else {
                    continue;
                };
                // One icon per world copy on screen
                for (x, y, width, height) in marker.screen_rects(&viewport, min_height) {
                    let rect = Rectangle {
                        x: bounds.x + x,
                        y: bounds.y + y,
                        width,
                        height,
                    };
                    if !rect.intersects(&bounds) {
                        continue;
                    }
                    renderer.draw_svg(
                        advanced::svg::Svg {
                            handle: handle.clone(),
                            color: None,
                            rotation: Radians(0.0),
                            opacity: 1.0,
                        },
                        rect,
                    );
                }
            }
        });
    }

    fn on_event(
        &mut self,
        tree: &mut widget::Tree,
        event: Event,
        layout: iced::advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn advanced::Clipboard,
        shell: &mut advanced::Shell<'_, Message>,
        _viewport: &Rectangle,
    ) -> advanced::graphics::core::event::Status {
        let state = tree.state.downcast_mut::<MapState>();
        let bounds = layout.bounds();

        // Initialize or sync internal state from props if props changed externally
        if state.last_prop != Some(self.view_state) {
            state.current = self.view_state;
            state.last_prop = Some(self.view_state);
        }

        let camera = state.current;
        let viewport = camera.viewport(bounds.width, bounds.height);
        let cursor_point = cursor.position_in(bounds);

        match event {
            Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if let Some(p) = cursor_point {
                    let d = match delta {
                        mouse::ScrollDelta::Lines { y, .. } => y as f64,
                        mouse::ScrollDelta::Pixels { y, .. } => (y as f64) / 100.0,
                    };
                    let next = viewport.zoom_around(
                        d * WHEEL_ZOOM_STEP,
                        (p.x, p.y),
                        camera.min_zoom,
                        camera.max_zoom,
                    );

                    if (next.zoom - viewport.zoom).abs() > 0.001 {
                        // Update internal state immediately for next event in same frame
                        state.current = camera.follow(&next);
                        shell.publish(Message::ViewChanged(state.current));
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                if cursor.is_over(bounds) {
                    if let Some(position) = cursor.position() {
                        state.is_dragging = true;
                        state.last_cursor = Some(position);
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                if state.is_dragging {
                    state.is_dragging = false;
                    state.last_cursor = None;
                    return advanced::graphics::core::event::Status::Captured;
                }
            }
            Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if state.is_dragging {
                    if let Some(last) = state.last_cursor {
                        let next = viewport.pan(position.x - last.x, position.y - last.y);
                        state.last_cursor = Some(position);
                        state.current = camera.follow(&next);
                        shell.publish(Message::ViewChanged(state.current));
                        return advanced::graphics::core::event::Status::Captured;
                    }
                }

                if self.update_hover(&viewport, cursor_point, shell) {
                    return advanced::graphics::core::event::Status::Captured;
                }
            }
            Event::Mouse(mouse::Event::CursorLeft) => {
                state.is_dragging = false;
                state.last_cursor = None;
                if self.update_hover(&viewport, None, shell) {
                    return advanced::graphics::core::event::Status::Captured;
                }
            }
            _ => {}
        }

        advanced::graphics::core::event::Status::Ignored
    }

    fn mouse_interaction(
        &self,
        tree: &widget::Tree,
        layout: iced::advanced::Layout<'_>,
        cursor: mouse::Cursor,
        _viewport: &Rectangle,
        _renderer: &Renderer,
    ) -> mouse::Interaction {
        let state = tree.state.downcast_ref::<MapState>();
        if state.is_dragging {
            mouse::Interaction::Grabbing
        } else if self.hovered.is_some() {
            mouse::Interaction::Pointer
        } else if cursor.is_over(layout.bounds()) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}

impl<'a, Theme, Renderer> From<AlertMapView<'a>> for Element<'a, Message, Theme, Renderer>
where
    Theme: 'a,
    Renderer: 'a
        + renderer::Renderer
        + advanced::image::Renderer<Handle = image::Handle>
        + advanced::svg::Renderer,
{
    fn from(map_view: AlertMapView<'a>) -> Self {
        Self::new(map_view)
    }
}
