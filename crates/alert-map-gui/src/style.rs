// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use iced::widget::{button, container};
use iced::{Background, Border, Color, Shadow, Theme};

pub mod palette {
    use iced::Color;

    pub const ATTRIBUTION_BACKGROUND: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.5);
    pub const ATTRIBUTION_TEXT: Color = Color::from_rgba(0.0, 0.0, 0.0, 0.75);
    pub const LINK: Color = Color::from_rgb(0.0, 0.47, 0.66); // #0078a8
    pub const TOOLTIP_BACKGROUND: Color = Color::from_rgb(0.16, 0.2, 0.24); // #29323c
    pub const TOOLTIP_TEXT: Color = Color::from_rgb(0.63, 0.65, 0.71); // #a0a7b4
    pub const TOOLTIP_TITLE: Color = Color::WHITE;
    pub const STATUS_ERROR: Color = Color::from_rgb(0.75, 0.15, 0.1);
}

/// Attribution text size, in pixels.
pub const ATTRIBUTION_FONT_SIZE: f32 = 12.0;
/// Base text size the tooltip's relative size scales from.
pub const BASE_FONT_SIZE: f32 = 16.0;

// Container Styles
pub fn container_attribution(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(palette::ATTRIBUTION_BACKGROUND)),
        text_color: Some(palette::ATTRIBUTION_TEXT),
        ..Default::default()
    }
}

pub fn container_tooltip(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(palette::TOOLTIP_BACKGROUND)),
        text_color: Some(palette::TOOLTIP_TEXT),
        border: Border {
            radius: 2.0.into(),
            ..Default::default()
        },
        shadow: Shadow {
            color: Color::from_rgba(0.0, 0.0, 0.0, 0.3),
            offset: iced::Vector::new(0.0, 2.0),
            blur_radius: 6.0,
        },
    }
}

pub fn container_status(_theme: &Theme) -> container::Style {
    container::Style {
        background: Some(Background::Color(palette::ATTRIBUTION_BACKGROUND)),
        text_color: Some(palette::STATUS_ERROR),
        border: Border {
            radius: 4.0.into(),
            ..Default::default()
        },
        ..Default::default()
    }
}

// Button Styles
pub fn button_link(_theme: &Theme, status: button::Status) -> button::Style {
    let base = button::Style {
        background: None,
        text_color: palette::LINK,
        border: Border::default(),
        shadow: Shadow::default(),
    };

    match status {
        button::Status::Hovered | button::Status::Pressed => button::Style {
            text_color: Color::from_rgb(0.0, 0.35, 0.5),
            ..base
        },
        _ => base,
    }
}
