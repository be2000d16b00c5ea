// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::record::AlertRecord;
use serde::Serialize;

pub const TOOLTIP_FONT_SIZE: &str = "0.8em";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TooltipOptions {
    /// Escape record text before it is embedded in markup. Off by default: alert
    /// text is shown exactly as published.
    pub escape_html: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tooltip {
    pub html: String,
    pub font_size: &'static str,
    title: String,
    from: String,
    to: String,
}

impl Tooltip {
    /// Plain-text rendition for widgets that cannot render markup.
    pub fn lines(&self) -> [String; 3] {
        [
            self.title.clone(),
            format!("From: {}", self.from),
            format!("To: {}", self.to),
        ]
    }
}

/// Tooltip for the hovered record; `None` when nothing is hovered.
pub fn tooltip(hovered: Option<&AlertRecord>) -> Option<Tooltip> {
    tooltip_with(hovered, TooltipOptions::default())
}

pub fn tooltip_with(hovered: Option<&AlertRecord>, options: TooltipOptions) -> Option<Tooltip> {
    let record = hovered?;

    let field = |s: &str| -> String {
        if options.escape_html {
            html_escape::encode_text(s).into_owned()
        } else {
            s.to_string()
        }
    };
    let title = field(&record.alert_text);
    let from = field(&record.period_start);
    let to = field(&record.period_end);

    let html = format!(
        "<div class=\"tip-title\">{}</div><div><span class=\"tip-point\">From: </span>{}</div><div><span  class=\"tip-point\">To: </span>{}</div>",
        title, from, to
    );

    Some(Tooltip {
        html,
        font_size: TOOLTIP_FONT_SIZE,
        title: record.alert_text.clone(),
        from: record.period_start.clone(),
        to: record.period_end.clone(),
    })
}
