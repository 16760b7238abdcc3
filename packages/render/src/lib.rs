#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Schematic SVG maps of streetcar lines.
//!
//! Stops are projected with spherical Mercator, moved so the westernmost
//! and southernmost stops touch the origin, flipped so north is up, and
//! scaled so the line spans the canvas width. The frontend colours the
//! `line:*` segments by delay statistics, so element ids are part of the
//! output contract.

use std::fmt::Write as _;

use streetcar_delay_spatial::mercator_project;
use streetcar_delay_transit_models::LineStops;
use thiserror::Error;

/// Errors that can occur while rendering a line map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The line has fewer than two stops with coordinates.
    #[error("Line {line} has no drawable stops (need at least two geocoded stops)")]
    NotEnoughStops {
        /// Line identifier.
        line: String,
    },
}

/// An SVG length, either absolute or relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SvgLength {
    /// User units.
    Px(f64),
    /// Percentage of the viewport.
    Percent(f64),
}

impl SvgLength {
    /// Resolves the length against `reference` user units.
    #[must_use]
    pub fn resolve(self, reference: f64) -> f64 {
        match self {
            Self::Px(v) => v,
            Self::Percent(p) => reference * p / 100.0,
        }
    }
}

impl std::fmt::Display for SvgLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Px(v) => write!(f, "{v}"),
            Self::Percent(p) => write!(f, "{p}%"),
        }
    }
}

/// Visual style of a line map.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgStyle {
    /// Width the line is scaled to, in user units.
    pub canvas_width: f64,
    /// Stroke width of the segments.
    pub line_width: SvgLength,
    /// Stroke colour of the segments.
    pub line_color: String,
    /// Radius of the stop circles.
    pub stop_radius: SvgLength,
    /// Fill colour of the stop circles.
    pub stop_color: String,
    /// Margin around the drawing, in user units.
    pub padding: f64,
    /// `id` attribute of the `<svg>` element.
    pub id: String,
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            canvas_width: 1200.0,
            line_width: SvgLength::Percent(0.4),
            line_color: "red".to_string(),
            stop_radius: SvgLength::Percent(0.5),
            stop_color: "#263238".to_string(),
            padding: 12.0,
            id: "lineMap".to_string(),
        }
    }
}

/// Renders the map of one line.
#[derive(Debug, Clone)]
pub struct LineMapRenderer<'a> {
    line: &'a LineStops,
    style: SvgStyle,
    points: Vec<(f64, f64)>,
}

impl<'a> LineMapRenderer<'a> {
    /// Projects and lays out the stops of `line`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NotEnoughStops`] if the line does not have
    /// coordinates for at least two stops.
    pub fn new(line: &'a LineStops, style: SvgStyle) -> Result<Self, RenderError> {
        let coordinates = line
            .segment_coordinates()
            .ok_or_else(|| RenderError::NotEnoughStops {
                line: line.line.clone(),
            })?;

        let projected: Vec<(f64, f64)> = coordinates.iter().copied().map(mercator_project).collect();
        let points = layout(&projected, style.canvas_width, style.padding);
        log::debug!("Laid out {} stops of line {}", points.len(), line.line);

        Ok(Self {
            line,
            style,
            points,
        })
    }

    /// Canvas coordinates of the stops, in travel order.
    #[must_use]
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Width and height of the view box.
    #[must_use]
    pub fn view_box_size(&self) -> (f64, f64) {
        let max_x = self.points.iter().map(|p| p.0).fold(0.0, f64::max);
        let max_y = self.points.iter().map(|p| p.1).fold(0.0, f64::max);
        (max_x + self.style.padding, max_y + self.style.padding)
    }

    /// Produces the SVG document. Segments come first so that stop circles
    /// are drawn on top of them; stop names are drawn last if requested.
    ///
    /// # Panics
    ///
    /// * If writing to the output `String` fails
    #[must_use]
    pub fn render(&self, draw_stop_names: bool) -> String {
        let (width, height) = self.view_box_size();
        let style = &self.style;
        let mut svg = String::new();

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" id="{}" viewBox="0 0 {} {}">"#,
            escape_xml(&style.id),
            fmt_num(width),
            fmt_num(height)
        )
        .unwrap();

        for (pair, name_before) in self.points.windows(2).zip(&self.line.stops) {
            let (start, end) = (pair[0], pair[1]);
            writeln!(
                svg,
                r#"  <line x1="{}" y1="{}" x2="{}" y2="{}" id="line:{}" stroke="{}" stroke-width="{}" stroke-linecap="round"/>"#,
                fmt_num(start.0),
                fmt_num(start.1),
                fmt_num(end.0),
                fmt_num(end.1),
                escape_xml(name_before),
                escape_xml(&style.line_color),
                style.line_width
            )
            .unwrap();
        }

        for (point, name) in self.points.iter().zip(&self.line.stops) {
            writeln!(
                svg,
                r#"  <circle cx="{}" cy="{}" id="stop:{}" r="{}" fill="{}" stroke-width="0"/>"#,
                fmt_num(point.0),
                fmt_num(point.1),
                escape_xml(name),
                style.stop_radius,
                escape_xml(&style.stop_color)
            )
            .unwrap();
        }

        if draw_stop_names {
            let offset = style.stop_radius.resolve(style.canvas_width) + 2.0;
            for (point, name) in self.points.iter().zip(&self.line.stops) {
                writeln!(
                    svg,
                    r#"  <text x="{}" y="{}">{}</text>"#,
                    fmt_num(point.0 + offset),
                    fmt_num(point.1 + offset),
                    escape_xml(name)
                )
                .unwrap();
            }
        }

        svg.push_str("</svg>\n");
        svg
    }
}

/// Shifts to the origin, mirrors Y, scales to `canvas_width`, and pads.
fn layout(projected: &[(f64, f64)], canvas_width: f64, padding: f64) -> Vec<(f64, f64)> {
    let min_x = projected.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let max_x = projected.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
    let min_y = projected.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let max_y = projected.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

    let x_range = max_x - min_x;
    let scale = if x_range > 0.0 {
        canvas_width / x_range
    } else {
        1.0
    };

    projected
        .iter()
        .map(|&(x, y)| {
            let shifted_x = x - min_x;
            let mirrored_y = max_y - y;
            (
                shifted_x.mul_add(scale, padding),
                mirrored_y.mul_add(scale, padding),
            )
        })
        .collect()
}

fn fmt_num(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

/// Escapes text for use in XML attributes and character data.
#[must_use]
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
