//! # SVG Serialization
//!
//! Writes a [`Figure`] as a standalone SVG document. Shapes are defined once
//! and referenced by every draw call; hatches become `<pattern>` definitions
//! numbered in order of first use, so identical figures serialize to
//! identical bytes.

use super::{Figure, Hatch, HatchStyle, MARGIN, Style};
use crate::Color;
use std::fmt::Write;

/// Side of a density-1 hatch cell, in pixels.
const HATCH_CELL: f64 = 18.0;
const EDGE_WIDTH: f64 = 0.6;
const TITLE_FONT_SIZE: f64 = 40.0;
const LEGEND_FONT_SIZE: f64 = 20.0;
const LEGEND_ROW: f64 = 30.0;
const LEGEND_PADDING: f64 = 12.0;
const SWATCH_W: f64 = 40.0;
const SWATCH_H: f64 = 20.0;

impl Figure {
    /// Serialize as an SVG document.
    #[must_use]
    pub fn to_svg(&self) -> String {
        let patterns = Patterns::collect(self);
        let mut out = String::new();

        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        out.push_str("<defs>\n");
        patterns.write_defs(&mut out);
        for (i, shape) in self.shapes.iter().enumerate() {
            let _ = writeln!(
                out,
                r#"<path id="shape-{}" data-country="{}" fill-rule="evenodd" d="{}"/>"#,
                i,
                escape(shape.code.as_str()),
                shape.path
            );
        }
        out.push_str("</defs>\n");

        let _ = writeln!(out, r#"<rect width="100%" height="100%" fill="white"/>"#);
        let _ = writeln!(
            out,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-family="sans-serif" font-size="{}" fill="black">{}</text>"#,
            self.width as f64 / 2.0,
            60.0,
            TITLE_FONT_SIZE,
            escape(&self.title)
        );

        let _ = writeln!(out, r#"<g id="map" stroke-width="{}">"#, EDGE_WIDTH);
        for draw in &self.draws {
            let href = format!("#shape-{}", draw.shape);
            write_layers(&mut out, &patterns, &draw.style, |attrs| {
                format!(r#"<use href="{}" {}/>"#, href, attrs)
            });
        }
        out.push_str("</g>\n");

        self.write_legend(&mut out, &patterns);
        out.push_str("</svg>\n");
        out
    }

    fn write_legend(&self, out: &mut String, patterns: &Patterns) {
        let entries = &self.legend.entries;
        let longest = entries
            .iter()
            .map(|e| e.label.chars().count())
            .max()
            .unwrap_or(0) as f64;
        let box_w = LEGEND_PADDING * 3.0 + SWATCH_W + longest * LEGEND_FONT_SIZE * 0.6;
        let box_h = LEGEND_PADDING * 2.0 + LEGEND_ROW * entries.len() as f64;
        let x = MARGIN;
        let y = self.height as f64 - MARGIN - box_h;

        let _ = writeln!(out, r#"<g id="legend">"#);
        let _ = writeln!(
            out,
            r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="white" stroke="black" opacity="{}"/>"#,
            x, y, box_w, box_h, self.legend.frame_alpha
        );
        for (i, entry) in entries.iter().enumerate() {
            let row_y = y + LEGEND_PADDING + LEGEND_ROW * i as f64;
            let sx = x + LEGEND_PADDING;
            let sy = row_y + (LEGEND_ROW - SWATCH_H) / 2.0;
            write_layers(out, patterns, &entry.swatch, |attrs| {
                format!(
                    r#"<rect x="{:.1}" y="{:.1}" width="{}" height="{}" {}/>"#,
                    sx, sy, SWATCH_W, SWATCH_H, attrs
                )
            });
            let _ = writeln!(
                out,
                r#"<text x="{:.1}" y="{:.1}" dominant-baseline="middle" font-family="sans-serif" font-size="{}" fill="black">{}</text>"#,
                sx + SWATCH_W + LEGEND_PADDING,
                row_y + LEGEND_ROW / 2.0,
                LEGEND_FONT_SIZE,
                escape(&entry.label)
            );
        }
        out.push_str("</g>\n");
    }
}

/// Emit the filled element, then its hatch layer if any.
fn write_layers(
    out: &mut String,
    patterns: &Patterns,
    style: &Style,
    element: impl Fn(&str) -> String,
) {
    let base = format!(
        r#"fill="{}" stroke="{}""#,
        escape(style.fill.as_str()),
        escape(style.edge.as_str())
    );
    out.push_str(&element(&base));
    out.push('\n');

    if let Some(id) = style.hatch.and_then(|h| patterns.id(h, &style.edge)) {
        out.push_str(&element(&format!(r#"fill="url(#{})" stroke="none""#, id)));
        out.push('\n');
    }
}

// =============================================================================
// PATTERNS
// =============================================================================

/// Hatch patterns used by a figure, in order of first use.
struct Patterns {
    used: Vec<(HatchStyle, Color)>,
}

impl Patterns {
    fn collect(figure: &Figure) -> Self {
        let mut used: Vec<(HatchStyle, Color)> = Vec::new();
        let styles = figure
            .draws
            .iter()
            .map(|d| &d.style)
            .chain(figure.legend.entries.iter().map(|e| &e.swatch));
        for style in styles {
            if let Some(hatch) = style.hatch {
                let key = (hatch, style.edge.clone());
                if !used.contains(&key) {
                    used.push(key);
                }
            }
        }
        Self { used }
    }

    fn id(&self, hatch: HatchStyle, color: &Color) -> Option<String> {
        self.used
            .iter()
            .position(|(h, c)| *h == hatch && c == color)
            .map(|i| format!("hatch-{}", i))
    }

    fn write_defs(&self, out: &mut String) {
        for (i, (style, color)) in self.used.iter().enumerate() {
            let cell = HATCH_CELL / f64::from(style.density.max(1));
            let color = escape(color.as_str());
            let motif = match style.hatch {
                Hatch::Diagonal => format!(
                    r#"<path d="M0,{c} L{c},0 M-2,2 L2,-2 M{a},{b} L{b},{a}" stroke="{color}" stroke-width="1"/>"#,
                    c = cell,
                    a = cell - 2.0,
                    b = cell + 2.0,
                    color = color
                ),
                Hatch::Vertical => format!(
                    r#"<path d="M{h},0 L{h},{c}" stroke="{color}" stroke-width="1"/>"#,
                    h = cell / 2.0,
                    c = cell,
                    color = color
                ),
                Hatch::Dots => format!(
                    r#"<circle cx="{h}" cy="{h}" r="1.5" fill="{color}"/>"#,
                    h = cell / 2.0,
                    color = color
                ),
            };
            let _ = writeln!(
                out,
                r#"<pattern id="hatch-{}" patternUnits="userSpaceOnUse" width="{}" height="{}">{}</pattern>"#,
                i, cell, cell, motif
            );
        }
    }
}

/// Escape text for use in XML content and attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

// =============================================================================
// TESTS
// =============================================================================
