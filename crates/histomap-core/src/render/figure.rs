//! # Figure Model
//!
//! The renderer output: shapes in figure pixels, the ordered draw calls
//! layered on them, the title and the legend. A `Figure` is a plain value;
//! [`Figure::to_svg`](super::svg) serializes it.

use crate::{Color, CountryCode};
use serde::{Deserialize, Serialize};

/// Hatch motif, drawn in the edge color of its style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Hatch {
    /// `/` lines: stages with a stripe color.
    Diagonal,
    /// `|` lines: reboot overlay.
    Vertical,
    /// `.` dots: heterogeneous sub-entities overlay.
    Dots,
}

/// A hatch motif and how many times it repeats per unit cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HatchStyle {
    pub hatch: Hatch,
    pub density: u8,
}

impl HatchStyle {
    #[must_use]
    pub const fn new(hatch: Hatch, density: u8) -> Self {
        Self { hatch, density }
    }
}

/// Fill, edge and optional hatch of one draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Style {
    pub fill: Color,
    pub edge: Color,
    pub hatch: Option<HatchStyle>,
}

impl Style {
    #[must_use]
    pub fn solid(fill: Color, edge: Color) -> Self {
        Self {
            fill,
            edge,
            hatch: None,
        }
    }

    #[must_use]
    pub fn hatched(fill: Color, edge: Color, hatch: HatchStyle) -> Self {
        Self {
            fill,
            edge,
            hatch: Some(hatch),
        }
    }
}

/// Why a draw call exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pass {
    /// Stage fill, striped or plain.
    Base,
    Reboot,
    SubEntities,
}

/// A country outline in figure pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub code: CountryCode,
    /// SVG path data, one closed subpath per ring.
    pub path: String,
}

/// One layer drawn on a shape. Calls are painted in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawCall {
    /// Index into [`Figure::shapes`].
    pub shape: usize,
    pub pass: Pass,
    pub style: Style,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub swatch: Style,
}

/// Legend box, anchored at the lower-left corner of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub entries: Vec<LegendEntry>,
    pub frame_alpha: f64,
}

/// A complete rendered map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub shapes: Vec<Shape>,
    pub draws: Vec<DrawCall>,
    pub legend: Legend,
}

impl Figure {
    /// Draw calls applied to the shape of one country.
    pub fn draws_for<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a DrawCall> + 'a {
        self.draws
            .iter()
            .filter(move |d| self.shapes.get(d.shape).is_some_and(|s| s.code.as_str() == code))
    }
}
