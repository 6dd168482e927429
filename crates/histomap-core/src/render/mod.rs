//! # Renderer
//!
//! Turns a [`JoinedView`] into a [`Figure`]:
//!
//! | Condition          | Fill | Edge         | Hatch          |
//! |--------------------|------|--------------|----------------|
//! | stage with stripe  | base | stripe color | `//` diagonal  |
//! | otherwise          | base | black        | none           |
//! | + reboot           | base | black        | `\|` vertical  |
//! | + sub-entities     | base | black        | `.` dots       |
//!
//! Overlay passes are cumulative: each is its own draw call on the same shape.

mod figure;
mod svg;

pub use figure::*;
pub use svg::escape;

use crate::join::{JoinedCountry, JoinedView};
use crate::projection::robinson;
use crate::sources::StageLegend;
use crate::{Color, HistomapError, Language, LocalizedText};
use chrono::NaiveDate;
use geo::{Coord, LineString};
use std::fmt::Write;

// =============================================================================
// OPTIONS
// =============================================================================

/// Leading legend stages left out of the legend box by default.
pub const DEFAULT_HIDDEN_STAGE_ENTRIES: usize = 2;

/// Default figure size in pixels (28 x 14 in at 100 dpi).
pub const DEFAULT_WIDTH: u32 = 2800;
pub const DEFAULT_HEIGHT: u32 = 1400;

/// Opacity of the legend frame.
pub const LEGEND_FRAME_ALPHA: f64 = 0.9;

/// Height reserved above the map for the title.
pub(crate) const TITLE_BAND: f64 = 100.0;
pub(crate) const MARGIN: f64 = 20.0;

/// Date format of the title, e.g. `07 Apr 2024`.
pub const TITLE_DATE_FORMAT: &str = "%d %b %Y";

/// Parameters of a render pass beyond its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Date stamped into the title.
    pub date: NaiveDate,
    /// Leading legend stages not shown in the legend box. They still style
    /// the countries classified with them.
    pub hidden_stage_entries: usize,
    pub width: u32,
    pub height: u32,
}

impl RenderOptions {
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            hidden_stage_entries: DEFAULT_HIDDEN_STAGE_ENTRIES,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }

    #[must_use]
    pub fn with_hidden_stage_entries(mut self, hidden: usize) -> Self {
        self.hidden_stage_entries = hidden;
        self
    }
}

// =============================================================================
// TEXT
// =============================================================================

fn title_label() -> LocalizedText {
    LocalizedText::new("Carte Historionomique Mondiale", "World Historionomic Map")
}

fn reboot_label() -> LocalizedText {
    LocalizedText::new("Reboot", "Reboot")
}

fn sub_entities_label() -> LocalizedText {
    LocalizedText::new("Sous-entités hétérogènes", "Heterogeneous sub-entities")
}

/// Localized, date-stamped figure title.
#[must_use]
pub fn title(language: Language, date: NaiveDate) -> String {
    format!(
        "{} - {}",
        title_label().get(language),
        date.format(TITLE_DATE_FORMAT)
    )
}

// =============================================================================
// STYLING
// =============================================================================

/// Draw calls for one country, in painting order.
#[must_use]
pub fn country_styles(country: &JoinedCountry) -> Vec<(Pass, Style)> {
    let mut passes = Vec::with_capacity(3);

    let base = if country.has_stripe {
        Style::hatched(
            country.base_color.clone(),
            country.stripe_color.clone(),
            HatchStyle::new(Hatch::Diagonal, 2),
        )
    } else {
        Style::solid(country.base_color.clone(), Color::black())
    };
    passes.push((Pass::Base, base));

    if country.reboot {
        passes.push((
            Pass::Reboot,
            Style::hatched(
                country.base_color.clone(),
                Color::black(),
                HatchStyle::new(Hatch::Vertical, 1),
            ),
        ));
    }
    if country.sub_entities {
        passes.push((
            Pass::SubEntities,
            Style::hatched(
                country.base_color.clone(),
                Color::black(),
                HatchStyle::new(Hatch::Dots, 1),
            ),
        ));
    }
    passes
}

/// Legend entries: visible stages in sheet order, then the two fixed
/// overlay entries.
#[must_use]
pub fn build_legend(legend: &StageLegend, language: Language, hidden_stage_entries: usize) -> Legend {
    let mut entries: Vec<LegendEntry> = legend
        .entries()
        .iter()
        .skip(hidden_stage_entries)
        .map(|stage| {
            let base = stage.fill_color();
            let swatch = match &stage.stripe_color {
                Some(stripe) if !stripe.is_empty() => {
                    Style::hatched(base, stripe.clone(), HatchStyle::new(Hatch::Diagonal, 3))
                }
                _ => Style::solid(base.clone(), base),
            };
            LegendEntry {
                label: stage.labels.get(language).to_string(),
                swatch,
            }
        })
        .collect();

    entries.push(LegendEntry {
        label: reboot_label().get(language).to_string(),
        swatch: Style::hatched(
            Color::white(),
            Color::black(),
            HatchStyle::new(Hatch::Vertical, 2),
        ),
    });
    entries.push(LegendEntry {
        label: sub_entities_label().get(language).to_string(),
        swatch: Style::hatched(
            Color::white(),
            Color::black(),
            HatchStyle::new(Hatch::Dots, 2),
        ),
    });

    Legend {
        entries,
        frame_alpha: LEGEND_FRAME_ALPHA,
    }
}

// =============================================================================
// RENDER
// =============================================================================

/// Render the joined view.
///
/// Fails with [`HistomapError::InvalidGeometry`] on a country with no
/// polygon, an empty ring, or a non-finite coordinate.
pub fn render(
    view: &JoinedView,
    legend: &StageLegend,
    language: Language,
    options: &RenderOptions,
) -> Result<Figure, HistomapError> {
    for country in view.countries() {
        validate(country)?;
    }

    let viewport = Viewport::fit(view, options);
    let mut shapes = Vec::with_capacity(view.len());
    let mut draws = Vec::new();

    for (index, country) in view.countries().iter().enumerate() {
        shapes.push(Shape {
            code: country.code.clone(),
            path: viewport.path(country),
        });
        draws.extend(
            country_styles(country)
                .into_iter()
                .map(|(pass, style)| DrawCall {
                    shape: index,
                    pass,
                    style,
                }),
        );
    }

    Ok(Figure {
        width: options.width,
        height: options.height,
        title: title(language, options.date),
        shapes,
        draws,
        legend: build_legend(legend, language, options.hidden_stage_entries),
    })
}

fn validate(country: &JoinedCountry) -> Result<(), HistomapError> {
    let invalid = |reason: &str| HistomapError::InvalidGeometry {
        country: country.code.clone(),
        reason: reason.to_string(),
    };

    if country.geometry.0.is_empty() {
        return Err(invalid("empty geometry"));
    }
    for polygon in &country.geometry.0 {
        if polygon.exterior().0.is_empty() {
            return Err(invalid("empty exterior ring"));
        }
        let rings = std::iter::once(polygon.exterior()).chain(polygon.interiors());
        for ring in rings {
            if ring.0.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                return Err(invalid("non-finite coordinate"));
            }
        }
    }
    Ok(())
}

// =============================================================================
// VIEWPORT
// =============================================================================

/// Map from projected metres to figure pixels, aspect ratio preserved.
struct Viewport {
    min_x: f64,
    max_y: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Viewport {
    fn fit(view: &JoinedView, options: &RenderOptions) -> Self {
        let (min, max) = extent(view);
        let area_w = (options.width as f64 - 2.0 * MARGIN).max(1.0);
        let area_h = (options.height as f64 - TITLE_BAND - MARGIN).max(1.0);
        let span_x = (max.x - min.x).max(f64::EPSILON);
        let span_y = (max.y - min.y).max(f64::EPSILON);
        let scale = (area_w / span_x).min(area_h / span_y);

        Self {
            min_x: min.x,
            max_y: max.y,
            scale,
            offset_x: MARGIN + (area_w - span_x * scale) / 2.0,
            offset_y: TITLE_BAND + (area_h - span_y * scale) / 2.0,
        }
    }

    fn point(&self, c: Coord<f64>) -> (f64, f64) {
        (
            self.offset_x + (c.x - self.min_x) * self.scale,
            self.offset_y + (self.max_y - c.y) * self.scale,
        )
    }

    fn path(&self, country: &JoinedCountry) -> String {
        let mut d = String::new();
        for polygon in &country.geometry.0 {
            self.ring(&mut d, polygon.exterior());
            for hole in polygon.interiors() {
                self.ring(&mut d, hole);
            }
        }
        d
    }

    fn ring(&self, d: &mut String, ring: &LineString<f64>) {
        for (i, c) in ring.0.iter().enumerate() {
            let (x, y) = self.point(*c);
            let cmd = if i == 0 { 'M' } else { 'L' };
            if !d.is_empty() && i == 0 {
                d.push(' ');
            }
            let _ = write!(d, "{}{:.1},{:.1}", cmd, x, y);
        }
        d.push('Z');
    }
}

/// Bounding box of every coordinate in the view; the whole projected world
/// when the view is empty.
fn extent(view: &JoinedView) -> (Coord<f64>, Coord<f64>) {
    let mut min = Coord {
        x: f64::INFINITY,
        y: f64::INFINITY,
    };
    let mut max = Coord {
        x: f64::NEG_INFINITY,
        y: f64::NEG_INFINITY,
    };
    let coords = view
        .countries()
        .iter()
        .flat_map(|c| c.geometry.0.iter())
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .flat_map(|ring| ring.0.iter());
    for c in coords {
        min.x = min.x.min(c.x);
        min.y = min.y.min(c.y);
        max.x = max.x.max(c.x);
        max.y = max.y.max(c.y);
    }

    if min.x.is_finite() && max.x.is_finite() {
        (min, max)
    } else {
        let equator = robinson(Coord { x: 180.0, y: 0.0 });
        let pole = robinson(Coord { x: 0.0, y: 90.0 });
        (
            Coord {
                x: -equator.x,
                y: -pole.y,
            },
            Coord {
                x: equator.x,
                y: pole.y,
            },
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
