//! # histomap-core
//!
//! The deterministic map pipeline for Histomap - THE LOGIC.
//!
//! Countries are colored by a curated "stage" classification, with hatch
//! overlays for two auxiliary flags (reboot, heterogeneous sub-entities).
//!
//! ```text
//! Geometry ───────┐
//! Classification ─┼─► join ─► render ─► Figure ─► SVG
//! Legend ─────────┘
//! ```
//!
//! ## Architectural Constraints
//!
//! - No async, no network: fetching remote tables is the caller's job
//! - Join mismatches never fail; they fall back to default styling
//! - Every dependency of a render pass is an explicit parameter
//! - Memoization goes through [`ContentCache`], keyed by input digests

// =============================================================================
// MODULES
// =============================================================================

pub mod cache;
pub mod join;
pub mod pipeline;
pub mod projection;
pub mod render;
pub mod sources;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Classification, Color, CountryCode, CountryRecord, DEFAULT_BASE_COLOR, HistomapError,
    Language, LocalizedText, StageCode, StageEntry, TRANSPARENT,
};

// =============================================================================
// RE-EXPORTS: Pipeline
// =============================================================================

pub use cache::{CacheKey, CacheStats, ContentCache};
pub use join::{EXCLUDED_TERRITORY, JoinReport, JoinedCountry, JoinedView, join};
pub use pipeline::{MapInputs, MapOutput, build_map};
pub use render::{Figure, RenderOptions, render};
pub use sources::{ClassificationTable, GeometrySource, ShapefileSource, StageLegend};
