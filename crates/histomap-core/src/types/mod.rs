//! # Core Type Definitions
//!
//! This module contains all core types of the Histomap pipeline:
//! - Identifiers (`CountryCode`, `StageCode`)
//! - Styling values (`Color`, `Language`, `LocalizedText`)
//! - Source records (`CountryRecord`, `Classification`, `StageEntry`)
//! - Error types (`HistomapError`)
//!
//! ## Snapshot Guarantees
//!
//! Records are read-only snapshots. Geometry is shared through `Arc` so the
//! join can hand the same polygons to every derived record without copying.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Three-letter country identifier (`ADM0_A3` / `alpha_3`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CountryCode(pub String);

impl CountryCode {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a classification stage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StageCode(pub String);

impl StageCode {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// COLOR
// =============================================================================

/// A color as written in the legend sheet: a CSS color name or a hex string.
///
/// The value is kept verbatim; it is escaped when written into SVG.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Color(pub String);

/// Fill of countries with no legend match.
pub const DEFAULT_BASE_COLOR: &str = "lightgrey";

/// Stripe placeholder of stages without a stripe color.
pub const TRANSPARENT: &str = "#00000000";

impl Color {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn black() -> Self {
        Self::new("black")
    }

    #[must_use]
    pub fn white() -> Self {
        Self::new("white")
    }

    #[must_use]
    pub fn transparent() -> Self {
        Self::new(TRANSPARENT)
    }

    #[must_use]
    pub fn default_base() -> Self {
        Self::new(DEFAULT_BASE_COLOR)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// LANGUAGE
// =============================================================================

/// Label language selected by the user.
///
/// Deserialization goes through [`FromStr`](std::str::FromStr), so query
/// strings and CLI arguments accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "FR")]
    Fr,
    #[serde(rename = "EN")]
    En,
}

impl Language {
    /// Selector value, as shown in the language toggle.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Language::Fr => "FR",
            Language::En => "EN",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = HistomapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FR" => Ok(Language::Fr),
            "EN" => Ok(Language::En),
            other => Err(HistomapError::Config(format!(
                "Unknown language '{}'. Use: FR, EN",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Language {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// A label available in both supported languages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalizedText {
    pub fr: String,
    pub en: String,
}

impl LocalizedText {
    #[must_use]
    pub fn new(fr: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            fr: fr.into(),
            en: en.into(),
        }
    }

    #[must_use]
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Fr => &self.fr,
            Language::En => &self.en,
        }
    }
}

// =============================================================================
// SOURCE RECORDS
// =============================================================================

/// One country polygon set from the geometry source, already projected.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryRecord {
    pub code: CountryCode,
    pub geometry: Arc<MultiPolygon<f64>>,
}

impl CountryRecord {
    #[must_use]
    pub fn new(code: CountryCode, geometry: MultiPolygon<f64>) -> Self {
        Self {
            code,
            geometry: Arc::new(geometry),
        }
    }
}

/// One row of the classification sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub country: CountryCode,
    pub stage: StageCode,
    pub reboot: bool,
    pub sub_entities: bool,
}

/// One row of the stage legend sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    pub code: StageCode,
    pub labels: LocalizedText,
    pub base_color: Color,
    /// `None` when the sheet cell is empty: the stage has no hatch.
    pub stripe_color: Option<Color>,
}

impl StageEntry {
    /// Base color to draw with; an empty cell falls back to `lightgrey`.
    #[must_use]
    pub fn fill_color(&self) -> Color {
        if self.base_color.is_empty() {
            Color::default_base()
        } else {
            self.base_color.clone()
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can abort a render pass.
///
/// Join mismatches are not errors; they fall back to default styling.
#[derive(Debug, Error)]
pub enum HistomapError {
    /// A remote table could not be fetched.
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// A source table lacks a required column.
    #[error("Missing required column '{column}' in {table} table")]
    MissingColumn { table: String, column: String },

    /// A CSV body could not be parsed.
    #[error("CSV error: {0}")]
    Csv(String),

    /// The geometry dataset is missing or malformed.
    #[error("Geometry source error: {0}")]
    Geometry(String),

    /// A country geometry cannot be drawn.
    #[error("Invalid geometry for {country}: {reason}")]
    InvalidGeometry { country: CountryCode, reason: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// A configuration value is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<csv::Error> for HistomapError {
    fn from(e: csv::Error) -> Self {
        HistomapError::Csv(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_case_insensitively() {
        assert_eq!("fr".parse::<Language>().expect("fr"), Language::Fr);
        assert_eq!(" EN ".parse::<Language>().expect("en"), Language::En);
        assert!("DE".parse::<Language>().is_err());
    }

    #[test]
    fn language_displays_selector_code() {
        assert_eq!(Language::En.to_string(), "EN");
        assert_eq!(Language::default(), Language::Fr);
    }

    #[test]
    fn localized_text_selects_language() {
        let text = LocalizedText::new("Pays", "Country");
        assert_eq!(text.get(Language::Fr), "Pays");
        assert_eq!(text.get(Language::En), "Country");
    }

    #[test]
    fn color_defaults() {
        assert_eq!(Color::default_base().as_str(), "lightgrey");
        assert_eq!(Color::transparent().as_str(), "#00000000");
        assert!(Color::new("").is_empty());
    }

    #[test]
    fn missing_column_message_names_table_and_column() {
        let err = HistomapError::MissingColumn {
            table: "legend".to_string(),
            column: "baseColor".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing required column 'baseColor' in legend table"
        );
    }
}
