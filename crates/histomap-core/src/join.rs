//! # Data Joiner
//!
//! Combines geometry, classification and legend into the per-render
//! [`JoinedView`].
//!
//! 1. Classification left-joined onto the legend by stage code
//! 2. Geometry left-joined onto that by country code
//! 3. Defaults: base color `lightgrey`, no stripe, flags false
//! 4. `has_stripe` derived before the transparent placeholder is applied
//! 5. Antarctica removed
//!
//! The output order is the geometry source order.

use crate::sources::{ClassificationTable, StageLegend};
use crate::{
    Classification, Color, CountryCode, CountryRecord, Language, LocalizedText, StageCode,
    StageEntry,
};
use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Territory never rendered.
pub const EXCLUDED_TERRITORY: &str = "ATA";

// =============================================================================
// JOINED RECORDS
// =============================================================================

/// One country with its styling attributes resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedCountry {
    pub code: CountryCode,
    pub geometry: Arc<MultiPolygon<f64>>,
    /// Stage from the classification sheet, if the country is classified.
    pub stage: Option<StageCode>,
    pub base_color: Color,
    /// Transparent when the stage has no stripe.
    pub stripe_color: Color,
    pub has_stripe: bool,
    pub reboot: bool,
    pub sub_entities: bool,
    /// Stage labels, if the stage is in the legend.
    pub labels: Option<LocalizedText>,
}

impl JoinedCountry {
    /// Stage label in the given language, if any.
    #[must_use]
    pub fn label(&self, language: Language) -> Option<&str> {
        self.labels.as_ref().map(|l| l.get(language))
    }
}

/// Counts of rows that fell back to defaults during a join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinReport {
    /// Countries in the view.
    pub countries: usize,
    /// Countries with no classification row.
    pub unclassified: usize,
    /// Classified countries whose stage is not in the legend.
    pub unknown_stage: usize,
    /// Classification rows naming a country absent from the geometry.
    pub unmatched_classifications: usize,
    /// Extra classification rows for an already classified country.
    pub duplicate_classifications: usize,
}

/// The ordered, immutable result of a join.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinedView {
    countries: Vec<JoinedCountry>,
    report: JoinReport,
}

impl JoinedView {
    #[must_use]
    pub fn countries(&self) -> &[JoinedCountry] {
        &self.countries
    }

    #[must_use]
    pub fn report(&self) -> &JoinReport {
        &self.report
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<&JoinedCountry> {
        self.countries.iter().find(|c| c.code.as_str() == code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.countries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

// =============================================================================
// JOIN
// =============================================================================

/// Build the joined view. Never fails: mismatches take default styling.
#[must_use]
pub fn join(
    countries: &[CountryRecord],
    classifications: &ClassificationTable,
    legend: &StageLegend,
) -> JoinedView {
    let mut report = JoinReport::default();

    // Classification ⟕ legend, first row per country and first entry per stage.
    let mut stages: BTreeMap<&StageCode, &StageEntry> = BTreeMap::new();
    for entry in legend.entries() {
        stages.entry(&entry.code).or_insert(entry);
    }
    let mut classified: BTreeMap<&CountryCode, (&Classification, Option<&StageEntry>)> =
        BTreeMap::new();
    for row in classifications.rows() {
        if classified.contains_key(&row.country) {
            report.duplicate_classifications += 1;
            continue;
        }
        classified.insert(&row.country, (row, stages.get(&row.stage).copied()));
    }

    let known: BTreeSet<&CountryCode> = countries.iter().map(|c| &c.code).collect();
    report.unmatched_classifications = classified.keys().filter(|c| !known.contains(*c)).count();

    // Geometry ⟕ (classification ⟕ legend), minus the excluded territory.
    let joined: Vec<JoinedCountry> = countries
        .iter()
        .filter(|c| c.code.as_str() != EXCLUDED_TERRITORY)
        .map(|country| {
            let (row, entry) = match classified.get(&country.code) {
                Some((row, entry)) => (Some(*row), *entry),
                None => (None, None),
            };
            match (row, entry) {
                (None, _) => report.unclassified += 1,
                (Some(_), None) => report.unknown_stage += 1,
                (Some(_), Some(_)) => {}
            }
            resolve(country, row, entry)
        })
        .collect();

    report.countries = joined.len();
    JoinedView {
        countries: joined,
        report,
    }
}

fn resolve(
    country: &CountryRecord,
    row: Option<&Classification>,
    entry: Option<&StageEntry>,
) -> JoinedCountry {
    let base_color = entry.map_or_else(Color::default_base, StageEntry::fill_color);

    // Decide on the raw value; the placeholder must not count as a stripe.
    let stripe = entry.and_then(|e| e.stripe_color.clone());
    let has_stripe = stripe.as_ref().is_some_and(|c| !c.is_empty());
    let stripe_color = stripe
        .filter(|c| !c.is_empty())
        .unwrap_or_else(Color::transparent);

    JoinedCountry {
        code: country.code.clone(),
        geometry: Arc::clone(&country.geometry),
        stage: row.map(|r| r.stage.clone()),
        base_color,
        stripe_color,
        has_stripe,
        reboot: row.is_some_and(|r| r.reboot),
        sub_entities: row.is_some_and(|r| r.sub_entities),
        labels: entry.map(|e| e.labels.clone()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
