//! # Tabular Sources
//!
//! Parsing of the two spreadsheet exports: the per-country classification
//! sheet and the stage legend sheet.
//!
//! - Required columns are hard-required: a missing one aborts the render
//! - Empty cells stay empty strings (no NA conversion)
//! - No row validation: malformed rows surface later as join mismatches

use crate::{Classification, Color, CountryCode, HistomapError, LocalizedText, StageCode, StageEntry};
use csv::{ReaderBuilder, StringRecord};

/// Required columns of the classification sheet, in reading order.
pub const CLASSIFICATION_COLUMNS: [&str; 4] = ["alpha_3", "stage", "reboot", "subEntities"];

/// Required columns of the legend sheet, in reading order.
pub const LEGEND_COLUMNS: [&str; 5] = ["code", "label_fr", "label_en", "baseColor", "stripeColor"];

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// All rows of the classification sheet, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationTable {
    rows: Vec<Classification>,
}

impl ClassificationTable {
    /// Parse a CSV export of the classification sheet.
    pub fn from_csv(body: &[u8]) -> Result<Self, HistomapError> {
        let rows = read_rows(body, "classification", CLASSIFICATION_COLUMNS)?
            .into_iter()
            .map(|[country, stage, reboot, sub_entities]| Classification {
                country: CountryCode::new(country),
                stage: StageCode::new(stage),
                reboot: parse_flag(&reboot),
                sub_entities: parse_flag(&sub_entities),
            })
            .collect();
        Ok(Self { rows })
    }

    #[must_use]
    pub fn from_rows(rows: Vec<Classification>) -> Self {
        Self { rows }
    }

    #[must_use]
    pub fn rows(&self) -> &[Classification] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// STAGE LEGEND
// =============================================================================

/// The stage legend: the visual vocabulary of the map, in sheet order.
///
/// Entries with an empty stage code are dropped on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageLegend {
    entries: Vec<StageEntry>,
}

impl StageLegend {
    /// Parse a CSV export of the legend sheet.
    pub fn from_csv(body: &[u8]) -> Result<Self, HistomapError> {
        let entries = read_rows(body, "legend", LEGEND_COLUMNS)?
            .into_iter()
            .map(|[code, label_fr, label_en, base, stripe]| StageEntry {
                code: StageCode::new(code),
                labels: LocalizedText::new(label_fr, label_en),
                base_color: Color::new(base),
                stripe_color: (!stripe.is_empty()).then(|| Color::new(stripe)),
            })
            .collect();
        Ok(Self::from_entries(entries))
    }

    #[must_use]
    pub fn from_entries(entries: Vec<StageEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .filter(|e| !e.code.as_str().is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[StageEntry] {
        &self.entries
    }

    /// First entry with the given code.
    #[must_use]
    pub fn get(&self, code: &StageCode) -> Option<&StageEntry> {
        self.entries.iter().find(|e| &e.code == code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Interpret a spreadsheet boolean cell.
///
/// Truthy: `true`, `1`, `yes`, `oui` (any case). Everything else is false,
/// including an empty cell.
#[must_use]
pub fn parse_flag(cell: &str) -> bool {
    matches!(
        cell.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "oui"
    )
}

/// Read the required columns of every row, in the order of `columns`.
fn read_rows<const N: usize>(
    body: &[u8],
    table: &str,
    columns: [&str; N],
) -> Result<Vec<[String; N]>, HistomapError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(body);
    let headers = reader.headers()?.clone();
    let indices = column_indices(&headers, table, columns)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(indices.map(|i| record.get(i).unwrap_or_default().to_string()));
    }
    Ok(rows)
}

fn column_indices<const N: usize>(
    headers: &StringRecord,
    table: &str,
    columns: [&str; N],
) -> Result<[usize; N], HistomapError> {
    let mut indices = [0usize; N];
    for (slot, column) in indices.iter_mut().zip(columns) {
        *slot = headers
            .iter()
            .position(|h| h.trim() == column)
            .ok_or_else(|| HistomapError::MissingColumn {
                table: table.to_string(),
                column: column.to_string(),
            })?;
    }
    Ok(indices)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const CLASSIFICATION_CSV: &str = "\
name,alpha_3,stage,reboot,subEntities
France,FRA,B,FALSE,TRUE
United States,USA,A,TRUE,FALSE
Nowhere,XXX,,,
";

    const LEGEND_CSV: &str = "\
code,label_fr,label_en,baseColor,stripeColor,comment
,,,,,spacer row
N,Sans donnée,No data,white,,
A,Étape A,Stage A,red,,
B,Étape B,Stage B,#3366cc,#ffcc00,
";

    #[test]
    fn classification_reads_required_columns_in_any_position() {
        let table = ClassificationTable::from_csv(CLASSIFICATION_CSV.as_bytes()).expect("parse");
        assert_eq!(table.len(), 3);

        let fra = &table.rows()[0];
        assert_eq!(fra.country.as_str(), "FRA");
        assert_eq!(fra.stage.as_str(), "B");
        assert!(!fra.reboot);
        assert!(fra.sub_entities);

        let usa = &table.rows()[1];
        assert!(usa.reboot);
        assert!(!usa.sub_entities);
    }

    #[test]
    fn classification_keeps_empty_cells_as_empty() {
        let table = ClassificationTable::from_csv(CLASSIFICATION_CSV.as_bytes()).expect("parse");
        let nowhere = &table.rows()[2];
        assert_eq!(nowhere.stage.as_str(), "");
        assert!(!nowhere.reboot);
        assert!(!nowhere.sub_entities);
    }

    #[test]
    fn classification_missing_column_is_fatal() {
        let csv = "alpha_3,stage,reboot\nFRA,A,TRUE\n";
        let err = ClassificationTable::from_csv(csv.as_bytes()).expect_err("missing column");
        assert!(matches!(
            err,
            HistomapError::MissingColumn { ref column, .. } if column == "subEntities"
        ));
    }

    #[test]
    fn legend_drops_rows_without_code() {
        let legend = StageLegend::from_csv(LEGEND_CSV.as_bytes()).expect("parse");
        let codes: Vec<&str> = legend.entries().iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["N", "A", "B"]);
    }

    #[test]
    fn legend_empty_stripe_is_absent() {
        let legend = StageLegend::from_csv(LEGEND_CSV.as_bytes()).expect("parse");
        let a = legend.get(&StageCode::new("A")).expect("A");
        assert_eq!(a.stripe_color, None);
        assert_eq!(a.base_color.as_str(), "red");

        let b = legend.get(&StageCode::new("B")).expect("B");
        assert_eq!(b.stripe_color, Some(Color::new("#ffcc00")));
        assert_eq!(b.labels.get(crate::Language::Fr), "Étape B");
    }

    #[test]
    fn legend_missing_column_is_fatal() {
        let csv = "code,label_fr,label_en,baseColor\nA,a,a,red\n";
        let err = StageLegend::from_csv(csv.as_bytes()).expect_err("missing column");
        assert!(matches!(
            err,
            HistomapError::MissingColumn { ref table, ref column }
                if table == "legend" && column == "stripeColor"
        ));
    }

    #[test]
    fn short_rows_are_padded_with_empty_cells() {
        let csv = "code,label_fr,label_en,baseColor,stripeColor\nA,a,b\n";
        let legend = StageLegend::from_csv(csv.as_bytes()).expect("parse");
        let a = &legend.entries()[0];
        assert!(a.base_color.is_empty());
        assert_eq!(a.stripe_color, None);
    }

    #[test]
    fn flag_parsing() {
        for truthy in ["TRUE", "true", "True", "1", "yes", "OUI", " true "] {
            assert!(parse_flag(truthy), "{truthy}");
        }
        for falsy in ["FALSE", "false", "0", "", "no", "maybe"] {
            assert!(!parse_flag(falsy), "{falsy}");
        }
    }
}
