//! # Scenario Tests
//!
//! End-to-end checks of the pipeline on small hand-built inputs, parsed
//! from CSV the way the spreadsheet exports arrive.
//!
//! ## Groups
//! - S1: Default styling and exclusion
//! - S2: Localization
//! - S3: Determinism across runs and dates

use chrono::NaiveDate;
use geo::{LineString, MultiPolygon, Polygon};
use histomap_core::render::{Hatch, Pass};
use histomap_core::{
    ClassificationTable, CountryCode, CountryRecord, Language, MapInputs, MapOutput,
    RenderOptions, StageLegend, build_map,
};

fn square(x: f64, y: f64) -> MultiPolygon<f64> {
    let ring = LineString::from(vec![
        (x, y),
        (x + 4.0, y),
        (x + 4.0, y + 4.0),
        (x, y + 4.0),
        (x, y),
    ]);
    MultiPolygon::new(vec![Polygon::new(ring, vec![])])
}

fn world() -> Vec<CountryRecord> {
    vec![
        CountryRecord::new(CountryCode::new("USA"), square(-100.0, 30.0)),
        CountryRecord::new(CountryCode::new("FRA"), square(0.0, 45.0)),
        CountryRecord::new(CountryCode::new("ATA"), square(0.0, -85.0)),
    ]
}

const CLASSIFICATION: &str = "alpha_3,stage,reboot,subEntities\nUSA,A,TRUE,FALSE\n";
const LEGEND: &str = "code,label_fr,label_en,baseColor,stripeColor\nA,Alpha FR,Alpha,red,\n";

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, day).expect("date")
}

fn run(language: Language, options: &RenderOptions) -> MapOutput {
    let countries = world();
    let classifications = ClassificationTable::from_csv(CLASSIFICATION.as_bytes()).expect("csv");
    let legend = StageLegend::from_csv(LEGEND.as_bytes()).expect("csv");
    build_map(
        MapInputs {
            countries: &countries,
            classifications: &classifications,
            legend: &legend,
        },
        language,
        options,
    )
    .expect("render")
}

// =============================================================================
// S1: DEFAULT STYLING AND EXCLUSION
// =============================================================================

mod s1_defaults {
    use super::*;

    /// S1.1: The reference scenario from the classification sheet.
    #[test]
    fn usa_fra_ata_scenario() {
        let out = run(Language::En, &RenderOptions::new(date(7)).with_hidden_stage_entries(0));

        let fra = out.view.get("FRA").expect("FRA");
        assert_eq!(fra.base_color.as_str(), "lightgrey");
        assert!(!fra.has_stripe && !fra.reboot && !fra.sub_entities);

        let usa = out.view.get("USA").expect("USA");
        assert_eq!(usa.base_color.as_str(), "red");
        assert!(usa.reboot);
        assert!(!usa.has_stripe);

        assert!(out.view.get("ATA").is_none());
        assert_eq!(out.view.len(), 2);
    }

    /// S1.2: Draw calls follow the styling table.
    #[test]
    fn draw_calls_for_scenario() {
        let out = run(Language::En, &RenderOptions::new(date(7)));

        let usa: Vec<_> = out.figure.draws_for("USA").collect();
        assert_eq!(usa.len(), 2);
        assert_eq!(usa[0].pass, Pass::Base);
        assert_eq!(usa[0].style.fill.as_str(), "red");
        assert_eq!(usa[0].style.edge.as_str(), "black");
        assert_eq!(usa[0].style.hatch, None);
        assert_eq!(usa[1].pass, Pass::Reboot);
        assert_eq!(usa[1].style.hatch.map(|h| h.hatch), Some(Hatch::Vertical));

        let fra: Vec<_> = out.figure.draws_for("FRA").collect();
        assert_eq!(fra.len(), 1);
        assert_eq!(fra[0].style.fill.as_str(), "lightgrey");
        assert_eq!(fra[0].style.hatch, None);

        assert_eq!(out.figure.draws_for("ATA").count(), 0);
    }

    /// S1.3: The report counts the unclassified country.
    #[test]
    fn report_counts_fallbacks() {
        let out = run(Language::Fr, &RenderOptions::new(date(7)));
        let report = out.view.report();
        assert_eq!(report.countries, 2);
        assert_eq!(report.unclassified, 1);
        assert_eq!(report.unknown_stage, 0);
    }
}

// =============================================================================
// S2: LOCALIZATION
// =============================================================================

mod s2_localization {
    use super::*;

    /// S2.1: English selects English text everywhere.
    #[test]
    fn english_labels() {
        let out = run(Language::En, &RenderOptions::new(date(7)).with_hidden_stage_entries(0));
        assert_eq!(out.figure.title, "World Historionomic Map - 07 Apr 2024");
        let labels: Vec<&str> = out.figure.legend.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Alpha", "Reboot", "Heterogeneous sub-entities"]);
    }

    /// S2.2: French selects French text everywhere.
    #[test]
    fn french_labels() {
        let out = run(Language::Fr, &RenderOptions::new(date(7)).with_hidden_stage_entries(0));
        assert_eq!(out.figure.title, "Carte Historionomique Mondiale - 07 Apr 2024");
        let labels: Vec<&str> = out.figure.legend.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Alpha FR", "Reboot", "Sous-entités hétérogènes"]);
        assert!(out.figure.to_svg().contains("Sous-entités hétérogènes"));
    }

    /// S2.3: Default hiding drops the single stage but keeps fixed entries.
    #[test]
    fn default_hidden_entries() {
        let out = run(Language::En, &RenderOptions::new(date(7)));
        assert_eq!(out.figure.legend.entries.len(), 2);
    }
}

// =============================================================================
// S3: DETERMINISM
// =============================================================================

mod s3_determinism {
    use super::*;

    /// S3.1: Same inputs, same date, same SVG.
    #[test]
    fn identical_runs_identical_svg() {
        let options = RenderOptions::new(date(7));
        assert_eq!(
            run(Language::Fr, &options).figure.to_svg(),
            run(Language::Fr, &options).figure.to_svg()
        );
    }

    /// S3.2: Different days differ only in the title date.
    #[test]
    fn different_days_differ_only_in_title() {
        let a = run(Language::En, &RenderOptions::new(date(7))).figure.to_svg();
        let b = run(Language::En, &RenderOptions::new(date(8))).figure.to_svg();
        assert_ne!(a, b);
        assert_eq!(a.replace("07 Apr 2024", "DATE"), b.replace("08 Apr 2024", "DATE"));
    }
}
