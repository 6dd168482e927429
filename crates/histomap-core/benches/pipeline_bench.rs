//! # Pipeline Benchmarks
//!
//! Join, render and SVG serialization on a synthetic world.
//!
//! Run with: `cargo bench -p histomap-core`

#![allow(clippy::unwrap_used)]

use criterion::{Criterion, criterion_group, criterion_main};
use geo::{LineString, MultiPolygon, Polygon};
use histomap_core::{
    Classification, ClassificationTable, Color, CountryCode, CountryRecord, Language,
    LocalizedText, RenderOptions, StageCode, StageEntry, StageLegend, join, render,
};
use std::hint::black_box;

const COUNTRIES: usize = 180;
const RING_POINTS: usize = 200;

fn synthetic_world() -> (Vec<CountryRecord>, ClassificationTable, StageLegend) {
    let countries = (0..COUNTRIES)
        .map(|i| {
            let cx = (i % 18) as f64 * 20.0 - 170.0;
            let cy = (i / 18) as f64 * 15.0 - 70.0;
            let ring: LineString<f64> = (0..=RING_POINTS)
                .map(|k| {
                    let t = k as f64 / RING_POINTS as f64 * std::f64::consts::TAU;
                    (cx + 5.0 * t.cos(), cy + 5.0 * t.sin())
                })
                .collect::<Vec<_>>()
                .into();
            CountryRecord::new(
                CountryCode::new(format!("C{:02}", i)),
                MultiPolygon::new(vec![Polygon::new(ring, vec![])]),
            )
        })
        .collect();

    let classifications = ClassificationTable::from_rows(
        (0..COUNTRIES)
            .step_by(2)
            .map(|i| Classification {
                country: CountryCode::new(format!("C{:02}", i)),
                stage: StageCode::new(format!("S{}", i % 5)),
                reboot: i % 3 == 0,
                sub_entities: i % 7 == 0,
            })
            .collect(),
    );

    let legend = StageLegend::from_entries(
        (0..5)
            .map(|s| StageEntry {
                code: StageCode::new(format!("S{}", s)),
                labels: LocalizedText::new(format!("Étape {}", s), format!("Stage {}", s)),
                base_color: Color::new("#3366cc"),
                stripe_color: (s % 2 == 0).then(|| Color::new("#ffcc00")),
            })
            .collect(),
    );

    (countries, classifications, legend)
}

fn bench_pipeline(c: &mut Criterion) {
    let (countries, classifications, legend) = synthetic_world();
    let options = RenderOptions::new(chrono::NaiveDate::from_ymd_opt(2024, 4, 7).unwrap());

    c.bench_function("join", |b| {
        b.iter(|| join(black_box(&countries), &classifications, &legend))
    });

    let view = join(&countries, &classifications, &legend);
    c.bench_function("render", |b| {
        b.iter(|| render(black_box(&view), &legend, Language::En, &options).unwrap())
    });

    let figure = render(&view, &legend, Language::En, &options).unwrap();
    c.bench_function("to_svg", |b| b.iter(|| black_box(&figure).to_svg()));
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
