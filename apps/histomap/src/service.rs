//! # Map Service
//!
//! Resolves the three sources, runs the core pipeline and memoizes every
//! stage in content-addressed caches:
//!
//! - geometry: keyed by the source fingerprint (path, mtime and size of
//!   the `.shp` and `.dbf` files)
//! - sheets: keyed by URL, remembering the digest of the fetched body
//! - figures: keyed by the geometry key, both sheet digests, language,
//!   date and render options
//!
//! Sheets are fetched once and kept until [`MapService::invalidate`].
//! Each sheet has a fetch gate held across the download, so concurrent
//! requests on a cold cache share one fetch.

use crate::config::AppConfig;
use crate::fetch::TableFetcher;
use chrono::NaiveDate;
use histomap_core::{
    CacheKey, CacheStats, ClassificationTable, ContentCache, CountryRecord, GeometrySource,
    HistomapError, JoinedView, Language, MapInputs, RenderOptions, ShapefileSource, StageLegend,
    build_map,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

// =============================================================================
// OUTPUT
// =============================================================================

/// A rendered figure together with the view it was drawn from.
#[derive(Debug)]
pub struct RenderedMap {
    pub language: Language,
    pub date: NaiveDate,
    pub title: String,
    pub svg: String,
    pub view: JoinedView,
}

/// Cache statistics per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheReport {
    pub geometry: CacheStats,
    pub classifications: CacheStats,
    pub legends: CacheStats,
    pub figures: CacheStats,
}

/// Entries dropped by an invalidation, per stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invalidated {
    pub geometry: usize,
    pub classifications: usize,
    pub legends: usize,
    pub figures: usize,
}

// =============================================================================
// CACHES
// =============================================================================

/// A parsed sheet and the digest of the body it came from.
#[derive(Debug)]
struct Sheet<T> {
    digest: CacheKey,
    table: T,
}

#[derive(Debug)]
struct Caches {
    geometry: ContentCache<Vec<CountryRecord>>,
    classifications: ContentCache<Sheet<ClassificationTable>>,
    legends: ContentCache<Sheet<StageLegend>>,
    figures: ContentCache<RenderedMap>,
}

impl Caches {
    fn new(figure_capacity: usize) -> Self {
        Self {
            geometry: ContentCache::with_capacity(1),
            classifications: ContentCache::with_capacity(1),
            legends: ContentCache::with_capacity(1),
            figures: ContentCache::with_capacity(figure_capacity),
        }
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// Shared entry point of the CLI and the HTTP API.
pub struct MapService {
    geometry: Box<dyn GeometrySource>,
    fetcher: TableFetcher,
    classification_url: String,
    legend_url: String,
    hidden_stage_entries: usize,
    caches: Mutex<Caches>,
    classification_gate: Mutex<()>,
    legend_gate: Mutex<()>,
}

impl MapService {
    pub fn new(
        geometry: Box<dyn GeometrySource>,
        fetcher: TableFetcher,
        config: &AppConfig,
    ) -> Self {
        Self {
            geometry,
            fetcher,
            classification_url: config.classification_url.clone(),
            legend_url: config.legend_url.clone(),
            hidden_stage_entries: config.hidden_stage_entries,
            caches: Mutex::new(Caches::new(config.figure_cache_capacity)),
            classification_gate: Mutex::new(()),
            legend_gate: Mutex::new(()),
        }
    }

    /// Service reading the configured shapefile and sheets.
    pub fn from_config(config: &AppConfig) -> Result<Self, HistomapError> {
        let fetcher = TableFetcher::new(config.fetch_timeout())?;
        Ok(Self::new(
            Box::new(ShapefileSource::new(&config.geometry_path)),
            fetcher,
            config,
        ))
    }

    /// Render the map in `language`, stamped with `date`.
    pub async fn render(
        &self,
        language: Language,
        date: NaiveDate,
    ) -> Result<Arc<RenderedMap>, HistomapError> {
        let geometry_key = self.geometry.fingerprint()?;
        let countries = self.countries(geometry_key).await?;
        let classifications = self
            .sheet(
                "classification",
                &self.classification_url,
                &self.classification_gate,
                |c| &mut c.classifications,
                ClassificationTable::from_csv,
            )
            .await?;
        let legend = self
            .sheet(
                "legend",
                &self.legend_url,
                &self.legend_gate,
                |c| &mut c.legends,
                StageLegend::from_csv,
            )
            .await?;

        let options = RenderOptions::new(date).with_hidden_stage_entries(self.hidden_stage_entries);
        let key = CacheKey::builder("figure")
            .key(&geometry_key)
            .key(&classifications.digest)
            .key(&legend.digest)
            .text(language.code())
            .text(&date.to_string())
            .bytes(&(options.hidden_stage_entries as u64).to_le_bytes())
            .bytes(&options.width.to_le_bytes())
            .bytes(&options.height.to_le_bytes())
            .finish();

        let mut caches = self.caches.lock().await;
        if let Some(hit) = caches.figures.get(&key) {
            tracing::debug!(cache = "figures", %key, "Cache hit");
            return Ok(hit);
        }
        tracing::debug!(cache = "figures", %key, "Cache miss");

        let output = build_map(
            MapInputs {
                countries: &countries,
                classifications: &classifications.table,
                legend: &legend.table,
            },
            language,
            &options,
        )?;

        let report = output.view.report();
        tracing::info!(
            language = %language,
            countries = report.countries,
            unclassified = report.unclassified,
            unknown_stage = report.unknown_stage,
            unmatched_classifications = report.unmatched_classifications,
            duplicate_classifications = report.duplicate_classifications,
            "Rendered map"
        );

        let rendered = RenderedMap {
            language,
            date,
            title: output.figure.title.clone(),
            svg: output.figure.to_svg(),
            view: output.view,
        };
        Ok(caches.figures.insert(key, rendered))
    }

    /// Drop every cached entry so the next render refetches and reloads.
    pub async fn invalidate(&self) -> Invalidated {
        let mut caches = self.caches.lock().await;
        let dropped = Invalidated {
            geometry: caches.geometry.clear(),
            classifications: caches.classifications.clear(),
            legends: caches.legends.clear(),
            figures: caches.figures.clear(),
        };
        tracing::info!(
            geometry = dropped.geometry,
            classifications = dropped.classifications,
            legends = dropped.legends,
            figures = dropped.figures,
            "Caches invalidated"
        );
        dropped
    }

    pub async fn stats(&self) -> CacheReport {
        let caches = self.caches.lock().await;
        CacheReport {
            geometry: caches.geometry.stats(),
            classifications: caches.classifications.stats(),
            legends: caches.legends.stats(),
            figures: caches.figures.stats(),
        }
    }

    async fn countries(&self, key: CacheKey) -> Result<Arc<Vec<CountryRecord>>, HistomapError> {
        let mut caches = self.caches.lock().await;
        if let Some(hit) = caches.geometry.get(&key) {
            tracing::debug!(cache = "geometry", %key, "Cache hit");
            return Ok(hit);
        }
        let countries = self.geometry.load()?;
        tracing::info!(countries = countries.len(), "Loaded geometry");
        Ok(caches.geometry.insert(key, countries))
    }

    /// Cached sheet for `url`, fetched and parsed on a miss.
    ///
    /// `gate` is held from the lookup until the parsed sheet is stored; the
    /// caches lock is not held across the fetch.
    async fn sheet<T>(
        &self,
        name: &'static str,
        url: &str,
        gate: &Mutex<()>,
        select: fn(&mut Caches) -> &mut ContentCache<Sheet<T>>,
        parse: fn(&[u8]) -> Result<T, HistomapError>,
    ) -> Result<Arc<Sheet<T>>, HistomapError> {
        let key = CacheKey::builder(name).text(url).finish();
        let _fetching = gate.lock().await;
        let cached = select(&mut *self.caches.lock().await).get(&key);
        if let Some(hit) = cached {
            tracing::debug!(cache = name, "Cache hit");
            return Ok(hit);
        }

        let body = self.fetcher.fetch(url).await?;
        let sheet = Sheet {
            digest: CacheKey::of_content(&body),
            table: parse(&body)?,
        };
        tracing::info!(sheet = name, bytes = body.len(), digest = %sheet.digest, "Fetched sheet");
        Ok(select(&mut *self.caches.lock().await).insert(key, sheet))
    }
}
