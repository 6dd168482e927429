//! # Configuration
//!
//! Settings of the presentation shell, layered as:
//!
//! 1. Built-in defaults (the published map's data sources)
//! 2. An optional TOML file (`--config`)
//! 3. Environment overrides
//!
//! ## Environment Variables
//!
//! - `HISTOMAP_GEOMETRY_PATH`: Shapefile with country polygons
//! - `HISTOMAP_CLASSIFICATION_URL`: Classification sheet CSV export
//! - `HISTOMAP_LEGEND_URL`: Stage legend sheet CSV export
//! - `HISTOMAP_HIDDEN_STAGE_ENTRIES`: Leading stage entries left out of the legend (default: 2)
//! - `HISTOMAP_FETCH_TIMEOUT`: Sheet fetch timeout in seconds (default: 30)
//! - `HISTOMAP_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `HISTOMAP_ADMIN_KEY`: Bearer key required by `POST /cache/invalidate`
//! - `HISTOMAP_CORS_ORIGINS`: Comma-separated allowed origins, or "*" for all

use histomap_core::HistomapError;
use histomap_core::render::DEFAULT_HIDDEN_STAGE_ENTRIES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_GEOMETRY_PATH: &str =
    "ne_110m_admin_0_countries_lakes/ne_110m_admin_0_countries_lakes.shp";

pub const DEFAULT_CLASSIFICATION_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSgcOEGH5nEzRQ6zFdiDxB0S3xHtZ8BUR039zmtnw5hj7mfycCHrdIr2hcc_WM4uR_NNS0z7Bg2ho_c/pub?gid=0&single=true&output=csv";

pub const DEFAULT_LEGEND_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSgcOEGH5nEzRQ6zFdiDxB0S3xHtZ8BUR039zmtnw5hj7mfycCHrdIr2hcc_WM4uR_NNS0z7Bg2ho_c/pub?gid=1702276270&single=true&output=csv";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FIGURE_CACHE_CAPACITY: usize = 16;
const DEFAULT_RATE_LIMIT: u32 = 100;

// =============================================================================
// APP CONFIG
// =============================================================================

/// Resolved shell configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub geometry_path: PathBuf,
    pub classification_url: String,
    pub legend_url: String,
    pub hidden_stage_entries: usize,
    pub fetch_timeout_secs: u64,
    /// Rendered figures kept in memory; oldest are evicted first.
    pub figure_cache_capacity: usize,
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    pub admin_key: Option<String>,
    /// Comma-separated origins, or "*". Localhost only when unset.
    pub cors_origins: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            geometry_path: PathBuf::from(DEFAULT_GEOMETRY_PATH),
            classification_url: DEFAULT_CLASSIFICATION_URL.to_string(),
            legend_url: DEFAULT_LEGEND_URL.to_string(),
            hidden_stage_entries: DEFAULT_HIDDEN_STAGE_ENTRIES,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            figure_cache_capacity: DEFAULT_FIGURE_CACHE_CAPACITY,
            rate_limit: DEFAULT_RATE_LIMIT,
            admin_key: None,
            cors_origins: None,
        }
    }
}

impl AppConfig {
    /// Load defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, HistomapError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.with_overrides(|name| std::env::var(name).ok())
    }

    /// Parse a TOML file. Absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, HistomapError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            HistomapError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        toml::from_str(&text)
            .map_err(|e| HistomapError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, HistomapError> {
        toml::from_str(text).map_err(|e| HistomapError::Config(e.to_string()))
    }

    /// Apply `HISTOMAP_*` overrides read through `lookup`.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, HistomapError> {
        if let Some(path) = lookup("HISTOMAP_GEOMETRY_PATH") {
            self.geometry_path = PathBuf::from(path);
        }
        if let Some(url) = lookup("HISTOMAP_CLASSIFICATION_URL") {
            self.classification_url = url;
        }
        if let Some(url) = lookup("HISTOMAP_LEGEND_URL") {
            self.legend_url = url;
        }
        if let Some(value) = lookup("HISTOMAP_HIDDEN_STAGE_ENTRIES") {
            self.hidden_stage_entries = parse_number("HISTOMAP_HIDDEN_STAGE_ENTRIES", &value)?;
        }
        if let Some(value) = lookup("HISTOMAP_FETCH_TIMEOUT") {
            self.fetch_timeout_secs = parse_number("HISTOMAP_FETCH_TIMEOUT", &value)?;
        }
        if let Some(value) = lookup("HISTOMAP_RATE_LIMIT") {
            self.rate_limit = parse_number("HISTOMAP_RATE_LIMIT", &value)?;
        }
        if let Some(key) = lookup("HISTOMAP_ADMIN_KEY") {
            self.admin_key = Some(key);
        }
        if let Some(origins) = lookup("HISTOMAP_CORS_ORIGINS") {
            self.cors_origins = Some(origins);
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values the shell cannot run with.
    pub fn validate(&self) -> Result<(), HistomapError> {
        if self.fetch_timeout_secs == 0 {
            return Err(HistomapError::Config(
                "fetch_timeout_secs must be greater than 0".to_string(),
            ));
        }
        for (name, url) in [
            ("classification_url", &self.classification_url),
            ("legend_url", &self.legend_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(HistomapError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// The admin key, if one is configured and non-empty.
    #[must_use]
    pub fn admin_key(&self) -> Option<&str> {
        self.admin_key.as_deref().filter(|k| !k.is_empty())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, HistomapError> {
    value
        .trim()
        .parse()
        .map_err(|_| HistomapError::Config(format!("{} is not a valid number: '{}'", name, value)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_match_published_sources() {
        let config = AppConfig::default();
        assert!(config.classification_url.contains("gid=0&"));
        assert!(config.legend_url.contains("gid=1702276270&"));
        assert_eq!(config.hidden_stage_entries, 2);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(30));
        assert!(config.admin_key().is_none());
    }

    #[test]
    fn toml_keeps_defaults_for_absent_keys() {
        let config = AppConfig::from_toml_str("hidden_stage_entries = 0\nrate_limit = 5\n")
            .expect("toml");
        assert_eq!(config.hidden_stage_entries, 0);
        assert_eq!(config.rate_limit, 5);
        assert_eq!(config.legend_url, DEFAULT_LEGEND_URL);
    }

    #[test]
    fn toml_rejects_unknown_keys() {
        let err = AppConfig::from_toml_str("colour = \"red\"\n").expect_err("unknown key");
        assert!(matches!(err, HistomapError::Config(_)));
    }

    #[test]
    fn environment_overrides_file_values() {
        let config = AppConfig::default()
            .with_overrides(env(&[
                ("HISTOMAP_LEGEND_URL", "http://localhost:9000/legend.csv"),
                ("HISTOMAP_HIDDEN_STAGE_ENTRIES", " 3 "),
                ("HISTOMAP_ADMIN_KEY", "secret"),
            ]))
            .expect("overrides");
        assert_eq!(config.legend_url, "http://localhost:9000/legend.csv");
        assert_eq!(config.hidden_stage_entries, 3);
        assert_eq!(config.admin_key(), Some("secret"));
    }

    #[test]
    fn invalid_number_is_config_error() {
        let err = AppConfig::default()
            .with_overrides(env(&[("HISTOMAP_FETCH_TIMEOUT", "soon")]))
            .expect_err("invalid");
        assert!(err.to_string().contains("HISTOMAP_FETCH_TIMEOUT"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = AppConfig::default()
            .with_overrides(env(&[("HISTOMAP_FETCH_TIMEOUT", "0")]))
            .expect_err("zero");
        assert!(matches!(err, HistomapError::Config(_)));
    }

    #[test]
    fn empty_admin_key_disables_auth() {
        let config = AppConfig {
            admin_key: Some(String::new()),
            ..AppConfig::default()
        };
        assert!(config.admin_key().is_none());
    }
}
