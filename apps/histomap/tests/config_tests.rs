//! Configuration loading from TOML files on disk.

#![allow(clippy::unwrap_used)]

use histomap::AppConfig;
use histomap_core::HistomapError;
use std::io::Write;
use std::path::PathBuf;

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn file_values_override_defaults() {
    let file = write_config(
        r#"
geometry_path = "data/countries.shp"
legend_url = "http://sheets.local/legend.csv"
hidden_stage_entries = 1
figure_cache_capacity = 4
cors_origins = "https://maps.example.org"
"#,
    );

    let config = AppConfig::from_file(file.path()).unwrap();
    assert_eq!(config.geometry_path, PathBuf::from("data/countries.shp"));
    assert_eq!(config.legend_url, "http://sheets.local/legend.csv");
    assert_eq!(config.hidden_stage_entries, 1);
    assert_eq!(config.figure_cache_capacity, 4);
    assert_eq!(config.cors_origins.as_deref(), Some("https://maps.example.org"));
    assert_eq!(
        config.classification_url,
        AppConfig::default().classification_url
    );
}

#[test]
fn overrides_apply_on_top_of_file() {
    let file = write_config("rate_limit = 10\nadmin_key = \"from-file\"\n");

    let config = AppConfig::from_file(file.path())
        .unwrap()
        .with_overrides(|name| (name == "HISTOMAP_ADMIN_KEY").then(|| "from-env".to_string()))
        .unwrap();
    assert_eq!(config.rate_limit, 10);
    assert_eq!(config.admin_key(), Some("from-env"));
}

#[test]
fn malformed_file_is_config_error() {
    let file = write_config("hidden_stage_entries = \"two\"\n");

    let err = AppConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, HistomapError::Config(_)));
}

#[test]
fn non_http_url_is_rejected() {
    let file = write_config("classification_url = \"ftp://sheets.local/c.csv\"\n");

    let err = AppConfig::from_file(file.path())
        .unwrap()
        .with_overrides(|_| None)
        .unwrap_err();
    assert!(err.to_string().contains("classification_url"));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, HistomapError::Io(_)));
}
