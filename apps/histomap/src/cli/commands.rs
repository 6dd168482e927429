//! # CLI Command Implementations

use crate::api::{self, AppState, ViewResponse};
use crate::config::AppConfig;
use crate::service::MapService;
use chrono::NaiveDate;
use histomap_core::{HistomapError, Language};
use std::path::{Path, PathBuf};

/// Resolve an output path against its canonical parent directory.
fn validate_output_path(path: &Path) -> Result<PathBuf, HistomapError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        HistomapError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;
    if !canonical_parent.is_dir() {
        return Err(HistomapError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| HistomapError::Io("Output path has no filename".to_string()))?;
    Ok(canonical_parent.join(filename))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), HistomapError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| HistomapError::Io(format!("Cannot encode JSON: {}", e)))?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// SERVE COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_serve(config: AppConfig, host: &str, port: u16) -> Result<(), HistomapError> {
    let service = MapService::from_config(&config)?;

    println!("Histomap Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:           {}", host);
    println!("  Port:           {}", port);
    println!("  Geometry:       {}", config.geometry_path.display());
    println!("  Classification: {}", config.classification_url);
    println!("  Legend:         {}", config.legend_url);
    println!();
    println!("Endpoints:");
    println!("  GET  /                 - Map page (?lang=FR|EN)");
    println!("  GET  /map.svg          - Map as SVG");
    println!("  GET  /view             - Joined view as JSON");
    println!("  GET  /status           - Sources and cache statistics");
    println!("  POST /cache/invalidate - Drop cached data");
    println!("  GET  /health           - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, AppState::new(service, config)).await
}

// =============================================================================
// RENDER COMMAND
// =============================================================================

/// Render once and write the SVG to `output`.
pub async fn cmd_render(
    config: &AppConfig,
    json_mode: bool,
    lang: Language,
    output: &Path,
    date: Option<NaiveDate>,
) -> Result<(), HistomapError> {
    let output = validate_output_path(output)?;
    let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let service = MapService::from_config(config)?;
    let rendered = service.render(lang, date).await?;

    std::fs::write(&output, rendered.svg.as_bytes()).map_err(|e| {
        HistomapError::Io(format!("Cannot write '{}': {}", output.display(), e))
    })?;

    if json_mode {
        print_json(&serde_json::json!({
            "success": true,
            "output": output.display().to_string(),
            "title": rendered.title,
            "bytes": rendered.svg.len(),
            "report": rendered.view.report(),
        }))
    } else {
        println!("Rendered: {}", rendered.title);
        println!("  Countries: {}", rendered.view.len());
        println!("  Output:    {}", output.display());
        Ok(())
    }
}

// =============================================================================
// INSPECT COMMAND
// =============================================================================

/// Print per-country styling and the join report.
pub async fn cmd_inspect(
    config: &AppConfig,
    json_mode: bool,
    lang: Language,
) -> Result<(), HistomapError> {
    let service = MapService::from_config(config)?;
    let rendered = service
        .render(lang, chrono::Local::now().date_naive())
        .await?;
    let view = ViewResponse::from_rendered(&rendered);

    if json_mode {
        return print_json(&view);
    }

    println!("{}", view.title);
    println!();
    println!(
        "{:<5} {:<6} {:<12} {:<12} {:<7} {:<7} LABEL",
        "CODE", "STAGE", "BASE", "STRIPE", "REBOOT", "SUBENT"
    );
    for c in &view.countries {
        let stripe = if c.has_stripe { c.stripe_color.as_str() } else { "-" };
        println!(
            "{:<5} {:<6} {:<12} {:<12} {:<7} {:<7} {}",
            c.code,
            c.stage.as_deref().unwrap_or("-"),
            c.base_color,
            stripe,
            c.reboot,
            c.sub_entities,
            c.label.as_deref().unwrap_or("")
        );
    }

    let report = &view.report;
    println!();
    println!("Join report:");
    println!("  Countries:                 {}", report.countries);
    println!("  Unclassified:              {}", report.unclassified);
    println!("  Unknown stage:             {}", report.unknown_stage);
    println!("  Unmatched classifications: {}", report.unmatched_classifications);
    println!("  Duplicate classifications: {}", report.duplicate_classifications);
    Ok(())
}
