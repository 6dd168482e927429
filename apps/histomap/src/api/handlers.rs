//! # API Endpoint Handlers
//!
//! Every map request renders for today's date; repeated requests on the same
//! day are served from the figure cache.

use super::{
    AppState,
    types::{
        ApiError, HealthResponse, InvalidateResponse, LangQuery, StatusResponse, ViewResponse,
    },
};
use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use histomap_core::Language;
use histomap_core::render::escape;

/// Date stamped into titles of maps rendered now.
fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// PAGE HANDLER
// =============================================================================

/// Page with the language selector and the map inlined as a data URI.
pub async fn index_handler(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<Html<String>, ApiError> {
    let rendered = state.service.render(query.lang, today()).await?;
    let data_uri = format!("data:image/svg+xml;base64,{}", STANDARD.encode(&rendered.svg));
    Ok(Html(page(query.lang, &rendered.title, &data_uri)))
}

fn page(selected: Language, title: &str, data_uri: &str) -> String {
    let options: String = [Language::Fr, Language::En]
        .iter()
        .map(|lang| {
            format!(
                r#"<option value="{code}"{sel}>{code}</option>"#,
                code = lang.code(),
                sel = if *lang == selected { " selected" } else { "" }
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>body {{ margin: 0; font-family: sans-serif; }} form {{ padding: 8px; }} img {{ width: 100%; height: auto; }}</style>
</head>
<body>
<form method="get" action="/">
<label for="lang">Language / Langue</label>
<select id="lang" name="lang" onchange="this.form.submit()">{options}</select>
<noscript><button type="submit">OK</button></noscript>
</form>
<img src="{src}" alt="{title}">
</body>
</html>
"#,
        lang = selected.code().to_ascii_lowercase(),
        title = escape(title),
        options = options,
        src = data_uri
    )
}

// =============================================================================
// MAP HANDLERS
// =============================================================================

/// The figure as an SVG document.
pub async fn map_svg_handler(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rendered = state.service.render(query.lang, today()).await?;
    Ok((
        [(header::CONTENT_TYPE, "image/svg+xml; charset=utf-8")],
        rendered.svg.clone(),
    ))
}

/// The joined view and its report as JSON.
pub async fn view_handler(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> Result<Json<ViewResponse>, ApiError> {
    let rendered = state.service.render(query.lang, today()).await?;
    Ok(Json(ViewResponse::from_rendered(&rendered)))
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Configured sources and cache statistics.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        geometry_path: state.config.geometry_path.display().to_string(),
        classification_url: state.config.classification_url.clone(),
        legend_url: state.config.legend_url.clone(),
        hidden_stage_entries: state.config.hidden_stage_entries,
        caches: state.service.stats().await,
    })
}

// =============================================================================
// INVALIDATE HANDLER
// =============================================================================

/// Drop all cached geometry, sheets and figures.
pub async fn invalidate_handler(State(state): State<AppState>) -> impl IntoResponse {
    let dropped = state.service.invalidate().await;
    Json(InvalidateResponse {
        success: true,
        dropped,
    })
}
