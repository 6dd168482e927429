//! # API Request/Response Types
//!
//! JSON structures of the HTTP API and the error mapping of pipeline
//! failures onto status codes.

use crate::service::{CacheReport, Invalidated, RenderedMap};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use histomap_core::{HistomapError, JoinReport, JoinedCountry, Language};
use serde::{Deserialize, Serialize};

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// `?lang=FR|EN`, French when absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LangQuery {
    #[serde(default)]
    pub lang: Language,
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Configured sources and cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub geometry_path: String,
    pub classification_url: String,
    pub legend_url: String,
    pub hidden_stage_entries: usize,
    pub caches: CacheReport,
}

// =============================================================================
// VIEW RESPONSE
// =============================================================================

/// Styling resolved for one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryView {
    pub code: String,
    pub stage: Option<String>,
    pub label: Option<String>,
    pub base_color: String,
    pub stripe_color: String,
    pub has_stripe: bool,
    pub reboot: bool,
    pub sub_entities: bool,
}

impl CountryView {
    #[must_use]
    pub fn from_joined(country: &JoinedCountry, language: Language) -> Self {
        Self {
            code: country.code.as_str().to_string(),
            stage: country.stage.as_ref().map(|s| s.as_str().to_string()),
            label: country.label(language).map(str::to_string),
            base_color: country.base_color.as_str().to_string(),
            stripe_color: country.stripe_color.as_str().to_string(),
            has_stripe: country.has_stripe,
            reboot: country.reboot,
            sub_entities: country.sub_entities,
        }
    }
}

/// The joined view behind a rendered map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewResponse {
    pub language: Language,
    pub date: NaiveDate,
    pub title: String,
    pub countries: Vec<CountryView>,
    pub report: JoinReport,
}

impl ViewResponse {
    #[must_use]
    pub fn from_rendered(rendered: &RenderedMap) -> Self {
        Self {
            language: rendered.language,
            date: rendered.date,
            title: rendered.title.clone(),
            countries: rendered
                .view
                .countries()
                .iter()
                .map(|c| CountryView::from_joined(c, rendered.language))
                .collect(),
            report: rendered.view.report().clone(),
        }
    }
}

// =============================================================================
// INVALIDATE RESPONSE
// =============================================================================

/// Entries dropped by `POST /cache/invalidate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub success: bool,
    pub dropped: Invalidated,
}

// =============================================================================
// ERRORS
// =============================================================================

/// JSON body of every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A pipeline failure surfaced over HTTP.
///
/// Upstream sheet failures map to 502; everything else to 500.
#[derive(Debug)]
pub struct ApiError(pub HistomapError);

impl From<HistomapError> for ApiError {
    fn from(e: HistomapError) -> Self {
        Self(e)
    }
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self.0 {
            HistomapError::Fetch(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = status.as_u16(), error = %self.0, "Render failed");
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================
