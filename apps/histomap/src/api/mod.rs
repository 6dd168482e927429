//! # Histomap HTTP API Module
//!
//! The presentation shell: an HTML page with a language selector plus the
//! machine-readable endpoints behind it.
//!
//! ## Endpoints
//!
//! - `GET /` - Page with the FR/EN selector and the inlined map
//! - `GET /map.svg?lang=` - The map as SVG
//! - `GET /view?lang=` - Joined view and join report as JSON
//! - `GET /status` - Configured sources and cache statistics
//! - `POST /cache/invalidate` - Drop all caches (admin key when configured)
//! - `GET /health` - Health check
//!
//! ## Security Configuration
//!
//! - `cors_origins`: Comma-separated allowed origins, or "*" for all (default: localhost only)
//! - `rate_limit`: Requests per second (default: 100, 0 to disable)
//! - `admin_key`: If set, `POST /cache/invalidate` requires a Bearer token

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{AdminKey, admin_key_middleware};
pub use middleware::{GlobalRateLimiter, create_rate_limiter, rate_limit_middleware};
pub use types::{
    ApiError, CountryView, ErrorResponse, HealthResponse, InvalidateResponse, LangQuery,
    StatusResponse, ViewResponse,
};

use crate::config::AppConfig;
use crate::service::MapService;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use histomap_core::HistomapError;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MapService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(service: MapService, config: AppConfig) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// CORS layer for the configured origins.
///
/// - `"*"`: any origin
/// - unset: localhost only
/// - otherwise: the comma-separated list
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (cors_origins = \"*\")");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|s| match s.parse::<HeaderValue>() {
                    Ok(hv) => {
                        tracing::info!("CORS: Allowing origin: {}", s);
                        Some(hv)
                    }
                    Err(e) => {
                        tracing::warn!("CORS: Invalid origin '{}': {}", s, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                cors_for(allowed)
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();
    cors_for(origins)
}

fn cors_for(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Rate limiting (if enabled)
/// 4. Admin key check on `/cache/invalidate` (if configured)
pub fn create_router(state: AppState) -> Router {
    let mut invalidate = post(handlers::invalidate_handler);
    match state.config.admin_key() {
        Some(key) => {
            tracing::info!("Admin key required for cache invalidation");
            invalidate = invalidate.route_layer(axum_middleware::from_fn_with_state(
                AdminKey::new(key),
                auth::admin_key_middleware,
            ));
        }
        None => tracing::warn!(
            "No admin key configured: POST /cache/invalidate is open to every client. \
             Set HISTOMAP_ADMIN_KEY to protect it."
        ),
    }

    let mut router = Router::new()
        .route("/", get(handlers::index_handler))
        .route("/map.svg", get(handlers::map_svg_handler))
        .route("/view", get(handlers::view_handler))
        .route("/status", get(handlers::status_handler))
        .route("/health", get(handlers::health_handler))
        .route("/cache/invalidate", invalidate);

    match create_rate_limiter(state.config.rate_limit) {
        Some(limiter) => {
            tracing::info!(
                "Rate limiting enabled: {} requests/second",
                state.config.rate_limit
            );
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    let cors = build_cors_layer(state.config.cors_origins.as_deref());
    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until the process is stopped.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), HistomapError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| HistomapError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Histomap HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| HistomapError::Io(format!("Server error: {}", e)))
}
