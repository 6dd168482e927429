//! # Histomap
//!
//! Presentation shell around `histomap-core`: fetches the two classification
//! sheets, loads the country geometry, and serves the rendered map.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 apps/histomap (THE BINARY)           │
//! │                                                      │
//! │   ┌─────────────┐              ┌─────────────┐       │
//! │   │    CLI      │              │  HTTP API   │       │
//! │   │   (clap)    │              │   (axum)    │       │
//! │   └──────┬──────┘              └──────┬──────┘       │
//! │          └──────────────┬─────────────┘              │
//! │                         ▼                            │
//! │                 ┌───────────────┐   ┌────────────┐   │
//! │                 │  MapService   │◄──│  fetch     │   │
//! │                 │  (caches)     │   │ (reqwest)  │   │
//! │                 └───────┬───────┘   └────────────┘   │
//! │                         ▼                            │
//! │                 ┌───────────────┐                    │
//! │                 │ histomap-core │                    │
//! │                 └───────────────┘                    │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod fetch;
pub mod service;

pub use config::AppConfig;
pub use fetch::TableFetcher;
pub use service::{CacheReport, Invalidated, MapService, RenderedMap};
