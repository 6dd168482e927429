//! # Sheet Fetcher
//!
//! Downloads the published spreadsheet CSV exports. One attempt per call:
//! failures are reported, never retried.

use histomap_core::HistomapError;
use std::time::Duration;

/// HTTP client for the classification and legend sheets.
#[derive(Debug, Clone)]
pub struct TableFetcher {
    http: reqwest::Client,
}

impl TableFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, HistomapError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("histomap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HistomapError::Fetch(format!("Cannot build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// GET `url` and return the body. Non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, HistomapError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| HistomapError::Fetch(format!("Cannot reach {}: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HistomapError::Fetch(format!(
                "{} answered {}",
                url,
                status.as_u16()
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| HistomapError::Fetch(format!("Cannot read body of {}: {}", url, e)))?;
        tracing::debug!(url, bytes = body.len(), "Fetched sheet");
        Ok(body.to_vec())
    }
}
