//! HTTP client for the history API.

use crate::config::{DEFAULT_PORT, LOOPBACK};
use crate::error::BridgeError;
use crate::history::{CaptureEntry, HistoryStats};
use crate::scanner::{self, Finding};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthInfo {
    pub status: String,
    pub extension: String,
    pub version: String,
    pub author: String,
}

/// Body of `GET /stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsInfo {
    pub version: String,
    pub author: String,
    #[serde(flatten)]
    pub stats: HistoryStats,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Consumer-side client for the history API.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    base_url: String,
    http: reqwest::Client,
}

impl BridgeClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: format!("http://{}:{}", host, port),
            http,
        })
    }

    /// Client for the default loopback endpoint.
    pub fn local() -> Result<Self> {
        Self::new(LOOPBACK, DEFAULT_PORT)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthInfo> {
        self.get_json("/health").await
    }

    pub async fn history(&self) -> Result<Vec<CaptureEntry>> {
        self.get_json("/history").await
    }

    pub async fn history_item(&self, index: i64) -> Result<CaptureEntry> {
        self.get_json(&format!("/history/{}", index)).await
    }

    pub async fn stats(&self) -> Result<StatsInfo> {
        self.get_json("/stats").await
    }

    /// Fetch the full history and run the heuristic scanner over it locally.
    pub async fn analyze(&self) -> Result<Vec<Finding>> {
        let history = self.history().await?;
        let findings = scanner::analyze(&history);
        debug!(entries = history.len(), findings = findings.len(), "analyzed history");
        Ok(findings)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<T>().await?);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or_else(|_| status.to_string());
        Err(BridgeError::Client(format!("{} ({})", message, status.as_u16())))
    }
}
