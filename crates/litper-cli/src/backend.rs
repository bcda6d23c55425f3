use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use litper_analytics::{DashboardSummary, TrendPoint};
use litper_types::{LitperError, Result, Shipment};

const USER_AGENT: &str = concat!("litper/", env!("CARGO_PKG_VERSION"));

/// Read-only client for a remote dashboard backend.
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| LitperError::Backend(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn summary(&self) -> Result<DashboardSummary> {
        self.get_json("/dashboard/resumen").await
    }

    pub async fn trends(&self, days: u32) -> Result<Vec<TrendPoint>> {
        self.get_json(&format!("/dashboard/tendencias?dias={days}")).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| LitperError::Backend(format!("{url}: {e}")))?;
        if !response.status().is_success() {
            return Err(LitperError::Backend(format!(
                "{url}: HTTP {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| LitperError::Backend(format!("{url}: {e}")))
    }
}

/// Where dashboard numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Backend,
    Local,
}

/// Ask the backend first; on any failure, or with no backend configured,
/// compute from local shipments instead.
pub async fn summary_with_fallback(
    backend: Option<&BackendClient>,
    local: &[Shipment],
    sla_days: u32,
) -> (DashboardSummary, DataSource) {
    if let Some(client) = backend {
        match client.summary().await {
            Ok(summary) => return (summary, DataSource::Backend),
            Err(e) => tracing::warn!("backend unavailable, using local data: {e}"),
        }
    }
    (DashboardSummary::compute(local, sla_days), DataSource::Local)
}

pub async fn trends_with_fallback(
    backend: Option<&BackendClient>,
    local: &[Shipment],
    days: u32,
) -> (Vec<TrendPoint>, DataSource) {
    if let Some(client) = backend {
        match client.trends(days).await {
            Ok(points) => return (points, DataSource::Backend),
            Err(e) => tracing::warn!("backend unavailable, using local data: {e}"),
        }
    }
    let today = chrono::Utc::now().date_naive();
    (litper_analytics::trends(local, days, today), DataSource::Local)
}
