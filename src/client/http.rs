//! reqwest-backed actuator client.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::{ActuatorClient, FetchResult};
use crate::endpoint::EndpointKind;
use crate::error::FetchFailure;
use crate::models::{BeansReport, ConfigPropsReport, HealthReport, MetricDetail, MetricNames};
use crate::source::Source;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const ERROR_BODY_LIMIT: usize = 200;

/// Actuator client over HTTP
#[derive(Debug, Clone)]
pub struct HttpActuatorClient {
    http: Client,
}

impl HttpActuatorClient {
    pub fn new() -> Result<Self, FetchFailure> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchFailure> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchFailure::Other(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> FetchResult<T> {
        tracing::trace!(url = %url, "GET");

        let response = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchFailure::Status {
                status: status.as_u16(),
                message: body.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchFailure::Decode {
            status: status.as_u16(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ActuatorClient for HttpActuatorClient {
    async fn beans(&self, source: &Source) -> FetchResult<BeansReport> {
        self.get(&source.endpoint_url(EndpointKind::Beans.path()))
            .await
    }

    async fn health(&self, source: &Source) -> FetchResult<HealthReport> {
        self.get(&source.endpoint_url(EndpointKind::Health.path()))
            .await
    }

    async fn config_props(&self, source: &Source) -> FetchResult<ConfigPropsReport> {
        self.get(&source.endpoint_url(EndpointKind::ConfigProps.path()))
            .await
    }

    async fn metric_names(&self, source: &Source) -> FetchResult<MetricNames> {
        self.get(&source.endpoint_url(EndpointKind::Metrics.path()))
            .await
    }

    async fn metric(&self, source: &Source, name: &str) -> FetchResult<MetricDetail> {
        let url = metric_url(source, name)?;
        self.get(url.as_str()).await
    }
}

/// `<base>/metrics/<name>` with `name` percent-encoded as one path segment.
fn metric_url(source: &Source, name: &str) -> FetchResult<Url> {
    let mut url = Url::parse(&source.endpoint_url(EndpointKind::Metrics.path()))
        .map_err(|e| FetchFailure::Other(format!("Invalid metrics URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| FetchFailure::Other(format!("Cannot append metric '{}' to URL", name)))?
        .push(name);
    Ok(url)
}
