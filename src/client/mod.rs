//! ActuatorClient trait - the raw-fetch capability the engine consumes.
//!
//! The engine never builds requests itself. Anything that can produce the
//! decoded payloads (HTTP, a recorded fixture, a test fake) plugs in here.

pub mod http;

use async_trait::async_trait;

use crate::error::FetchFailure;
use crate::models::{BeansReport, ConfigPropsReport, HealthReport, MetricDetail, MetricNames};
use crate::source::Source;

pub use http::HttpActuatorClient;

pub type FetchResult<T> = std::result::Result<T, FetchFailure>;

#[async_trait]
pub trait ActuatorClient: Send + Sync {
    async fn beans(&self, source: &Source) -> FetchResult<BeansReport>;

    async fn health(&self, source: &Source) -> FetchResult<HealthReport>;

    async fn config_props(&self, source: &Source) -> FetchResult<ConfigPropsReport>;

    /// Phase 1 of the metrics fetch: names of every available metric.
    async fn metric_names(&self, source: &Source) -> FetchResult<MetricNames>;

    /// Phase 2 of the metrics fetch: unit and statistics for one metric.
    async fn metric(&self, source: &Source, name: &str) -> FetchResult<MetricDetail>;
}
