//! In-memory [`ActuatorClient`] for tests and demos.
//!
//! Each registered source answers from a scripted [`FakeServer`], with an
//! optional delay per endpoint or per metric so tests can force any
//! completion order. Unregistered sources fail like an unreachable host.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use crate::client::{ActuatorClient, FetchResult};
use crate::endpoint::EndpointKind;
use crate::error::FetchFailure;
use crate::models::{
    BeanDescriptor, BeansContext, BeansReport, ConfigPropsBean, ConfigPropsContext,
    ConfigPropsReport, HealthComponent, HealthReport, Measurement, MetricDetail, MetricNames,
};
use crate::source::Source;

/// Scripted responses of one source
#[derive(Debug, Clone)]
pub struct FakeServer {
    pub beans: FetchResult<BeansReport>,
    pub health: FetchResult<HealthReport>,
    pub config_props: FetchResult<ConfigPropsReport>,
    pub metric_names: FetchResult<MetricNames>,
    pub metrics: BTreeMap<String, FetchResult<MetricDetail>>,
    pub latency: HashMap<EndpointKind, Duration>,
    pub metric_latency: HashMap<String, Duration>,
}

impl FakeServer {
    /// A source that answers every endpoint successfully with status `UP`
    /// and two metrics.
    pub fn healthy() -> Self {
        Self::with_status("UP")
    }

    pub fn with_status(status: &str) -> Self {
        Self {
            beans: Ok(sample_beans()),
            health: Ok(sample_health(status)),
            config_props: Ok(sample_config_props()),
            metric_names: Ok(MetricNames::default()),
            metrics: BTreeMap::new(),
            latency: HashMap::new(),
            metric_latency: HashMap::new(),
        }
        .with_metric(sample_metric("jvm.threads.live", "threads", 42.0))
        .with_metric(sample_metric("process.uptime", "seconds", 3600.0))
    }

    pub fn with_beans(mut self, beans: FetchResult<BeansReport>) -> Self {
        self.beans = beans;
        self
    }

    pub fn with_health(mut self, health: FetchResult<HealthReport>) -> Self {
        self.health = health;
        self
    }

    pub fn with_config_props(mut self, config_props: FetchResult<ConfigPropsReport>) -> Self {
        self.config_props = config_props;
        self
    }

    pub fn with_metric_names(mut self, names: FetchResult<MetricNames>) -> Self {
        self.metric_names = names;
        self
    }

    /// Register a metric and list its name.
    pub fn with_metric(mut self, detail: MetricDetail) -> Self {
        if let Ok(names) = &mut self.metric_names {
            if !names.names.contains(&detail.name) {
                names.names.push(detail.name.clone());
            }
        }
        self.metrics.insert(detail.name.clone(), Ok(detail));
        self
    }

    /// Make the detail fetch of one listed metric fail.
    pub fn with_metric_failure(mut self, name: &str, failure: FetchFailure) -> Self {
        if let Ok(names) = &mut self.metric_names {
            if !names.names.iter().any(|n| n == name) {
                names.names.push(name.to_string());
            }
        }
        self.metrics.insert(name.to_string(), Err(failure));
        self
    }

    /// Delay one endpoint. For metrics this delays the name list.
    pub fn with_latency(mut self, endpoint: EndpointKind, delay: Duration) -> Self {
        self.latency.insert(endpoint, delay);
        self
    }

    pub fn with_metric_latency(mut self, name: &str, delay: Duration) -> Self {
        self.metric_latency.insert(name.to_string(), delay);
        self
    }
}

/// [`ActuatorClient`] backed by scripted servers
#[derive(Debug, Default)]
pub struct FakeActuatorClient {
    servers: HashMap<Source, FakeServer>,
    calls: Mutex<HashMap<(Source, String), usize>>,
}

impl FakeActuatorClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, source: Source, server: FakeServer) -> Self {
        self.servers.insert(source, server);
        self
    }

    /// Number of requests made for `path` (`health`, `metrics/<name>`, ...).
    pub fn calls(&self, source: &Source, path: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .get(&(source.clone(), path.to_string()))
                    .copied()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
    }

    fn record(&self, source: &Source, path: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry((source.clone(), path.to_string())).or_default() += 1;
        }
    }

    async fn respond<T: Clone>(
        &self,
        source: &Source,
        path: &str,
        delay: Option<Duration>,
        pick: impl FnOnce(&FakeServer) -> FetchResult<T>,
    ) -> FetchResult<T> {
        self.record(source, path);
        let server = self.servers.get(source).ok_or_else(|| {
            FetchFailure::Transport(format!("tcp connect error: {} unreachable", source))
        })?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        pick(server)
    }

    fn delay(&self, source: &Source, endpoint: EndpointKind) -> Option<Duration> {
        self.servers
            .get(source)
            .and_then(|s| s.latency.get(&endpoint).copied())
    }
}

#[async_trait]
impl ActuatorClient for FakeActuatorClient {
    async fn beans(&self, source: &Source) -> FetchResult<BeansReport> {
        let delay = self.delay(source, EndpointKind::Beans);
        self.respond(source, "beans", delay, |s| s.beans.clone())
            .await
    }

    async fn health(&self, source: &Source) -> FetchResult<HealthReport> {
        let delay = self.delay(source, EndpointKind::Health);
        self.respond(source, "health", delay, |s| s.health.clone())
            .await
    }

    async fn config_props(&self, source: &Source) -> FetchResult<ConfigPropsReport> {
        let delay = self.delay(source, EndpointKind::ConfigProps);
        self.respond(source, "configprops", delay, |s| s.config_props.clone())
            .await
    }

    async fn metric_names(&self, source: &Source) -> FetchResult<MetricNames> {
        let delay = self.delay(source, EndpointKind::Metrics);
        self.respond(source, "metrics", delay, |s| s.metric_names.clone())
            .await
    }

    async fn metric(&self, source: &Source, name: &str) -> FetchResult<MetricDetail> {
        let delay = self
            .servers
            .get(source)
            .and_then(|s| s.metric_latency.get(name).copied());
        let path = format!("metrics/{}", name);
        self.respond(source, &path, delay, |s| {
            s.metrics.get(name).cloned().unwrap_or_else(|| {
                Err(FetchFailure::Status {
                    status: 404,
                    message: format!("metric '{}' not found", name),
                })
            })
        })
        .await
    }
}

// =============================================================================
// Sample payloads
// =============================================================================

pub fn sample_beans() -> BeansReport {
    let bean = BeanDescriptor {
        aliases: Vec::new(),
        scope: Some("singleton".to_string()),
        bean_type: Some("com.example.OrderService".to_string()),
        resource: None,
        dependencies: vec!["orderRepository".to_string()],
    };
    let context = BeansContext {
        beans: [("orderService".to_string(), bean)].into_iter().collect(),
        parent_id: None,
    };
    BeansReport {
        contexts: [("application".to_string(), context)].into_iter().collect(),
    }
}

pub fn sample_health(status: &str) -> HealthReport {
    let component = |status: &str| HealthComponent {
        status: status.to_string(),
        details: Some(serde_json::json!({ "validationQuery": "isValid()" })),
        components: BTreeMap::new(),
    };
    HealthReport {
        status: status.to_string(),
        components: [
            ("db".to_string(), component(status)),
            ("ping".to_string(), component("UP")),
        ]
        .into_iter()
        .collect(),
    }
}

pub fn sample_config_props() -> ConfigPropsReport {
    let bean = ConfigPropsBean {
        prefix: "server".to_string(),
        properties: serde_json::json!({ "port": 8080, "shutdown": "graceful" }),
        inputs: None,
    };
    let context = ConfigPropsContext {
        beans: [("server-ServerProperties".to_string(), bean)]
            .into_iter()
            .collect(),
        parent_id: None,
    };
    ConfigPropsReport {
        contexts: [("application".to_string(), context)].into_iter().collect(),
    }
}

pub fn sample_metric(name: &str, unit: &str, value: f64) -> MetricDetail {
    MetricDetail {
        name: name.to_string(),
        description: None,
        base_unit: Some(unit.to_string()),
        measurements: vec![Measurement {
            statistic: "VALUE".to_string(),
            value,
        }],
        available_tags: Vec::new(),
    }
}
