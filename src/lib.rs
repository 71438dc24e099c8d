//! Bootwatch - live multi-server view of Spring Boot actuator endpoints
//!
//! Polls the bean graph, health, configuration properties and metrics of
//! any number of servers and folds the per-server results into one
//! aggregated view per group, reporting exactly which servers failed and why.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Presentation layer (reads snapshots, calls refresh/aggregate)  │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Monitor                                  │
//! │        refresh_one / refresh_group / aggregate / CRUD           │
//! └─────────────────────────────────────────────────────────────────┘
//!              │                                   │
//!              ▼                                   ▼
//! ┌──────────────────────────┐        ┌──────────────────────────────┐
//! │      Orchestrator        │ writes │  SourceStore / GroupStore    │
//! │ 4 endpoints per source,  │ ─────► │  one lock per collection,    │
//! │ all sources concurrently │        │  one slot per write          │
//! └──────────────────────────┘        └──────────────────────────────┘
//!              │                                   │ snapshot
//!              ▼                                   ▼
//! ┌──────────────────────────┐        ┌──────────────────────────────┐
//! │     ActuatorClient       │        │  Aggregator (pure)           │
//! │   (HTTP, or a fake)      │        │  Success / Partial / Error   │
//! └──────────────────────────┘        └──────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use bootwatch::{EndpointKind, HttpActuatorClient, Monitor};
//!
//! let monitor = Monitor::new(Arc::new(HttpActuatorClient::new()?));
//! let group = monitor
//!     .create_group("payments", &["http://pay-1:8080/actuator", "http://pay-2:8080/actuator"])
//!     .await?;
//! monitor.refresh_group(group.id()).await?;
//! let health = monitor.aggregate(group.id(), EndpointKind::Health).await?;
//! ```

pub mod aggregate;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod flatten;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod orchestrator;
pub mod poller;
pub mod source;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod ui_state;

// Re-export main types
pub use aggregate::{aggregate, AggregatedResult};
pub use client::{ActuatorClient, HttpActuatorClient};
pub use config::MonitorConfig;
pub use endpoint::EndpointKind;
pub use error::{
    classify, classify_message, ConfigError, FetchErrorKind, FetchFailure, MonitorError,
};
pub use flatten::{flatten, flatten_config_props};
pub use monitor::Monitor;
pub use orchestrator::{refresh_group, refresh_group_member, refresh_source, RefreshSummary};
pub use poller::{refresh_round, run_refresh_loop};
pub use source::{Source, SourceGroup};
pub use state::{GroupSnapshot, GroupStore, SlotSink, SlotUpdate, SourceState, SourceStore};
pub use ui_state::UIState;
