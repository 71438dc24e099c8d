//! Per-source and group fetch orchestration.
//!
//! ```text
//! refresh_group ──┬── refresh_source(A) ──┬── beans        ─► slot write
//!                 │                       ├── health       ─► slot write
//!                 │                       ├── config_props ─► slot write
//!                 │                       └── metrics (names ─► details*) ─► slot write
//!                 └── refresh_source(B) ── ...
//! ```
//!
//! Each endpoint future owns its slot: it optionally marks the slot
//! `Loading`, awaits its fetch, then writes `Success` or a classified
//! `Error` through the [`SlotSink`]. The four futures of one source, and the
//! sources of one group, complete independently and in any order.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

use crate::client::{ActuatorClient, FetchResult};
use crate::endpoint::EndpointKind;
use crate::error::classify_message;
use crate::metrics::fetch_metrics;
use crate::source::Source;
use crate::state::{GroupStore, SlotSink, SlotUpdate};
use crate::ui_state::UIState;

/// Outcome of one endpoint fetch within a refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointOutcome {
    pub endpoint: EndpointKind,
    pub succeeded: bool,
    /// False when the target record was gone at write time
    pub applied: bool,
}

/// Outcome of refreshing one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSummary {
    pub source: Source,
    pub endpoints: Vec<EndpointOutcome>,
}

impl RefreshSummary {
    pub fn succeeded(&self) -> usize {
        self.endpoints.iter().filter(|e| e.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.endpoints.iter().filter(|e| !e.succeeded).count()
    }

    /// True when every result was dropped because the source was removed.
    pub fn discarded(&self) -> bool {
        self.endpoints.iter().all(|e| !e.applied)
    }
}

/// Fetch all four endpoints of `source` concurrently and write each result
/// into its own slot as it completes.
///
/// With `mark_loading`, each slot that is not currently `Success` is reset to
/// `Loading` before its fetch is issued.
#[tracing::instrument(level = "debug", skip(client, sink, source), fields(source = %source))]
pub async fn refresh_source<C, S>(
    client: &C,
    sink: &S,
    source: &Source,
    mark_loading: bool,
) -> RefreshSummary
where
    C: ActuatorClient + ?Sized,
    S: SlotSink + ?Sized,
{
    let (beans, health, config_props, metrics) = tokio::join!(
        run_endpoint(
            sink,
            source,
            EndpointKind::Beans,
            mark_loading,
            client.beans(source),
            SlotUpdate::Beans,
        ),
        run_endpoint(
            sink,
            source,
            EndpointKind::Health,
            mark_loading,
            client.health(source),
            SlotUpdate::Health,
        ),
        run_endpoint(
            sink,
            source,
            EndpointKind::ConfigProps,
            mark_loading,
            client.config_props(source),
            SlotUpdate::ConfigProps,
        ),
        run_endpoint(
            sink,
            source,
            EndpointKind::Metrics,
            mark_loading,
            fetch_metrics(client, source),
            SlotUpdate::Metrics,
        ),
    );

    RefreshSummary {
        source: source.clone(),
        endpoints: vec![beans, health, config_props, metrics],
    }
}

async fn run_endpoint<S, T, F>(
    sink: &S,
    source: &Source,
    endpoint: EndpointKind,
    mark_loading: bool,
    fetch: F,
    into_update: fn(UIState<T>) -> SlotUpdate,
) -> EndpointOutcome
where
    S: SlotSink + ?Sized,
    F: Future<Output = FetchResult<T>>,
{
    if mark_loading {
        sink.apply(source, SlotUpdate::MarkLoading(endpoint)).await;
    }

    let state = match fetch.await {
        Ok(data) => UIState::success(data),
        Err(failure) => {
            tracing::debug!(
                source = %source,
                endpoint = %endpoint,
                error = %failure,
                "fetch failed"
            );
            UIState::error(classify_message(&failure, endpoint))
        }
    };
    let succeeded = state.is_success();

    let applied = sink.apply(source, into_update(state)).await;
    if !applied {
        tracing::debug!(source = %source, endpoint = %endpoint, "source removed, result discarded");
    }

    EndpointOutcome {
        endpoint,
        succeeded,
        applied,
    }
}

/// Refresh every member of a group concurrently.
///
/// Membership is read once at the start; members removed by a concurrent
/// edit simply have their writes dropped. Returns `None` for an unknown group.
#[tracing::instrument(level = "debug", skip(client, store))]
pub async fn refresh_group<C>(
    client: &C,
    store: &Arc<GroupStore>,
    group: Uuid,
    mark_loading: bool,
) -> Option<Vec<RefreshSummary>>
where
    C: ActuatorClient + ?Sized,
{
    let members = store.group(group).await?.members().to_vec();
    let sink = store.sink(group);

    let summaries = join_all(
        members
            .iter()
            .map(|member| refresh_source(client, &sink, member, mark_loading)),
    )
    .await;

    Some(summaries)
}

/// Refresh a single member of a group. Returns `None` if the group is unknown
/// or `source` is not one of its members.
pub async fn refresh_group_member<C>(
    client: &C,
    store: &Arc<GroupStore>,
    group: Uuid,
    source: &Source,
    mark_loading: bool,
) -> Option<RefreshSummary>
where
    C: ActuatorClient + ?Sized,
{
    if !store.group(group).await?.contains(source) {
        return None;
    }
    let sink = store.sink(group);
    Some(refresh_source(client, &sink, source, mark_loading).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchFailure;
    use crate::source::SourceGroup;
    use crate::state::SourceStore;
    use crate::testing::{FakeActuatorClient, FakeServer};
    use std::time::Duration;

    fn source(url: &str) -> Source {
        Source::parse(url).unwrap()
    }

    #[tokio::test]
    async fn test_health_failure_leaves_other_slots_successful() {
        let a = source("http://a:8080/actuator");
        let client = FakeActuatorClient::new().with_server(
            a.clone(),
            FakeServer::healthy().with_health(Err(FetchFailure::Status {
                status: 404,
                message: String::new(),
            })),
        );
        let store = SourceStore::new();
        store.insert(a.clone()).await;

        let summary = refresh_source(&client, &store, &a, false).await;
        assert_eq!(summary.succeeded(), 3);
        assert_eq!(summary.failed(), 1);

        let state = store.get(&a).await.unwrap();
        assert!(state.beans.is_success());
        assert!(state.config_props.is_success());
        assert!(state.metrics.is_success());
        let message = state.health.error_message().unwrap();
        assert!(message.contains("404"));
        assert!(message.contains("Health"));
        assert!(state.is_settled());
    }

    #[tokio::test]
    async fn test_beans_and_config_props_failures_are_classified_per_slot() {
        let a = source("http://a:8080/actuator");
        let client = FakeActuatorClient::new().with_server(
            a.clone(),
            FakeServer::healthy()
                .with_beans(Err(FetchFailure::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                }))
                .with_config_props(Err(FetchFailure::Transport("connection reset".to_string()))),
        );
        let store = SourceStore::new();
        store.insert(a.clone()).await;

        let summary = refresh_source(&client, &store, &a, false).await;
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 2);

        let state = store.get(&a).await.unwrap();
        assert_eq!(state.beans.error_message(), Some("Server error: 503"));
        assert!(state
            .config_props
            .error_message()
            .unwrap()
            .starts_with("Connection Error"));
        assert!(state.health.is_success());
        assert!(state.metrics.is_success());
    }

    #[tokio::test]
    async fn test_source_removed_mid_flight_discards_results() {
        let a = source("http://a:8080/actuator");
        let server = EndpointKind::ALL
            .iter()
            .fold(FakeServer::healthy(), |server, &kind| {
                server.with_latency(kind, Duration::from_millis(50))
            });
        let client = FakeActuatorClient::new().with_server(a.clone(), server);
        let store = Arc::new(SourceStore::new());
        store.insert(a.clone()).await;

        let refresh = {
            let store = Arc::clone(&store);
            let a = a.clone();
            tokio::spawn(async move { refresh_source(&client, store.as_ref(), &a, true).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.remove(&a).await;

        let summary = refresh.await.unwrap();
        let health = summary
            .endpoints
            .iter()
            .find(|e| e.endpoint == EndpointKind::Health)
            .unwrap();
        assert!(!health.applied);
        assert!(summary.discarded());
        assert!(store.get(&a).await.is_none());
    }

    #[tokio::test]
    async fn test_mark_loading_does_not_flash_away_success() {
        let a = source("http://a:8080/actuator");
        let client = FakeActuatorClient::new().with_server(
            a.clone(),
            FakeServer::healthy().with_latency(EndpointKind::Health, Duration::from_millis(40)),
        );
        let store = Arc::new(SourceStore::new());
        store.insert(a.clone()).await;
        refresh_source(&client, store.as_ref(), &a, false).await;

        let client = Arc::new(client);
        let refresh = {
            let (client, store, a) = (Arc::clone(&client), Arc::clone(&store), a.clone());
            tokio::spawn(
                async move { refresh_source(client.as_ref(), store.as_ref(), &a, true).await },
            )
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(store.get(&a).await.unwrap().health.is_success());
        refresh.await.unwrap();
    }

    #[tokio::test]
    async fn test_refresh_group_is_independent_per_member() {
        let a = source("http://a:8080/actuator");
        let b = source("http://b:8080/actuator");
        let client = FakeActuatorClient::new().with_server(a.clone(), FakeServer::healthy());
        let store = Arc::new(GroupStore::new());
        let group = SourceGroup::new("g", vec![a.clone(), b.clone()]);
        let id = group.id();
        store.insert(group).await;

        let summaries = refresh_group(&client, &store, id, false).await.unwrap();
        assert_eq!(summaries.len(), 2);

        let snapshot = store.get(id).await.unwrap();
        assert!(snapshot.states[&a].health.is_success());
        assert_eq!(
            snapshot.states[&b].health.error_message(),
            Some("Connection Error. Check your network and refresh the connection!")
        );
    }

    #[tokio::test]
    async fn test_refresh_group_member_rejects_non_member() {
        let a = source("http://a:8080/actuator");
        let client = FakeActuatorClient::new().with_server(a.clone(), FakeServer::healthy());
        let store = Arc::new(GroupStore::new());
        let group = SourceGroup::new("g", vec![a.clone()]);
        let id = group.id();
        store.insert(group).await;

        let outsider = source("http://z:8080/actuator");
        assert!(refresh_group_member(&client, &store, id, &outsider, false)
            .await
            .is_none());
        assert!(refresh_group_member(&client, &store, id, &a, false)
            .await
            .is_some());
        assert!(refresh_group(&client, &store, Uuid::new_v4(), false)
            .await
            .is_none());
    }
}
