//! Monitor - the facade a presentation layer talks to.
//!
//! Owns the raw-fetch client and both state stores. All methods take
//! `&self` and the struct is cheap to clone, so a UI can hand copies to
//! spawned tasks and keep reading snapshots while refreshes are in flight.
//!
//! Refresh calls are independent: invoking them repeatedly or concurrently
//! is allowed and nothing is deduplicated here.

use std::sync::Arc;
use uuid::Uuid;

use crate::aggregate::{aggregate, AggregatedResult};
use crate::client::ActuatorClient;
use crate::endpoint::EndpointKind;
use crate::error::MonitorError;
use crate::orchestrator::{self, RefreshSummary};
use crate::source::{Source, SourceGroup};
use crate::state::{GroupSnapshot, GroupStore, SourceState, SourceStore, StateWatcher};
use crate::ui_state::UIState;

#[derive(Clone)]
pub struct Monitor {
    client: Arc<dyn ActuatorClient>,
    sources: Arc<SourceStore>,
    groups: Arc<GroupStore>,
    mark_loading: bool,
}

impl Monitor {
    pub fn new(client: Arc<dyn ActuatorClient>) -> Self {
        Self {
            client,
            sources: Arc::new(SourceStore::new()),
            groups: Arc::new(GroupStore::new()),
            mark_loading: false,
        }
    }

    /// Reset non-successful slots to `Loading` before each refresh.
    pub fn with_mark_loading(mut self, mark_loading: bool) -> Self {
        self.mark_loading = mark_loading;
        self
    }

    // ── Standalone sources ─────────────────────────────────────

    /// Register a standalone source with all slots `Loading`.
    pub async fn add_source(&self, url: &str) -> Result<Source, MonitorError> {
        let source = Source::parse(url)?;

        for existing in self.sources.sources().await {
            if existing != source && existing.shares_host_port(&source) {
                tracing::warn!(
                    source = %source,
                    existing = %existing,
                    "source shares host and port with an existing source"
                );
            }
        }

        if !self.sources.insert(source.clone()).await {
            return Err(MonitorError::DuplicateSource(source.label()));
        }
        tracing::info!(source = %source, "source added");
        Ok(source)
    }

    /// Remove a source. In-flight writes for it become no-ops.
    pub async fn remove_source(&self, source: &Source) -> Result<(), MonitorError> {
        self.sources
            .remove(source)
            .await
            .map(|_| tracing::info!(source = %source, "source removed"))
            .ok_or_else(|| MonitorError::SourceNotFound(source.label()))
    }

    pub async fn sources(&self) -> Vec<Source> {
        self.sources.sources().await
    }

    pub async fn source_state(&self, source: &Source) -> Option<SourceState> {
        self.sources.get(source).await
    }

    /// Refresh all four endpoints of one standalone source.
    pub async fn refresh_one(&self, source: &Source) -> Result<RefreshSummary, MonitorError> {
        if !self.sources.contains(source).await {
            return Err(MonitorError::SourceNotFound(source.label()));
        }
        Ok(orchestrator::refresh_source(
            self.client.as_ref(),
            self.sources.as_ref(),
            source,
            self.mark_loading,
        )
        .await)
    }

    /// Refresh every standalone source concurrently.
    pub async fn refresh_sources(&self) -> Vec<RefreshSummary> {
        let sources = self.sources.sources().await;
        futures::future::join_all(sources.iter().map(|source| {
            orchestrator::refresh_source(
                self.client.as_ref(),
                self.sources.as_ref(),
                source,
                self.mark_loading,
            )
        }))
        .await
    }

    // ── Groups ─────────────────────────────────────────────────

    pub async fn create_group<S: AsRef<str>>(
        &self,
        name: &str,
        members: &[S],
    ) -> Result<SourceGroup, MonitorError> {
        let group = SourceGroup::new(name, parse_members(members)?);
        self.groups.insert(group.clone()).await;
        tracing::info!(
            group = %group.id(),
            name = %group.name,
            members = group.members().len(),
            "group created"
        );
        Ok(group)
    }

    /// Rename a group and/or change its members, keeping its id. State of
    /// members that stay (matched by base URL) carries over.
    pub async fn edit_group<S: AsRef<str>>(
        &self,
        id: Uuid,
        name: &str,
        members: &[S],
    ) -> Result<SourceGroup, MonitorError> {
        let current = self
            .groups
            .group(id)
            .await
            .ok_or(MonitorError::GroupNotFound(id))?;
        let edited = current.edited(name, parse_members(members)?);
        if !self.groups.edit(edited.clone()).await {
            return Err(MonitorError::GroupNotFound(id));
        }
        tracing::info!(
            group = %id,
            name = %edited.name,
            members = edited.members().len(),
            "group edited"
        );
        Ok(edited)
    }

    pub async fn delete_group(&self, id: Uuid) -> Result<(), MonitorError> {
        self.groups
            .remove(id)
            .await
            .map(|_| tracing::info!(group = %id, "group deleted"))
            .ok_or(MonitorError::GroupNotFound(id))
    }

    pub async fn groups(&self) -> Vec<SourceGroup> {
        self.groups.groups().await
    }

    pub async fn group(&self, id: Uuid) -> Option<GroupSnapshot> {
        self.groups.get(id).await
    }

    pub async fn refresh_group(&self, id: Uuid) -> Result<Vec<RefreshSummary>, MonitorError> {
        orchestrator::refresh_group(self.client.as_ref(), &self.groups, id, self.mark_loading)
            .await
            .ok_or(MonitorError::GroupNotFound(id))
    }

    pub async fn refresh_group_member(
        &self,
        id: Uuid,
        source: &Source,
    ) -> Result<RefreshSummary, MonitorError> {
        let group = self
            .groups
            .group(id)
            .await
            .ok_or(MonitorError::GroupNotFound(id))?;
        if !group.contains(source) {
            return Err(MonitorError::NotAMember {
                group: id,
                source_url: source.label(),
            });
        }
        orchestrator::refresh_group_member(
            self.client.as_ref(),
            &self.groups,
            id,
            source,
            self.mark_loading,
        )
        .await
        .ok_or(MonitorError::GroupNotFound(id))
    }

    /// Aggregate one endpoint kind over the group's current snapshot.
    pub async fn aggregate(
        &self,
        id: Uuid,
        endpoint: EndpointKind,
    ) -> Result<UIState<AggregatedResult>, MonitorError> {
        let snapshot = self
            .groups
            .get(id)
            .await
            .ok_or(MonitorError::GroupNotFound(id))?;
        Ok(aggregate(&snapshot, endpoint))
    }

    // ── Change notification ────────────────────────────────────

    pub fn subscribe_sources(&self) -> StateWatcher {
        self.sources.subscribe()
    }

    pub fn subscribe_groups(&self) -> StateWatcher {
        self.groups.subscribe()
    }
}

fn parse_members<S: AsRef<str>>(members: &[S]) -> Result<Vec<Source>, MonitorError> {
    members
        .iter()
        .map(|url| Source::parse(url.as_ref()).map_err(MonitorError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeActuatorClient, FakeServer};

    const A: &str = "http://a:8080/actuator";
    const B: &str = "http://b:8080/actuator";

    fn monitor() -> Monitor {
        let client = FakeActuatorClient::new()
            .with_server(Source::parse(A).unwrap(), FakeServer::healthy())
            .with_server(Source::parse(B).unwrap(), FakeServer::with_status("DOWN"));
        Monitor::new(Arc::new(client))
    }

    #[tokio::test]
    async fn test_add_refresh_remove_source() {
        let monitor = monitor();
        let a = monitor.add_source(A).await.unwrap();
        assert_eq!(
            monitor.add_source("http://a:8080/actuator/").await,
            Err(MonitorError::DuplicateSource(A.to_string()))
        );

        assert!(monitor.source_state(&a).await.unwrap().health.is_loading());
        let summary = monitor.refresh_one(&a).await.unwrap();
        assert_eq!(summary.succeeded(), 4);
        assert!(monitor.source_state(&a).await.unwrap().is_settled());

        monitor.remove_source(&a).await.unwrap();
        assert!(matches!(
            monitor.refresh_one(&a).await,
            Err(MonitorError::SourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_group_lifecycle() {
        let monitor = monitor();
        let group = monitor.create_group("shop", &[A, B]).await.unwrap();

        monitor.refresh_group(group.id()).await.unwrap();
        let health = monitor
            .aggregate(group.id(), EndpointKind::Health)
            .await
            .unwrap();
        match health {
            UIState::Success {
                data: AggregatedResult::Health(h),
            } => assert_eq!(h.status, "DOWN"),
            other => panic!("unexpected {:?}", other),
        }

        let edited = monitor
            .edit_group(group.id(), "shop-eu", &[A])
            .await
            .unwrap();
        assert_eq!(edited.id(), group.id());
        let snapshot = monitor.group(group.id()).await.unwrap();
        assert!(snapshot.states[&Source::parse(A).unwrap()].is_settled());

        monitor.delete_group(group.id()).await.unwrap();
        assert_eq!(
            monitor.refresh_group(group.id()).await,
            Err(MonitorError::GroupNotFound(group.id()))
        );
    }

    #[tokio::test]
    async fn test_refresh_group_member_requires_membership() {
        let monitor = monitor();
        let group = monitor.create_group("shop", &[A]).await.unwrap();
        let b = Source::parse(B).unwrap();
        assert!(matches!(
            monitor.refresh_group_member(group.id(), &b).await,
            Err(MonitorError::NotAMember { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_member_url() {
        let monitor = monitor();
        assert!(matches!(
            monitor.create_group("bad", &["ftp://x"]).await,
            Err(MonitorError::InvalidUrl(_))
        ));
    }
}
