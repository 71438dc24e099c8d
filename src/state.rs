//! Per-source state and the stores that serialize writes to it.
//!
//! ## Write protocol
//!
//! Every write is one [`SlotUpdate`] applied to one [`SourceState`] while the
//! store's write lock is held: read current record, change one slot, leave
//! the other three untouched. No lock is ever held across a fetch, so
//! concurrent fetches for sibling slots can never lose each other's result.
//!
//! A write aimed at a source (or group) that has been removed is dropped and
//! reported as `false`; this is not an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

use crate::endpoint::EndpointKind;
use crate::models::{BeansReport, ConfigPropsReport, HealthReport, MetricsSnapshot};
use crate::source::{Source, SourceGroup};
use crate::ui_state::UIState;

/// The four independent slots of one source
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SourceState {
    pub beans: UIState<BeansReport>,
    pub health: UIState<HealthReport>,
    pub config_props: UIState<ConfigPropsReport>,
    pub metrics: UIState<MetricsSnapshot>,
    /// Time of the last terminal (success or error) write
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// One write to one slot
#[derive(Debug, Clone, PartialEq)]
pub enum SlotUpdate {
    /// Re-enter `Loading` unless the slot currently holds `Success`
    MarkLoading(EndpointKind),
    Beans(UIState<BeansReport>),
    Health(UIState<HealthReport>),
    ConfigProps(UIState<ConfigPropsReport>),
    Metrics(UIState<MetricsSnapshot>),
}

impl SourceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one update to exactly one slot.
    pub fn apply(&mut self, update: SlotUpdate) {
        match update {
            SlotUpdate::MarkLoading(kind) => self.mark_loading(kind),
            SlotUpdate::Beans(state) => {
                self.beans = state;
                self.touch();
            }
            SlotUpdate::Health(state) => {
                self.health = state;
                self.touch();
            }
            SlotUpdate::ConfigProps(state) => {
                self.config_props = state;
                self.touch();
            }
            SlotUpdate::Metrics(state) => {
                self.metrics = state;
                self.touch();
            }
        }
    }

    fn mark_loading(&mut self, kind: EndpointKind) {
        fn reset<T>(slot: &mut UIState<T>) {
            if !slot.is_success() {
                *slot = UIState::Loading;
            }
        }

        match kind {
            EndpointKind::Beans => reset(&mut self.beans),
            EndpointKind::Health => reset(&mut self.health),
            EndpointKind::ConfigProps => reset(&mut self.config_props),
            EndpointKind::Metrics => reset(&mut self.metrics),
        }
    }

    fn touch(&mut self) {
        self.refreshed_at = Some(Utc::now());
    }

    pub fn is_loading(&self, kind: EndpointKind) -> bool {
        match kind {
            EndpointKind::Beans => self.beans.is_loading(),
            EndpointKind::Health => self.health.is_loading(),
            EndpointKind::ConfigProps => self.config_props.is_loading(),
            EndpointKind::Metrics => self.metrics.is_loading(),
        }
    }

    /// True when no slot is `Loading`.
    pub fn is_settled(&self) -> bool {
        EndpointKind::ALL.iter().all(|kind| !self.is_loading(*kind))
    }
}

/// Destination for slot writes produced by the orchestrator.
#[async_trait]
pub trait SlotSink: Send + Sync {
    /// Atomically apply `update` to the record of `source`.
    ///
    /// Returns `false` when the record no longer exists.
    async fn apply(&self, source: &Source, update: SlotUpdate) -> bool;
}

/// Version counter bumped on every applied write
pub type StateWatcher = watch::Receiver<u64>;

// =============================================================================
// Standalone sources
// =============================================================================

/// State of every standalone source, behind one lock
pub struct SourceStore {
    sources: RwLock<HashMap<Source, SourceState>>,
    version: watch::Sender<u64>,
}

impl Default for SourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            sources: RwLock::new(HashMap::new()),
            version,
        }
    }

    /// Add a source with all four slots `Loading`. Returns `false` if present.
    pub async fn insert(&self, source: Source) -> bool {
        let inserted = {
            let mut sources = self.sources.write().await;
            if sources.contains_key(&source) {
                false
            } else {
                sources.insert(source, SourceState::new());
                true
            }
        };
        if inserted {
            self.bump();
        }
        inserted
    }

    pub async fn remove(&self, source: &Source) -> Option<SourceState> {
        let removed = self.sources.write().await.remove(source);
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    pub async fn contains(&self, source: &Source) -> bool {
        self.sources.read().await.contains_key(source)
    }

    pub async fn get(&self, source: &Source) -> Option<SourceState> {
        self.sources.read().await.get(source).cloned()
    }

    /// All sources sorted by base URL.
    pub async fn sources(&self) -> Vec<Source> {
        let mut sources: Vec<Source> = self.sources.read().await.keys().cloned().collect();
        sources.sort();
        sources
    }

    pub async fn snapshot(&self) -> HashMap<Source, SourceState> {
        self.sources.read().await.clone()
    }

    pub fn subscribe(&self) -> StateWatcher {
        self.version.subscribe()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

#[async_trait]
impl SlotSink for SourceStore {
    async fn apply(&self, source: &Source, update: SlotUpdate) -> bool {
        let applied = {
            let mut sources = self.sources.write().await;
            match sources.get_mut(source) {
                Some(state) => {
                    state.apply(update);
                    true
                }
                None => false,
            }
        };
        if applied {
            self.bump();
        }
        applied
    }
}

// =============================================================================
// Groups
// =============================================================================

/// A group and the state of each of its members
#[derive(Debug, Clone)]
pub struct GroupSnapshot {
    pub group: SourceGroup,
    pub states: HashMap<Source, SourceState>,
}

impl GroupSnapshot {
    /// Members and their states in the group's member order.
    pub fn members(&self) -> impl Iterator<Item = (&Source, &SourceState)> {
        self.group
            .members()
            .iter()
            .filter_map(|source| self.states.get(source).map(|state| (source, state)))
    }
}

/// State of every group, behind one lock
pub struct GroupStore {
    groups: RwLock<HashMap<Uuid, GroupSnapshot>>,
    version: watch::Sender<u64>,
}

impl Default for GroupStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0);
        Self {
            groups: RwLock::new(HashMap::new()),
            version,
        }
    }

    /// Register a group with fresh `Loading` state for every member.
    pub async fn insert(&self, group: SourceGroup) {
        let states = group
            .members()
            .iter()
            .map(|source| (source.clone(), SourceState::new()))
            .collect();
        self.groups
            .write()
            .await
            .insert(group.id(), GroupSnapshot { group, states });
        self.bump();
    }

    /// Replace a group's name and membership, carrying prior member state
    /// forward by base URL. Members without prior state start `Loading`.
    ///
    /// Returns `false` if the group does not exist.
    pub async fn edit(&self, edited: SourceGroup) -> bool {
        let replaced = {
            let mut groups = self.groups.write().await;
            match groups.get_mut(&edited.id()) {
                Some(entry) => {
                    let states = rekey_states(&entry.states, &edited);
                    entry.group = edited;
                    entry.states = states;
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.bump();
        }
        replaced
    }

    pub async fn remove(&self, id: Uuid) -> Option<GroupSnapshot> {
        let removed = self.groups.write().await.remove(&id);
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    pub async fn get(&self, id: Uuid) -> Option<GroupSnapshot> {
        self.groups.read().await.get(&id).cloned()
    }

    pub async fn group(&self, id: Uuid) -> Option<SourceGroup> {
        self.groups.read().await.get(&id).map(|g| g.group.clone())
    }

    /// All groups sorted by name.
    pub async fn groups(&self) -> Vec<SourceGroup> {
        let mut groups: Vec<SourceGroup> = self
            .groups
            .read()
            .await
            .values()
            .map(|g| g.group.clone())
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }

    pub async fn apply(&self, group: Uuid, source: &Source, update: SlotUpdate) -> bool {
        let applied = {
            let mut groups = self.groups.write().await;
            match groups
                .get_mut(&group)
                .and_then(|entry| entry.states.get_mut(source))
            {
                Some(state) => {
                    state.apply(update);
                    true
                }
                None => false,
            }
        };
        if applied {
            self.bump();
        }
        applied
    }

    /// Slot sink writing into one group's member states.
    pub fn sink(self: &Arc<Self>, group: Uuid) -> GroupSink {
        GroupSink {
            store: Arc::clone(self),
            group,
        }
    }

    pub fn subscribe(&self) -> StateWatcher {
        self.version.subscribe()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

/// Carry state forward into `edited` by matching base URLs.
///
/// The previous states are scanned in full for every new member, so if more
/// than one previous entry matched, the last one scanned would win. With URL
/// identity as the map key at most one can match.
fn rekey_states(
    previous: &HashMap<Source, SourceState>,
    edited: &SourceGroup,
) -> HashMap<Source, SourceState> {
    edited
        .members()
        .iter()
        .map(|member| {
            let carried = previous
                .iter()
                .filter(|(old, _)| old.base_url() == member.base_url())
                .last()
                .map(|(_, state)| state.clone())
                .unwrap_or_default();
            (member.clone(), carried)
        })
        .collect()
}

/// [`SlotSink`] bound to one group
#[derive(Clone)]
pub struct GroupSink {
    store: Arc<GroupStore>,
    group: Uuid,
}

#[async_trait]
impl SlotSink for GroupSink {
    async fn apply(&self, source: &Source, update: SlotUpdate) -> bool {
        self.store.apply(self.group, source, update).await
    }
}
