//! Cross-source aggregation.
//!
//! A pure projection over a snapshot of member states: it reads one slot
//! per member and folds them into one `UIState`, never touching the stores.
//!
//! | member slots                          | result                          |
//! |---------------------------------------|---------------------------------|
//! | all `Loading` (or no members)         | `Loading`                       |
//! | at least one `Success`, rest `Success`| `Success`                       |
//! | at least one `Success`, some not      | `PartialSuccess` with warnings  |
//! | all `Error`                           | `Error` listing every source    |
//! | `Error` and `Loading`, no `Success`   | `Loading`                       |
//!
//! Merged entries are sorted by source label (the base URL) so rendering and
//! tests are reproducible whatever the member order.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::endpoint::EndpointKind;
use crate::models::{
    BeansContext, ConfigPropsContext, HealthReport, MetricDetail, NamedContext, STATUS_DOWN,
    STATUS_UP,
};
use crate::source::Source;
use crate::state::{GroupSnapshot, SourceState};
use crate::ui_state::UIState;

const STILL_LOADING: &str = "Still loading...";
const ERROR_BULLET: &str = "•";

/// One source's contribution to an aggregated view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry<T> {
    pub label: String,
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedBeans {
    pub endpoints: Vec<SourceEntry<Vec<NamedContext<BeansContext>>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceHealth {
    pub status: String,
    /// Component name to status
    pub components: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedHealth {
    /// `DOWN` if any contributing source is not `UP`
    pub status: String,
    pub endpoints: Vec<SourceEntry<SourceHealth>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedConfigProps {
    pub endpoints: Vec<SourceEntry<Vec<NamedContext<ConfigPropsContext>>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedMetrics {
    pub endpoints: Vec<SourceEntry<Vec<MetricDetail>>>,
}

/// Aggregated view of any endpoint kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "endpoint", rename_all = "snake_case")]
pub enum AggregatedResult {
    Beans(AggregatedBeans),
    Health(AggregatedHealth),
    ConfigProps(AggregatedConfigProps),
    Metrics(AggregatedMetrics),
}

/// Fold one slot per source into a single result.
///
/// `slots` is read in iteration order; that order is kept for warnings and
/// for the all-error message. `combine` receives the successful payloads
/// already sorted by source.
pub fn aggregate_slots<'a, T, A, I, F>(slots: I, combine: F) -> UIState<A>
where
    T: 'a,
    I: IntoIterator<Item = (&'a Source, &'a UIState<T>)>,
    F: FnOnce(Vec<(&'a Source, &'a T)>) -> A,
{
    let mut succeeded: Vec<(&Source, &T)> = Vec::new();
    let mut errored: Vec<(&Source, &str)> = Vec::new();
    let mut loading: Vec<&Source> = Vec::new();

    for (source, slot) in slots {
        match slot {
            UIState::Success { data } | UIState::PartialSuccess { data, .. } => {
                succeeded.push((source, data))
            }
            UIState::Error { message } => errored.push((source, message.as_str())),
            UIState::Loading => loading.push(source),
        }
    }

    if succeeded.is_empty() && errored.is_empty() {
        return UIState::Loading;
    }

    if !succeeded.is_empty() {
        succeeded.sort_by(|a, b| a.0.cmp(b.0));
        let data = combine(succeeded);

        let warnings: Vec<String> = errored
            .iter()
            .map(|(source, message)| format!("{} - {}", source, message))
            .chain(
                loading
                    .iter()
                    .map(|source| format!("{} - {}", source, STILL_LOADING)),
            )
            .collect();

        return if warnings.is_empty() {
            UIState::Success { data }
        } else {
            UIState::PartialSuccess { data, warnings }
        };
    }

    if loading.is_empty() {
        let message = errored
            .iter()
            .map(|(source, message)| format!("{} {}: {}", ERROR_BULLET, source, message))
            .collect::<Vec<_>>()
            .join("\n");
        return UIState::Error { message };
    }

    // Errors and loading but nothing succeeded yet: wait for the stragglers.
    UIState::Loading
}

// =============================================================================
// Endpoint combinators
// =============================================================================

fn entry<T>(source: &Source, data: T) -> SourceEntry<T> {
    SourceEntry {
        label: source.label(),
        data,
    }
}

pub fn aggregate_beans<'a>(
    members: impl IntoIterator<Item = (&'a Source, &'a SourceState)>,
) -> UIState<AggregatedBeans> {
    aggregate_slots(members.into_iter().map(|(s, st)| (s, &st.beans)), |ok| {
        AggregatedBeans {
            endpoints: ok
                .into_iter()
                .map(|(source, beans)| entry(source, beans.named_contexts()))
                .collect(),
        }
    })
}

pub fn aggregate_health<'a>(
    members: impl IntoIterator<Item = (&'a Source, &'a SourceState)>,
) -> UIState<AggregatedHealth> {
    aggregate_slots(
        members.into_iter().map(|(s, st)| (s, &st.health)),
        combine_health,
    )
}

fn combine_health(ok: Vec<(&Source, &HealthReport)>) -> AggregatedHealth {
    let all_up = ok.iter().all(|(_, health)| health.is_up());
    AggregatedHealth {
        status: if all_up { STATUS_UP } else { STATUS_DOWN }.to_string(),
        endpoints: ok
            .into_iter()
            .map(|(source, health)| {
                entry(
                    source,
                    SourceHealth {
                        status: health.status.clone(),
                        components: health.component_statuses(),
                    },
                )
            })
            .collect(),
    }
}

pub fn aggregate_config_props<'a>(
    members: impl IntoIterator<Item = (&'a Source, &'a SourceState)>,
) -> UIState<AggregatedConfigProps> {
    aggregate_slots(
        members.into_iter().map(|(s, st)| (s, &st.config_props)),
        |ok| AggregatedConfigProps {
            endpoints: ok
                .into_iter()
                .map(|(source, props)| entry(source, props.named_contexts()))
                .collect(),
        },
    )
}

pub fn aggregate_metrics<'a>(
    members: impl IntoIterator<Item = (&'a Source, &'a SourceState)>,
) -> UIState<AggregatedMetrics> {
    aggregate_slots(members.into_iter().map(|(s, st)| (s, &st.metrics)), |ok| {
        AggregatedMetrics {
            endpoints: ok
                .into_iter()
                .map(|(source, snapshot)| entry(source, snapshot.metrics.clone()))
                .collect(),
        }
    })
}

/// Aggregate one endpoint kind across every member of a group.
pub fn aggregate(group: &GroupSnapshot, endpoint: EndpointKind) -> UIState<AggregatedResult> {
    match endpoint {
        EndpointKind::Beans => aggregate_beans(group.members()).map(AggregatedResult::Beans),
        EndpointKind::Health => aggregate_health(group.members()).map(AggregatedResult::Health),
        EndpointKind::ConfigProps => {
            aggregate_config_props(group.members()).map(AggregatedResult::ConfigProps)
        }
        EndpointKind::Metrics => {
            aggregate_metrics(group.members()).map(AggregatedResult::Metrics)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthReport;
    use crate::source::SourceGroup;
    use crate::state::SlotUpdate;
    use crate::models::MetricsSnapshot;
    use crate::testing::{sample_beans, sample_config_props, sample_health, sample_metric};

    fn source(url: &str) -> Source {
        Source::parse(url).unwrap()
    }

    fn health_group(slots: Vec<(&str, UIState<HealthReport>)>) -> GroupSnapshot {
        let members: Vec<Source> = slots.iter().map(|(url, _)| source(url)).collect();
        let group = SourceGroup::new("g", members);
        let states = slots
            .into_iter()
            .map(|(url, slot)| {
                let mut state = SourceState::new();
                state.apply(SlotUpdate::Health(slot));
                (source(url), state)
            })
            .collect();
        GroupSnapshot { group, states }
    }

    /// Three members listed in reverse label order, each slot set by `update`.
    fn reversed_group(update: impl Fn(usize) -> SlotUpdate) -> GroupSnapshot {
        let urls = ["http://c:1", "http://b:1", "http://a:1"];
        let members: Vec<Source> = urls.iter().map(|url| source(url)).collect();
        let group = SourceGroup::new("g", members.clone());
        let states = members
            .into_iter()
            .enumerate()
            .map(|(i, member)| {
                let mut state = SourceState::new();
                state.apply(update(i));
                (member, state)
            })
            .collect();
        GroupSnapshot { group, states }
    }

    fn labels<T>(entries: &[SourceEntry<T>]) -> Vec<&str> {
        entries.iter().map(|e| e.label.as_str()).collect()
    }

    fn up() -> UIState<HealthReport> {
        UIState::success(sample_health("UP"))
    }

    fn down() -> UIState<HealthReport> {
        UIState::success(sample_health("DOWN"))
    }

    #[test]
    fn test_all_loading_is_loading() {
        let group = health_group(vec![
            ("http://a:1", UIState::Loading),
            ("http://b:1", UIState::Loading),
        ]);
        assert!(aggregate_health(group.members()).is_loading());
    }

    #[test]
    fn test_no_members_is_loading() {
        let group = health_group(vec![]);
        assert!(aggregate(&group, EndpointKind::Beans).is_loading());
    }

    #[test]
    fn test_all_error_lists_every_source_in_member_order() {
        let group = health_group(vec![
            ("http://b:1", UIState::error("Server error: 500")),
            ("http://a:1", UIState::error("Connection Error")),
        ]);
        let result = aggregate_health(group.members());
        assert_eq!(
            result.error_message(),
            Some("• http://b:1: Server error: 500\n• http://a:1: Connection Error")
        );
    }

    #[test]
    fn test_all_success_has_no_warnings() {
        let group = health_group(vec![("http://a:1", up()), ("http://b:1", up())]);
        let result = aggregate_health(group.members());
        assert!(result.is_success());
        assert_eq!(result.data().unwrap().status, "UP");
    }

    #[test]
    fn test_partial_success_lists_errors_before_loading() {
        let group = health_group(vec![
            ("http://c:1", UIState::Loading),
            ("http://a:1", up()),
            ("http://b:1", UIState::error("Server error: 503")),
        ]);
        let result = aggregate_health(group.members());
        match result {
            UIState::PartialSuccess { data, warnings } => {
                assert_eq!(data.endpoints.len(), 1);
                assert_eq!(
                    warnings,
                    vec![
                        "http://b:1 - Server error: 503".to_string(),
                        "http://c:1 - Still loading...".to_string(),
                    ]
                );
            }
            other => panic!("expected partial success, got {:?}", other),
        }
    }

    #[test]
    fn test_errors_and_loading_without_success_is_loading() {
        let group = health_group(vec![
            ("http://a:1", UIState::error("Server error: 500")),
            ("http://b:1", UIState::Loading),
        ]);
        assert!(aggregate_health(group.members()).is_loading());
    }

    #[test]
    fn test_entries_sorted_by_label() {
        let group = health_group(vec![
            ("http://c:1", up()),
            ("http://b:1", up()),
            ("http://a:1", up()),
        ]);
        let result = aggregate_health(group.members());
        let labels: Vec<&str> = result
            .data()
            .unwrap()
            .endpoints
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(labels, vec!["http://a:1", "http://b:1", "http://c:1"]);
    }

    #[test]
    fn test_health_rollup() {
        let cases = [
            (vec![up(), up()], "UP"),
            (vec![up(), down()], "DOWN"),
            (vec![down(), down()], "DOWN"),
        ];
        for (slots, expected) in cases {
            let urls = ["http://a:1", "http://b:1"];
            let group = health_group(urls.into_iter().zip(slots).collect());
            let result = aggregate_health(group.members());
            assert_eq!(result.data().unwrap().status, expected);
        }
    }

    #[test]
    fn test_health_components_drop_details() {
        let group = health_group(vec![("http://a:1", up())]);
        let result = aggregate_health(group.members());
        let components = &result.data().unwrap().endpoints[0].data.components;
        assert_eq!(components.get("db").map(String::as_str), Some("UP"));
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn test_beans_sorted_with_contexts() {
        let group = reversed_group(|_| SlotUpdate::Beans(UIState::success(sample_beans())));
        let result = aggregate_beans(group.members());
        assert!(result.is_success());

        let beans = result.data().unwrap();
        assert_eq!(
            labels(&beans.endpoints),
            vec!["http://a:1", "http://b:1", "http://c:1"]
        );
        for entry in &beans.endpoints {
            assert_eq!(entry.data.len(), 1);
            assert_eq!(entry.data[0].name, "application");
            assert!(entry.data[0].context.beans.contains_key("orderService"));
        }
    }

    #[test]
    fn test_config_props_sorted_with_contexts() {
        let group = reversed_group(|_| {
            SlotUpdate::ConfigProps(UIState::success(sample_config_props()))
        });
        let result = aggregate_config_props(group.members());
        assert!(result.is_success());

        let props = result.data().unwrap();
        assert_eq!(
            labels(&props.endpoints),
            vec!["http://a:1", "http://b:1", "http://c:1"]
        );
        for entry in &props.endpoints {
            assert_eq!(entry.data[0].name, "application");
            assert_eq!(
                entry.data[0].context.beans["server-ServerProperties"].prefix,
                "server"
            );
        }
    }

    #[test]
    fn test_metrics_sorted_and_carry_each_source_payload() {
        // c gets one metric, b two, a three.
        let group = reversed_group(|i| {
            let metrics = (0..=i)
                .map(|n| sample_metric(&format!("m{}", n), "count", n as f64))
                .collect();
            SlotUpdate::Metrics(UIState::success(MetricsSnapshot { metrics }))
        });
        let result = aggregate_metrics(group.members());
        assert!(result.is_success());

        let metrics = result.data().unwrap();
        assert_eq!(
            labels(&metrics.endpoints),
            vec!["http://a:1", "http://b:1", "http://c:1"]
        );
        let counts: Vec<usize> = metrics.endpoints.iter().map(|e| e.data.len()).collect();
        assert_eq!(counts, vec![3, 2, 1]);
    }

    #[test]
    fn test_metrics_partial_success_warns_about_failed_source() {
        let group = reversed_group(|i| match i {
            0 => SlotUpdate::Metrics(UIState::error("Server error: 500")),
            _ => SlotUpdate::Metrics(UIState::success(MetricsSnapshot::default())),
        });
        let result = aggregate_metrics(group.members());
        assert_eq!(result.data().unwrap().endpoints.len(), 2);
        assert_eq!(
            result.warnings().to_vec(),
            vec!["http://c:1 - Server error: 500".to_string()]
        );
    }

    #[test]
    fn test_aggregate_selects_endpoint() {
        let group = health_group(vec![("http://a:1", up())]);
        assert!(matches!(
            aggregate(&group, EndpointKind::Health),
            UIState::Success {
                data: AggregatedResult::Health(_)
            }
        ));
        // Beans were never written.
        assert!(aggregate(&group, EndpointKind::Beans).is_loading());
    }
}
