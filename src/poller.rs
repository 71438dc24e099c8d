//! Background polling.
//!
//! Each round refreshes every standalone source and every group
//! concurrently, then logs one aggregated health line per group. Rounds
//! never overlap: a slow round delays the next tick instead of stacking.

use futures::future::join_all;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

use crate::aggregate::AggregatedResult;
use crate::endpoint::EndpointKind;
use crate::monitor::Monitor;
use crate::orchestrator::RefreshSummary;
use crate::ui_state::UIState;

/// Counts from one polling round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub sources: usize,
    pub endpoints_ok: usize,
    pub endpoints_failed: usize,
    /// Sources removed while their refresh was in flight
    pub discarded: usize,
}

impl RoundSummary {
    fn add(&mut self, summaries: &[RefreshSummary]) {
        for summary in summaries {
            self.sources += 1;
            self.endpoints_ok += summary.succeeded();
            self.endpoints_failed += summary.failed();
            if summary.discarded() {
                self.discarded += 1;
            }
        }
    }
}

/// Refresh everything once.
pub async fn refresh_round(monitor: &Monitor) -> RoundSummary {
    let groups = monitor.groups().await;

    let (standalone, grouped) = tokio::join!(
        monitor.refresh_sources(),
        join_all(groups.iter().map(|group| monitor.refresh_group(group.id())))
    );

    let mut round = RoundSummary::default();
    round.add(&standalone);
    for (group, result) in groups.iter().zip(grouped) {
        match result {
            Ok(summaries) => round.add(&summaries),
            // Deleted while the round was running.
            Err(e) => tracing::debug!(group = %group.id(), error = %e, "group skipped"),
        }
    }

    for group in &groups {
        log_group_health(monitor, group.id(), &group.name).await;
    }

    tracing::info!(
        sources = round.sources,
        ok = round.endpoints_ok,
        failed = round.endpoints_failed,
        discarded = round.discarded,
        "refresh round complete"
    );
    round
}

async fn log_group_health(monitor: &Monitor, id: uuid::Uuid, name: &str) {
    let Ok(health) = monitor.aggregate(id, EndpointKind::Health).await else {
        return;
    };
    match health {
        UIState::Loading => tracing::info!(group = %name, "health: loading"),
        UIState::Success { data } => {
            tracing::info!(group = %name, status = ?status_of(&data), "health")
        }
        UIState::PartialSuccess { data, warnings } => {
            tracing::warn!(
                group = %name,
                status = ?status_of(&data),
                degraded = warnings.len(),
                "health (partial)"
            );
            for warning in warnings {
                tracing::warn!(group = %name, "{}", warning);
            }
        }
        UIState::Error { message } => {
            tracing::error!(group = %name, "health unavailable:\n{}", message)
        }
    }
}

fn status_of(result: &AggregatedResult) -> Option<&str> {
    match result {
        AggregatedResult::Health(health) => Some(health.status.as_str()),
        _ => None,
    }
}

/// Poll forever at `interval`.
pub async fn run_refresh_loop(monitor: Monitor, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(interval_secs = interval.as_secs(), "starting refresh loop");
    loop {
        ticker.tick().await;
        refresh_round(&monitor).await;
    }
}
