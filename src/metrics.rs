//! Two-phase metrics fetch for one source.
//!
//! Phase 1 fetches the metric names; phase 2 fetches every detail
//! concurrently and only starts once phase 1 has returned. Any failure fails
//! the whole fetch: a single source never reports a partial metric list.

use futures::future::try_join_all;

use crate::client::{ActuatorClient, FetchResult};
use crate::models::MetricsSnapshot;
use crate::source::Source;

pub async fn fetch_metrics<C>(client: &C, source: &Source) -> FetchResult<MetricsSnapshot>
where
    C: ActuatorClient + ?Sized,
{
    let names = client.metric_names(source).await?.names;
    tracing::debug!(source = %source, count = names.len(), "fetching metric details");

    // try_join_all yields results in request order, so the combined list is
    // stable for a given name list whatever the completion order.
    let metrics = try_join_all(names.iter().map(|name| client.metric(source, name))).await?;

    Ok(MetricsSnapshot { metrics })
}
