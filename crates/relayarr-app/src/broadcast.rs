//! GUI refresh on hosts that did not execute the library change.

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::outcome::SoftFailure;
use crate::registry::ProbedHost;

/// Directory that never exists; scanning it refreshes widgets without importing anything.
pub const REFRESH_DIRECTORY: &str = "/does_not_exist/";

/// Refresh every reachable host except `executor`, concurrently.
pub async fn refresh_secondaries(probed: &[ProbedHost<'_>], executor: &str) -> Vec<SoftFailure> {
    let targets: Vec<&ProbedHost<'_>> = probed
        .iter()
        .filter(|host| host.state.reachable && host.name() != executor)
        .collect();
    if targets.is_empty() {
        debug!("no secondary hosts to refresh");
        return Vec::new();
    }
    info!(hosts = targets.len(), "refreshing secondary host GUIs");

    let results = join_all(targets.iter().map(|host| async move {
        (host.name(), host.client().scan(Some(REFRESH_DIRECTORY)).await)
    }))
    .await;

    results
        .into_iter()
        .filter_map(|(host, result)| {
            let err = result.err()?;
            warn!(host = %host, error = %err, "gui refresh failed");
            Some(SoftFailure::BroadcastFailed {
                host: host.to_string(),
                detail: err.to_string(),
            })
        })
        .collect()
}
