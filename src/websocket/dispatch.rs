use serde::Serialize;

use super::registry::{ConnectionId, ConnectionRegistry};
use crate::metrics;

/// Outcome of one fan-out pass over the registry.
///
/// `failed` covers both writes that errored and connections skipped because
/// they already reported closed; every failure is pruned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Delivers one payload to every connection in the registry snapshot.
///
/// Per-connection failures are contained: a dead connection is counted,
/// deregistered, and the pass moves on. The caller never sees an error for
/// an individual connection.
#[derive(Clone)]
pub struct BroadcastDispatcher {
    registry: ConnectionRegistry,
}

impl BroadcastDispatcher {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self { registry }
    }

    pub async fn broadcast(&self, payload: &str) -> BroadcastReport {
        let snapshot = self.registry.snapshot().await;
        let mut report = BroadcastReport {
            attempted: snapshot.len(),
            ..BroadcastReport::default()
        };
        let mut dead: Vec<ConnectionId> = Vec::new();

        for conn in &snapshot {
            if !conn.is_open() {
                report.failed += 1;
                dead.push(conn.id());
                continue;
            }

            match conn.send(payload.to_owned()) {
                Ok(()) => report.delivered += 1,
                Err(_) => {
                    report.failed += 1;
                    dead.push(conn.id());
                }
            }
        }

        for id in dead {
            self.registry.deregister(id).await;
        }

        if report.failed > 0 {
            tracing::debug!(
                "broadcast pruned {} dead connections, {} delivered",
                report.failed,
                report.delivered
            );
        }
        metrics::observe_broadcast(report.delivered as u64, report.failed as u64);

        report
    }
}
