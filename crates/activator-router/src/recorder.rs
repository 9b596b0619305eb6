// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outcome Recorder: background persistence of routing and outcome records.
//!
//! Writes never block the response. A failed write is retried once after the
//! configured delay, then dropped with a warning.

use std::time::Duration;

use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use activator_core::{ActivatorError, OutcomeRecord, RoutingRecord};
use activator_memory::VectorStoreClient;
use activator_prometheus::record_storage_error;

/// Spawns persistence tasks and tracks them for draining at shutdown.
#[derive(Clone)]
pub struct OutcomeRecorder {
    vectors: VectorStoreClient,
    retry_delay: Duration,
    tracker: TaskTracker,
}

impl OutcomeRecorder {
    pub fn new(vectors: VectorStoreClient, retry_delay: Duration) -> Self {
        Self {
            vectors,
            retry_delay,
            tracker: TaskTracker::new(),
        }
    }

    /// Queue a routing record and its outcome for persistence.
    ///
    /// Safe to call from `Drop`; outside a runtime the write is dropped.
    pub fn submit(&self, routing: RoutingRecord, outcome: OutcomeRecord) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(query_id = %routing.query_id, "no runtime; routing record dropped");
            return;
        };
        let vectors = self.vectors.clone();
        let retry_delay = self.retry_delay;
        self.tracker.spawn_on(
            async move {
                if let Err((op, e)) = persist(&vectors, &routing, &outcome).await {
                    record_storage_error(op);
                    warn!(query_id = %routing.query_id, op, error = %e, "persisting outcome failed; retrying once");
                    tokio::time::sleep(retry_delay).await;
                    if let Err((op, e)) = persist(&vectors, &routing, &outcome).await {
                        record_storage_error(op);
                        warn!(query_id = %routing.query_id, op, error = %e, "outcome dropped after retry");
                    }
                }
            },
            &handle,
        );
    }

    /// Writes still in flight.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every queued write, including retries.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

async fn persist(
    vectors: &VectorStoreClient,
    routing: &RoutingRecord,
    outcome: &OutcomeRecord,
) -> Result<(), (&'static str, ActivatorError)> {
    vectors
        .store_routing(routing)
        .await
        .map_err(|e| ("insert_routing", e))?;
    let counted = vectors
        .store_outcome(outcome)
        .await
        .map_err(|e| ("insert_outcome", e))?;
    debug!(query_id = %routing.query_id, counted, "outcome persisted");
    Ok(())
}
