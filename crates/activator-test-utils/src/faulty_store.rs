// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing store wrapper with injectable storage failures.
//!
//! Also logs every search and every write that reached the inner store, so
//! tests can assert on what was persisted without knowing the backend.

use std::sync::{Arc, Mutex, PoisonError};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;

use activator_core::{
    ActivatorError, AdapterType, OutcomeRecord, PluginAdapter, RouteType, RoutingRecord,
    RoutingStore, SimilarityHit, SuccessStatistic,
};

/// Delegates to an inner store unless a fault is armed.
pub struct FaultyStore {
    inner: Arc<dyn RoutingStore>,
    search_down: AtomicBool,
    writes_down: AtomicBool,
    failing_writes: AtomicU32,
    write_attempts: AtomicU32,
    searches: AtomicU32,
    routings: Mutex<Vec<RoutingRecord>>,
    outcomes: Mutex<Vec<OutcomeRecord>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn RoutingStore>) -> Self {
        Self {
            inner,
            search_down: AtomicBool::new(false),
            writes_down: AtomicBool::new(false),
            failing_writes: AtomicU32::new(0),
            write_attempts: AtomicU32::new(0),
            searches: AtomicU32::new(0),
            routings: Mutex::new(Vec::new()),
            outcomes: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &Arc<dyn RoutingStore> {
        &self.inner
    }

    /// Fail every similarity search and write.
    pub fn set_unreachable(&self, down: bool) {
        self.search_down.store(down, Ordering::SeqCst);
        self.writes_down.store(down, Ordering::SeqCst);
    }

    /// Fail the next `n` write calls, then recover.
    pub fn fail_next_writes(&self, n: u32) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Write calls seen, failed or not.
    pub fn write_attempts(&self) -> u32 {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Similarity searches attempted.
    pub fn searches(&self) -> u32 {
        self.searches.load(Ordering::SeqCst)
    }

    /// Routing records persisted, in write order.
    pub fn routings(&self) -> Vec<RoutingRecord> {
        self.routings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Outcome records persisted, in write order (replays included).
    pub fn outcomes(&self) -> Vec<OutcomeRecord> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn check_write(&self) -> Result<(), ActivatorError> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.writes_down.load(Ordering::SeqCst) {
            return Err(injected("store unreachable"));
        }
        let armed = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            return Err(injected("injected write failure"));
        }
        Ok(())
    }
}

fn injected(message: &str) -> ActivatorError {
    ActivatorError::storage(std::io::Error::other(message.to_string()))
}

#[async_trait]
impl PluginAdapter for FaultyStore {
    fn name(&self) -> &str {
        "faulty-store"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }
}

#[async_trait]
impl RoutingStore for FaultyStore {
    async fn initialize(&self) -> Result<(), ActivatorError> {
        self.inner.initialize().await
    }

    async fn search_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<SimilarityHit>, ActivatorError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.search_down.load(Ordering::SeqCst) {
            return Err(injected("store unreachable"));
        }
        self.inner.search_similar(embedding, threshold).await
    }

    async fn insert_routing(&self, record: &RoutingRecord) -> Result<(), ActivatorError> {
        self.check_write()?;
        self.inner.insert_routing(record).await?;
        self.routings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    async fn insert_outcome(&self, outcome: &OutcomeRecord) -> Result<bool, ActivatorError> {
        self.check_write()?;
        let counted = self.inner.insert_outcome(outcome).await?;
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome.clone());
        Ok(counted)
    }

    async fn statistic(
        &self,
        route_type: RouteType,
        tool: &str,
    ) -> Result<SuccessStatistic, ActivatorError> {
        self.inner.statistic(route_type, tool).await
    }
}
