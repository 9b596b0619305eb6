// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock cluster control.
//!
//! A tier becomes ready `ready_after` its first scale-up. Tiers marked
//! unresponsive accept the scale-up but never report ready.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use activator_core::{
    ActivatorError, AdapterType, ClusterControl, PluginAdapter, TierId, TierStatus,
};

#[derive(Default)]
struct ClusterState {
    scale_calls: Vec<(TierId, u32)>,
    scaled_at: HashMap<TierId, Instant>,
    replicas: HashMap<TierId, u32>,
    unresponsive: HashSet<TierId>,
    ready_after: HashMap<TierId, Duration>,
}

/// Cluster control double that records every scale request.
pub struct MockClusterControl {
    ready_after: Duration,
    state: Mutex<ClusterState>,
}

impl MockClusterControl {
    /// Tiers report ready as soon as they are scaled up.
    pub fn new() -> Self {
        Self::with_ready_after(Duration::ZERO)
    }

    /// Tiers report ready `delay` after their scale-up.
    pub fn with_ready_after(delay: Duration) -> Self {
        Self {
            ready_after: delay,
            state: Mutex::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClusterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Override the readiness delay of one tier.
    pub fn set_ready_after(&self, tier: &str, delay: Duration) {
        self.lock().ready_after.insert(TierId::new(tier), delay);
    }

    /// Make `tier` accept scale-ups but never become ready.
    pub fn set_unresponsive(&self, tier: &str) {
        self.lock().unresponsive.insert(TierId::new(tier));
    }

    /// Simulate the autoscaler changing the replica count.
    pub fn set_replicas(&self, tier: &str, replicas: u32) {
        let tier = TierId::new(tier);
        let mut state = self.lock();
        if replicas == 0 {
            state.scaled_at.remove(&tier);
        }
        state.replicas.insert(tier, replicas);
    }

    /// Every scale request received, in order.
    pub fn scale_calls(&self) -> Vec<(TierId, u32)> {
        self.lock().scale_calls.clone()
    }

    /// Number of scale requests for one tier.
    pub fn scale_calls_for(&self, tier: &str) -> usize {
        self.lock()
            .scale_calls
            .iter()
            .filter(|(t, _)| t.as_str() == tier)
            .count()
    }

    /// Distinct tiers that received a scale-up, in first-wake order.
    pub fn woken_tiers(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for (tier, _) in self.lock().scale_calls.iter() {
            if !seen.iter().any(|t: &String| t == tier.as_str()) {
                seen.push(tier.to_string());
            }
        }
        seen
    }
}

impl Default for MockClusterControl {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockClusterControl {
    fn name(&self) -> &str {
        "mock-cluster"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cluster
    }
}

#[async_trait]
impl ClusterControl for MockClusterControl {
    async fn scale(&self, tier: &TierId, replicas: u32) -> Result<(), ActivatorError> {
        let mut state = self.lock();
        state.scale_calls.push((tier.clone(), replicas));
        state.replicas.insert(tier.clone(), replicas);
        state.scaled_at.insert(tier.clone(), Instant::now());
        Ok(())
    }

    async fn get_status(&self, tier: &TierId) -> Result<TierStatus, ActivatorError> {
        let state = self.lock();
        let replicas = state.replicas.get(tier).copied().unwrap_or(0);
        let delay = state
            .ready_after
            .get(tier)
            .copied()
            .unwrap_or(self.ready_after);
        let ready = !state.unresponsive.contains(tier)
            && replicas > 0
            && state
                .scaled_at
                .get(tier)
                .is_some_and(|at| at.elapsed() >= delay);
        Ok(TierStatus { replicas, ready })
    }
}
