// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier Activator: wakes scale-to-zero tiers and coalesces concurrent wakes.
//!
//! The first caller to find a tier COLD (or COOLING) flips it to WAKING, issues
//! a single scale-up, and spawns a poller. Every caller, first or not, waits on
//! the tier's readiness channel under the tier's activation timeout. Callers
//! get back a [`TierLease`] that keeps the pending counter raised until the
//! request that holds it completes.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use activator_config::model::TiersConfig;
use activator_core::{ActivatorError, ClusterControl, TierId, TierStatus};
use activator_prometheus::record_activation;

use crate::tier::{TierArena, TierLease, TierPhase, TierSlot, TierSnapshot, TierSpec, WakeSignal};

struct Inner {
    arena: TierArena,
    cluster: Arc<dyn ClusterControl>,
    poll_interval: Duration,
    cooldown: Duration,
    tracker: TaskTracker,
    shutdown: CancellationToken,
}

/// Shared handle to the tier arena and its wake machinery. Cheap to clone.
#[derive(Clone)]
pub struct TierActivator {
    inner: Arc<Inner>,
}

impl TierActivator {
    /// `cooldown` is the idle time after which a READY tier may already have
    /// been scaled down by the autoscaler.
    pub fn new(
        specs: Vec<TierSpec>,
        cluster: Arc<dyn ClusterControl>,
        poll_interval: Duration,
        cooldown: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                arena: TierArena::new(specs),
                cluster,
                poll_interval,
                cooldown,
                tracker: TaskTracker::new(),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Build the arena from the `[tiers]` section.
    pub fn from_config(config: &TiersConfig, cluster: Arc<dyn ClusterControl>) -> Self {
        let specs = config
            .all()
            .map(|entry| TierSpec {
                id: TierId::new(entry.name.clone()),
                activation_timeout: Duration::from_millis(entry.activation_timeout_ms),
            })
            .collect();
        Self::new(
            specs,
            cluster,
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_secs(config.cooldown_secs),
        )
    }

    /// Whether `tier` is part of the arena.
    pub fn knows(&self, tier: &TierId) -> bool {
        self.inner.arena.get(tier).is_some()
    }

    /// Current pending-request count of a tier (0 for unknown tiers).
    pub fn pending(&self, tier: &TierId) -> u64 {
        self.inner.arena.get(tier).map_or(0, |slot| slot.pending())
    }

    /// Current phase of a tier.
    pub fn phase(&self, tier: &TierId) -> Option<TierPhase> {
        self.inner.arena.get(tier).map(|slot| slot.lock().phase)
    }

    /// Per-tier phase, replicas, pending count, and idle time.
    pub fn snapshot(&self) -> Vec<TierSnapshot> {
        self.inner
            .arena
            .iter()
            .map(|slot| TierSnapshot::of(slot))
            .collect()
    }

    /// Wake `tier` if needed and wait until it is ready.
    ///
    /// A READY tier returns immediately unless it has sat idle for the cooldown
    /// period, in which case the autoscaler may have drained it and it is woken
    /// again like a COOLING tier. Fails with `ActivationTimeout` when the
    /// tier does not report ready within its activation timeout or the
    /// scale-up request is rejected; the returned lease is released either way.
    pub async fn activate(&self, tier: &TierId) -> Result<TierLease, ActivatorError> {
        let slot = self
            .inner
            .arena
            .get(tier)
            .cloned()
            .ok_or_else(|| ActivatorError::Config(format!("unknown tier `{tier}`")))?;
        // Sampled before the lease refreshes `last_activity`.
        let stale_generation = {
            let state = slot.lock();
            (state.phase == TierPhase::Ready
                && slot.pending() == 0
                && state.last_activity.elapsed() >= self.inner.cooldown)
                .then_some(state.generation)
        };
        let lease = TierLease::acquire(slot.clone());

        let (generation, mut rx) = {
            let mut state = slot.lock();
            match state.phase {
                TierPhase::Ready if stale_generation != Some(state.generation) => {
                    debug!(tier = %tier, "tier already ready");
                    return Ok(lease);
                }
                TierPhase::Waking => {
                    debug!(tier = %tier, generation = state.generation, "joining in-flight wake");
                }
                TierPhase::Ready | TierPhase::Cold | TierPhase::Cooling => {
                    if state.phase == TierPhase::Ready {
                        info!(tier = %tier, "idle past cooldown; re-checking readiness");
                    }
                    state.phase = TierPhase::Waking;
                    state.generation += 1;
                    slot.signal.send_replace(WakeSignal::Waking(state.generation));
                    self.spawn_wake(slot.clone(), state.generation);
                }
            }
            (state.generation, slot.signal.subscribe())
        };

        let timeout = slot.spec.activation_timeout;
        let ready = tokio::time::timeout(timeout, async {
            loop {
                let signal = *rx.borrow_and_update();
                match signal {
                    WakeSignal::Ready(g) if g >= generation => return true,
                    WakeSignal::Failed(g) if g >= generation => return false,
                    _ => {}
                }
                if rx.changed().await.is_err() {
                    return false;
                }
            }
        })
        .await;

        match ready {
            Ok(true) => Ok(lease),
            Ok(false) | Err(_) => {
                warn!(tier = %tier, timeout_ms = timeout.as_millis() as u64, "tier activation failed");
                Err(ActivatorError::ActivationTimeout {
                    tier: tier.clone(),
                    waited: timeout,
                })
            }
        }
    }

    fn spawn_wake(&self, slot: Arc<TierSlot>, generation: u64) {
        let cluster = self.inner.cluster.clone();
        let poll_interval = self.inner.poll_interval;
        let shutdown = self.inner.shutdown.clone();

        self.inner.tracker.spawn(async move {
            let tier = slot.spec.id.clone();
            let started = Instant::now();
            info!(tier = %tier, generation, "waking tier");

            let result = tokio::select! {
                _ = shutdown.cancelled() => Err(ActivatorError::Cancelled),
                polled = tokio::time::timeout(
                    slot.spec.activation_timeout,
                    wait_until_ready(cluster.as_ref(), &tier, poll_interval),
                ) => polled.unwrap_or(Err(ActivatorError::ActivationTimeout {
                    tier: tier.clone(),
                    waited: slot.spec.activation_timeout,
                })),
            };

            let mut state = slot.lock();
            if state.generation != generation {
                return;
            }
            match result {
                Ok(status) => {
                    let elapsed = started.elapsed();
                    state.phase = TierPhase::Ready;
                    state.replicas = status.replicas;
                    state.last_activity = Instant::now();
                    record_activation(tier.as_str(), elapsed.as_secs_f64());
                    info!(tier = %tier, replicas = status.replicas, elapsed_ms = elapsed.as_millis() as u64, "tier ready");
                    slot.signal.send_replace(WakeSignal::Ready(generation));
                }
                Err(e) => {
                    state.phase = TierPhase::Cold;
                    warn!(tier = %tier, error = %e, "tier wake failed");
                    slot.signal.send_replace(WakeSignal::Failed(generation));
                }
            }
        });
    }

    /// One cooldown evaluation over every tier.
    ///
    /// READY tiers idle for `cooldown` with nothing pending move to COOLING;
    /// COOLING tiers whose status reports zero replicas move to COLD. WAKING
    /// tiers and tiers with pending requests are left alone.
    pub async fn cooldown_pass(&self, cooldown: Duration) {
        for slot in self.inner.arena.iter() {
            let phase = {
                let mut state = slot.lock();
                if state.phase == TierPhase::Ready
                    && slot.pending() == 0
                    && state.last_activity.elapsed() >= cooldown
                {
                    state.phase = TierPhase::Cooling;
                    info!(tier = %slot.spec.id, "tier cooling down");
                }
                state.phase
            };
            if phase != TierPhase::Cooling || slot.pending() > 0 {
                continue;
            }

            match self.inner.cluster.get_status(&slot.spec.id).await {
                Ok(status) => {
                    let mut state = slot.lock();
                    if state.phase != TierPhase::Cooling {
                        continue;
                    }
                    state.replicas = status.replicas;
                    if status.replicas == 0 {
                        state.phase = TierPhase::Cold;
                        info!(tier = %slot.spec.id, "tier scaled to zero");
                    }
                }
                Err(e) => debug!(tier = %slot.spec.id, error = %e, "cooldown status check failed"),
            }
        }
    }

    /// Cancel in-flight wakes and wait for their tasks to finish.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();
        self.inner.tracker.close();
        self.inner.tracker.wait().await;
    }
}

async fn wait_until_ready(
    cluster: &dyn ClusterControl,
    tier: &TierId,
    poll_interval: Duration,
) -> Result<TierStatus, ActivatorError> {
    cluster.scale(tier, 1).await?;
    loop {
        match cluster.get_status(tier).await {
            Ok(status) if status.ready && status.replicas > 0 => return Ok(status),
            Ok(status) => debug!(tier = %tier, replicas = status.replicas, "tier not ready yet"),
            Err(e) => debug!(tier = %tier, error = %e, "tier status poll failed"),
        }
        tokio::time::sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use activator_core::{AdapterType, PluginAdapter};
    use async_trait::async_trait;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct ClusterState {
        scale_calls: Vec<(TierId, u32)>,
        scaled_at: HashMap<TierId, Instant>,
        replicas: HashMap<TierId, u32>,
    }

    struct FakeCluster {
        ready_after: Duration,
        reject_scale: bool,
        state: Mutex<ClusterState>,
    }

    impl FakeCluster {
        fn new(ready_after: Duration) -> Arc<Self> {
            Arc::new(Self {
                ready_after,
                reject_scale: false,
                state: Mutex::default(),
            })
        }

        fn scale_calls(&self) -> usize {
            self.state.lock().unwrap().scale_calls.len()
        }

        fn scale_to_zero(&self, tier: &TierId) {
            let mut state = self.state.lock().unwrap();
            state.replicas.insert(tier.clone(), 0);
            state.scaled_at.remove(tier);
        }
    }

    #[async_trait]
    impl PluginAdapter for FakeCluster {
        fn name(&self) -> &str {
            "fake-cluster"
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::Cluster
        }
    }

    #[async_trait]
    impl ClusterControl for FakeCluster {
        async fn scale(&self, tier: &TierId, replicas: u32) -> Result<(), ActivatorError> {
            if self.reject_scale {
                return Err(ActivatorError::Internal("quota exceeded".into()));
            }
            let mut state = self.state.lock().unwrap();
            state.scale_calls.push((tier.clone(), replicas));
            state.replicas.insert(tier.clone(), replicas);
            state.scaled_at.insert(tier.clone(), Instant::now());
            Ok(())
        }

        async fn get_status(&self, tier: &TierId) -> Result<TierStatus, ActivatorError> {
            let state = self.state.lock().unwrap();
            let replicas = state.replicas.get(tier).copied().unwrap_or(0);
            let ready = state
                .scaled_at
                .get(tier)
                .is_some_and(|at| at.elapsed() >= self.ready_after);
            Ok(TierStatus {
                replicas,
                ready: ready && replicas > 0,
            })
        }
    }

    fn activator(cluster: Arc<FakeCluster>, timeout: Duration) -> TierActivator {
        TierActivator::new(
            vec![
                TierSpec {
                    id: TierId::new("classifier"),
                    activation_timeout: timeout,
                },
                TierSpec {
                    id: TierId::new("executor"),
                    activation_timeout: timeout,
                },
            ],
            cluster,
            Duration::from_millis(100),
            Duration::from_secs(300),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_activations_issue_one_scale_up() {
        let cluster = FakeCluster::new(Duration::from_millis(700));
        let activator = activator(cluster.clone(), Duration::from_secs(5));
        let tier = TierId::new("classifier");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let activator = activator.clone();
                let tier = tier.clone();
                tokio::spawn(async move { activator.activate(&tier).await })
            })
            .collect();

        let mut leases = Vec::new();
        for handle in handles {
            leases.push(handle.await.unwrap().expect("every caller sees READY"));
        }
        assert_eq!(cluster.scale_calls(), 1);
        assert_eq!(activator.phase(&tier), Some(TierPhase::Ready));
        assert_eq!(activator.pending(&tier), 16);

        leases.clear();
        assert_eq!(activator.pending(&tier), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_tier_short_circuits() {
        let cluster = FakeCluster::new(Duration::ZERO);
        let activator = activator(cluster.clone(), Duration::from_secs(1));
        let tier = TierId::new("executor");

        drop(activator.activate(&tier).await.unwrap());
        drop(activator.activate(&tier).await.unwrap());
        assert_eq!(cluster.scale_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn slow_tier_times_out_and_resets_to_cold() {
        let cluster = FakeCluster::new(Duration::from_secs(30));
        let activator = activator(cluster.clone(), Duration::from_secs(3));
        let tier = TierId::new("executor");

        let err = activator.activate(&tier).await.unwrap_err();
        assert!(matches!(
            err,
            ActivatorError::ActivationTimeout { ref tier, waited } if tier.as_str() == "executor" && waited == Duration::from_secs(3)
        ));
        assert!(err.is_escalation_trigger());
        assert_eq!(activator.pending(&tier), 0);

        // Let the poller hit its own deadline.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Cold));
        assert!(logs_contain("tier activation failed"));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_scale_up_fails_fast() {
        let cluster = Arc::new(FakeCluster {
            ready_after: Duration::ZERO,
            reject_scale: true,
            state: Mutex::default(),
        });
        let activator = activator(cluster, Duration::from_secs(3));
        let started = Instant::now();
        let err = activator
            .activate(&TierId::new("classifier"))
            .await
            .unwrap_err();
        assert!(matches!(err, ActivatorError::ActivationTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn unknown_tier_is_a_config_error() {
        let activator = activator(FakeCluster::new(Duration::ZERO), Duration::from_secs(1));
        let err = activator.activate(&TierId::new("gpu")).await.unwrap_err();
        assert!(matches!(err, ActivatorError::Config(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_moves_idle_tier_to_cold() {
        let cluster = FakeCluster::new(Duration::ZERO);
        let activator = activator(cluster.clone(), Duration::from_secs(1));
        let tier = TierId::new("executor");
        let cooldown = Duration::from_secs(300);

        drop(activator.activate(&tier).await.unwrap());
        activator.cooldown_pass(cooldown).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Ready));

        tokio::time::advance(Duration::from_secs(301)).await;
        activator.cooldown_pass(cooldown).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Cooling));

        cluster.scale_to_zero(&tier);
        activator.cooldown_pass(cooldown).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Cold));
        assert_eq!(activator.snapshot().iter().find(|s| s.tier == tier).unwrap().replicas, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_suppressed_while_requests_pending() {
        let cluster = FakeCluster::new(Duration::ZERO);
        let activator = activator(cluster, Duration::from_secs(1));
        let tier = TierId::new("executor");

        let lease = activator.activate(&tier).await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        activator.cooldown_pass(Duration::from_secs(300)).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Ready));
        drop(lease);
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_skips_waking_tier() {
        let cluster = FakeCluster::new(Duration::from_secs(2));
        let activator = activator(cluster, Duration::from_secs(5));
        let tier = TierId::new("classifier");

        let waiter = {
            let activator = activator.clone();
            let tier = tier.clone();
            tokio::spawn(async move { activator.activate(&tier).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Waking));
        activator.cooldown_pass(Duration::ZERO).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Waking));
        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn cooling_tier_rewakes_on_request() {
        let cluster = FakeCluster::new(Duration::ZERO);
        let activator = activator(cluster.clone(), Duration::from_secs(1));
        let tier = TierId::new("executor");

        drop(activator.activate(&tier).await.unwrap());
        tokio::time::advance(Duration::from_secs(10)).await;
        activator.cooldown_pass(Duration::from_secs(5)).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Cooling));

        let lease = activator.activate(&tier).await.unwrap();
        assert_eq!(activator.phase(&tier), Some(TierPhase::Ready));
        assert_eq!(cluster.scale_calls(), 2);
        drop(lease);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_tier_idle_past_cooldown_is_rewoken() {
        let cluster = FakeCluster::new(Duration::from_millis(500));
        let activator = activator(cluster.clone(), Duration::from_secs(2));
        let tier = TierId::new("executor");

        drop(activator.activate(&tier).await.unwrap());
        tokio::time::advance(Duration::from_secs(305)).await;
        // The autoscaler drained the tier before the cooldown monitor ticked.
        cluster.scale_to_zero(&tier);
        assert_eq!(activator.phase(&tier), Some(TierPhase::Ready));

        let started = Instant::now();
        let lease = activator.activate(&tier).await.unwrap();
        assert_eq!(cluster.scale_calls(), 2);
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(activator.phase(&tier), Some(TierPhase::Ready));
        assert_eq!(activator.snapshot().iter().find(|s| s.tier == tier).unwrap().replicas, 1);
        drop(lease);

        // Freshly active again: no further wake.
        drop(activator.activate(&tier).await.unwrap());
        assert_eq!(cluster.scale_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_inflight_wake() {
        let cluster = FakeCluster::new(Duration::from_secs(60));
        let activator = activator(cluster, Duration::from_secs(120));
        let tier = TierId::new("classifier");

        let waiter = {
            let activator = activator.clone();
            let tier = tier.clone();
            tokio::spawn(async move { activator.activate(&tier).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        activator.shutdown().await;
        assert!(waiter.await.unwrap().is_err());
        assert_eq!(activator.phase(&tier), Some(TierPhase::Cold));
    }
}
