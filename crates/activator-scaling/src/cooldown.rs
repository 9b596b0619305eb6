// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic cooldown evaluation for idle tiers.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use activator_config::model::TiersConfig;

use crate::activator::TierActivator;

/// Background task that moves idle READY tiers to COOLING and observed
/// scale-downs to COLD. Scaling down itself is left to the external autoscaler.
pub struct CooldownMonitor {
    activator: TierActivator,
    cooldown: Duration,
    tick: Duration,
}

impl CooldownMonitor {
    pub fn new(activator: TierActivator, cooldown: Duration, tick: Duration) -> Self {
        Self {
            activator,
            cooldown,
            tick,
        }
    }

    pub fn from_config(activator: TierActivator, config: &TiersConfig) -> Self {
        Self::new(
            activator,
            Duration::from_secs(config.cooldown_secs),
            Duration::from_secs(config.cooldown_tick_secs),
        )
    }

    /// Run until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            cooldown_secs = self.cooldown.as_secs(),
            tick_secs = self.tick.as_secs(),
            "cooldown monitor started"
        );
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    debug!("cooldown tick");
                    self.activator.cooldown_pass(self.cooldown).await;
                }
            }
        }
        info!("cooldown monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use activator_core::{
        ActivatorError, AdapterType, ClusterControl, PluginAdapter, TierId, TierStatus,
    };
    use async_trait::async_trait;

    use crate::tier::{TierPhase, TierSpec};

    /// Reports ready immediately; replicas follow the last scale call.
    struct InstantCluster {
        replicas: AtomicU32,
    }

    #[async_trait]
    impl PluginAdapter for InstantCluster {
        fn name(&self) -> &str {
            "instant"
        }

        fn adapter_type(&self) -> AdapterType {
            AdapterType::Cluster
        }
    }

    #[async_trait]
    impl ClusterControl for InstantCluster {
        async fn scale(&self, _tier: &TierId, replicas: u32) -> Result<(), ActivatorError> {
            self.replicas.store(replicas, Ordering::SeqCst);
            Ok(())
        }

        async fn get_status(&self, _tier: &TierId) -> Result<TierStatus, ActivatorError> {
            let replicas = self.replicas.load(Ordering::SeqCst);
            Ok(TierStatus {
                replicas,
                ready: replicas > 0,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_cools_idle_tier_and_stops_on_cancel() {
        let cluster = Arc::new(InstantCluster {
            replicas: AtomicU32::new(0),
        });
        let activator = TierActivator::new(
            vec![TierSpec {
                id: TierId::new("executor"),
                activation_timeout: Duration::from_secs(2),
            }],
            cluster.clone(),
            Duration::from_millis(50),
            Duration::from_secs(60),
        );
        let tier = TierId::new("executor");
        drop(activator.activate(&tier).await.unwrap());

        let cancel = CancellationToken::new();
        let monitor = CooldownMonitor::new(
            activator.clone(),
            Duration::from_secs(60),
            Duration::from_secs(15),
        );
        let handle = tokio::spawn(monitor.run(cancel.clone()));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Ready));

        tokio::time::sleep(Duration::from_secs(50)).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Cooling));

        // The autoscaler drains the tier.
        cluster.replicas.store(0, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(activator.phase(&tier), Some(TierPhase::Cold));

        cancel.cancel();
        handle.await.unwrap();
    }
}
