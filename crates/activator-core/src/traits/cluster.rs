// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cluster control trait consumed by the tier activator.

use async_trait::async_trait;

use crate::error::ActivatorError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{TierId, TierStatus};

/// Thin interface over the cluster API for scale-to-zero tiers.
#[async_trait]
pub trait ClusterControl: PluginAdapter {
    /// Requests `replicas` replicas for the tier's workload.
    async fn scale(&self, tier: &TierId, replicas: u32) -> Result<(), ActivatorError>;

    /// Current replica count and readiness of the tier.
    async fn get_status(&self, tier: &TierId) -> Result<TierStatus, ActivatorError>;
}
