// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing store trait: persistence and nearest-neighbor search over routing history.

use async_trait::async_trait;

use crate::error::ActivatorError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{OutcomeRecord, RouteType, RoutingRecord, SimilarityHit, SuccessStatistic};

/// Backing store for routing records, outcomes, and success statistics.
///
/// Every method fails with [`ActivatorError::Storage`] when the backend is
/// unreachable. Implementations must count each outcome exactly once per
/// query id, under their own synchronization.
#[async_trait]
pub trait RoutingStore: PluginAdapter {
    /// Prepares the backend (schema, connections). Idempotent.
    async fn initialize(&self) -> Result<(), ActivatorError>;

    /// Nearest prior routing whose cosine similarity to `embedding` is at least
    /// `threshold`, with the statistic for its (route_type, tool) pair.
    async fn search_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<SimilarityHit>, ActivatorError>;

    /// Appends a routing record. A second record for the same query id is ignored.
    async fn insert_routing(&self, record: &RoutingRecord) -> Result<(), ActivatorError>;

    /// Appends an outcome and updates the success statistic of its routing.
    ///
    /// Returns `false` when an outcome for this query id was already counted.
    async fn insert_outcome(&self, outcome: &OutcomeRecord) -> Result<bool, ActivatorError>;

    /// Current statistic for a (route_type, tool) pair.
    async fn statistic(
        &self,
        route_type: RouteType,
        tool: &str,
    ) -> Result<SuccessStatistic, ActivatorError>;
}
