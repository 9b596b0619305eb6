// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory routing store with brute-force cosine search.
//!
//! Used for `storage.backend = "memory"` and throughout the test suites.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use activator_core::{
    ActivatorError, AdapterType, OutcomeRecord, PluginAdapter, QueryId, RouteType,
    RoutingRecord, RoutingStore, SimilarityHit, SuccessStatistic,
};

use crate::ledger::SuccessLedger;
use crate::types::cosine_similarity;

/// Whether an outcome should move the success counters of its routing.
///
/// Cancelled requests say nothing about routing quality, and routings that never
/// resolved a tool have no (route_type, tool) pair to credit.
pub(crate) fn counts_toward_statistics(outcome: &OutcomeRecord, tool: &str) -> bool {
    !tool.is_empty() && outcome.error_type.as_deref() != Some("cancelled")
}

#[derive(Default)]
struct Records {
    routings: Vec<RoutingRecord>,
    index: HashMap<QueryId, usize>,
    outcomes: HashMap<QueryId, OutcomeRecord>,
}

/// Process-local [`RoutingStore`].
#[derive(Default)]
pub struct InMemoryRoutingStore {
    records: RwLock<Records>,
    ledger: SuccessLedger,
}

impl InMemoryRoutingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored routing records.
    pub async fn routing_count(&self) -> usize {
        self.records.read().await.routings.len()
    }

    /// Routing record for a query, if stored.
    pub async fn routing(&self, query_id: &QueryId) -> Option<RoutingRecord> {
        let records = self.records.read().await;
        records
            .index
            .get(query_id)
            .map(|&i| records.routings[i].clone())
    }

    /// Outcome record for a query, if stored.
    pub async fn outcome(&self, query_id: &QueryId) -> Option<OutcomeRecord> {
        self.records.read().await.outcomes.get(query_id).cloned()
    }
}

#[async_trait]
impl PluginAdapter for InMemoryRoutingStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }
}

#[async_trait]
impl RoutingStore for InMemoryRoutingStore {
    async fn initialize(&self) -> Result<(), ActivatorError> {
        Ok(())
    }

    async fn search_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<SimilarityHit>, ActivatorError> {
        let records = self.records.read().await;
        let mut best: Option<(usize, f32)> = None;
        for (i, record) in records.routings.iter().enumerate() {
            if record.tool.is_empty() {
                continue;
            }
            let score = cosine_similarity(embedding, &record.embedding);
            // Strict comparison: the earliest record wins ties.
            if score >= threshold && best.is_none_or(|(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        Ok(best.map(|(i, similarity)| {
            let record = records.routings[i].clone();
            let statistic = self.ledger.get(record.route_type, &record.tool);
            SimilarityHit {
                record,
                similarity,
                statistic,
            }
        }))
    }

    async fn insert_routing(&self, record: &RoutingRecord) -> Result<(), ActivatorError> {
        let mut records = self.records.write().await;
        if records.index.contains_key(&record.query_id) {
            return Ok(());
        }
        let position = records.routings.len();
        records.index.insert(record.query_id.clone(), position);
        records.routings.push(record.clone());
        Ok(())
    }

    async fn insert_outcome(&self, outcome: &OutcomeRecord) -> Result<bool, ActivatorError> {
        let mut records = self.records.write().await;
        let route = records
            .index
            .get(&outcome.query_id)
            .map(|&i| (records.routings[i].route_type, records.routings[i].tool.clone()));

        let applied = match &route {
            Some((route_type, tool)) if counts_toward_statistics(outcome, tool) => {
                self.ledger
                    .record(&outcome.query_id, *route_type, tool, outcome.success)
            }
            _ => self.ledger.mark_seen(&outcome.query_id),
        };
        if applied {
            records
                .outcomes
                .insert(outcome.query_id.clone(), outcome.clone());
        }
        Ok(applied)
    }

    async fn statistic(
        &self,
        route_type: RouteType,
        tool: &str,
    ) -> Result<SuccessStatistic, ActivatorError> {
        Ok(self.ledger.get(route_type, tool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;

    fn routing(id: &str, text: &str, tool: &str, route_type: RouteType) -> RoutingRecord {
        RoutingRecord {
            query_id: QueryId(id.into()),
            query_text: text.into(),
            embedding: HashEmbedder::default().embed_text(text),
            tier: "executor".into(),
            tool: tool.into(),
            route_type,
            confidence: 0.8,
            created_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    fn outcome(id: &str, success: bool) -> OutcomeRecord {
        OutcomeRecord {
            query_id: QueryId(id.into()),
            success,
            error_type: (!success).then(|| "execution".to_string()),
            latency_ms: 12,
            user_feedback: None,
            created_at: "2026-01-01T00:00:01Z".into(),
        }
    }

    #[tokio::test]
    async fn search_returns_hit_with_statistic() {
        let store = InMemoryRoutingStore::new();
        let text = "why is checkout slow";
        store
            .insert_routing(&routing("q1", text, "get_logs", RouteType::Classifier))
            .await
            .unwrap();
        store.insert_outcome(&outcome("q1", true)).await.unwrap();

        let query = HashEmbedder::default().embed_text(text);
        let hit = store.search_similar(&query, 0.92).await.unwrap().unwrap();
        assert_eq!(hit.record.tool, "get_logs");
        assert!(hit.similarity > 0.999);
        assert_eq!(hit.statistic.attempts, 1);
        assert_eq!(hit.statistic.successes, 1);
    }

    #[tokio::test]
    async fn search_below_threshold_misses() {
        let store = InMemoryRoutingStore::new();
        store
            .insert_routing(&routing("q1", "delete namespace staging", "delete_resource", RouteType::Slm))
            .await
            .unwrap();
        let query = HashEmbedder::default().embed_text("show cluster info please");
        assert!(store.search_similar(&query, 0.92).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn similarity_equal_to_threshold_is_a_hit() {
        let store = InMemoryRoutingStore::new();
        let mut record = routing("q1", "scale web to 3", "scale_deployment", RouteType::Keyword);
        record.embedding = vec![3.0, 4.0];
        store.insert_routing(&record).await.unwrap();

        // cos([1, 0], [3, 4]) is exactly 3/5.
        let hit = store.search_similar(&[1.0, 0.0], 0.6).await.unwrap().unwrap();
        assert_eq!(hit.similarity, 0.6);
        assert_eq!(hit.record.tool, "scale_deployment");
        assert!(store.search_similar(&[1.0, 0.0], 0.61).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn earliest_record_wins_ties() {
        let store = InMemoryRoutingStore::new();
        let text = "check memory pressure on node-2";
        store
            .insert_routing(&routing("q1", text, "get_nodes", RouteType::Classifier))
            .await
            .unwrap();
        store
            .insert_routing(&routing("q2", text, "get_nodes", RouteType::Similarity))
            .await
            .unwrap();
        let query = HashEmbedder::default().embed_text(text);
        let hit = store.search_similar(&query, 0.92).await.unwrap().unwrap();
        assert_eq!(hit.record.query_id, QueryId("q1".into()));
    }

    #[tokio::test]
    async fn unresolved_routings_are_not_searchable() {
        let store = InMemoryRoutingStore::new();
        store
            .insert_routing(&routing("q1", "something odd", "", RouteType::Slm))
            .await
            .unwrap();
        let query = HashEmbedder::default().embed_text("something odd");
        assert!(store.search_similar(&query, 0.5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn outcome_replay_counts_once() {
        let store = InMemoryRoutingStore::new();
        store
            .insert_routing(&routing("q1", "list pods", "get_pods", RouteType::Keyword))
            .await
            .unwrap();
        assert!(store.insert_outcome(&outcome("q1", true)).await.unwrap());
        assert!(!store.insert_outcome(&outcome("q1", true)).await.unwrap());
        let stat = store.statistic(RouteType::Keyword, "get_pods").await.unwrap();
        assert_eq!(stat.attempts, 1);
    }

    #[tokio::test]
    async fn cancelled_outcome_is_stored_but_not_counted() {
        let store = InMemoryRoutingStore::new();
        store
            .insert_routing(&routing("q1", "get logs for api", "get_logs", RouteType::Keyword))
            .await
            .unwrap();
        let mut cancelled = outcome("q1", false);
        cancelled.error_type = Some("cancelled".into());
        assert!(store.insert_outcome(&cancelled).await.unwrap());
        assert!(store.outcome(&QueryId("q1".into())).await.is_some());
        let stat = store.statistic(RouteType::Keyword, "get_logs").await.unwrap();
        assert_eq!(stat.attempts, 0);
    }

    #[tokio::test]
    async fn duplicate_routing_is_ignored() {
        let store = InMemoryRoutingStore::new();
        let record = routing("q1", "show nodes", "get_nodes", RouteType::Keyword);
        store.insert_routing(&record).await.unwrap();
        store.insert_routing(&record).await.unwrap();
        assert_eq!(store.routing_count().await, 1);
    }
}
