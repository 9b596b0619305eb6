// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vector Store Client: the router's single entry point to routing history.

use std::sync::Arc;

use tracing::debug;

use activator_core::{
    ActivatorError, EmbeddingAdapter, EmbeddingInput, OutcomeRecord, RoutingRecord,
    RoutingStore, SimilarityHit,
};

/// Result of an embed-then-search round trip.
#[derive(Debug, Clone)]
pub struct SimilaritySearch {
    /// The query embedding, kept for the routing record.
    pub embedding: Vec<f32>,
    /// Best prior routing at or above the threshold.
    pub hit: Option<SimilarityHit>,
}

/// Pairs an embedder with a routing store.
#[derive(Clone)]
pub struct VectorStoreClient {
    embedder: Arc<dyn EmbeddingAdapter>,
    store: Arc<dyn RoutingStore>,
}

impl VectorStoreClient {
    pub fn new(embedder: Arc<dyn EmbeddingAdapter>, store: Arc<dyn RoutingStore>) -> Self {
        Self { embedder, store }
    }

    pub fn store(&self) -> &Arc<dyn RoutingStore> {
        &self.store
    }

    /// Embed one query. Fails with `Inference` when the embedder does.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, ActivatorError> {
        let output = self
            .embedder
            .embed(EmbeddingInput {
                texts: vec![text.to_string()],
            })
            .await?;
        output
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| ActivatorError::inference("embedder returned no vectors"))
    }

    /// Nearest prior routing for an already computed embedding.
    pub async fn search(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<SimilarityHit>, ActivatorError> {
        let hit = self.store.search_similar(embedding, threshold).await?;
        if let Some(hit) = &hit {
            debug!(
                similarity = hit.similarity,
                tool = %hit.record.tool,
                attempts = hit.statistic.attempts,
                successes = hit.statistic.successes,
                "similarity hit"
            );
        }
        Ok(hit)
    }

    /// Embed the query and return the best match at or above `threshold`.
    pub async fn embed_and_search(
        &self,
        text: &str,
        threshold: f32,
    ) -> Result<SimilaritySearch, ActivatorError> {
        let embedding = self.embed(text).await?;
        let hit = self.search(&embedding, threshold).await?;
        Ok(SimilaritySearch { embedding, hit })
    }

    /// Persist a routing record. Fails with `Storage` when the store is unreachable.
    pub async fn store_routing(&self, record: &RoutingRecord) -> Result<(), ActivatorError> {
        self.store.insert_routing(record).await
    }

    /// Persist an outcome; `Ok(false)` means it was a replay and nothing was counted.
    pub async fn store_outcome(&self, outcome: &OutcomeRecord) -> Result<bool, ActivatorError> {
        self.store.insert_outcome(outcome).await
    }
}
