// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local SimHash embedder backed by SHA-256.
//!
//! Produces deterministic, fixed-dimension embeddings with no model files and no
//! network access. Identical queries always map to identical vectors, and
//! queries sharing most of their tokens land close together, which is what the
//! similarity cache needs to recognize resubmissions.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use activator_core::{
    ActivatorError, AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput,
    PluginAdapter,
};

use crate::types::l2_normalize;

/// Default embedding dimension.
pub const EMBEDDING_DIM: usize = 384;

/// Bits produced by one SHA-256 digest.
const DIGEST_BITS: usize = 256;

/// SimHash embedder: every token votes +1/-1 on each dimension.
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Compute the embedding of one text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lowered = text.to_lowercase();
        let tokens = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == ':' || c == '-' || c == '_'))
            .filter(|t| !t.is_empty());

        let blocks = self.dimensions.div_ceil(DIGEST_BITS);
        for token in tokens {
            for block in 0..blocks {
                let mut hasher = Sha256::new();
                hasher.update((block as u32).to_le_bytes());
                hasher.update(token.as_bytes());
                let digest = hasher.finalize();

                let start = block * DIGEST_BITS;
                let end = (start + DIGEST_BITS).min(self.dimensions);
                for (offset, slot) in vector[start..end].iter_mut().enumerate() {
                    let bit = (digest[offset / 8] >> (offset % 8)) & 1;
                    *slot += if bit == 1 { 1.0 } else { -1.0 };
                }
            }
        }

        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

#[async_trait]
impl PluginAdapter for HashEmbedder {
    fn name(&self) -> &str {
        "hash-embedder"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }
}

#[async_trait]
impl EmbeddingAdapter for HashEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, ActivatorError> {
        let embeddings = input.texts.iter().map(|t| self.embed_text(t)).collect();
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.dimensions,
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cosine_similarity;

    #[test]
    fn same_text_same_embedding() {
        let embedder = HashEmbedder::default();
        assert_eq!(
            embedder.embed_text("restart pod nginx-0"),
            embedder.embed_text("restart pod nginx-0")
        );
    }

    #[test]
    fn case_and_punctuation_are_ignored() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed_text("Why is the API slow?");
        let b = embedder.embed_text("why is the api slow");
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn output_has_configured_dimension_and_unit_norm() {
        let embedder = HashEmbedder::new(300);
        let v = embedder.embed_text("get pods in default");
        assert_eq!(v.len(), 300);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_is_zero_vector() {
        let v = HashEmbedder::default().embed_text("   ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn unrelated_texts_are_not_near_duplicates() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed_text("investigate high latency on switch 3");
        let b = embedder.embed_text("delete namespace staging");
        assert!(cosine_similarity(&a, &b) < 0.92);
    }

    #[tokio::test]
    async fn embed_batch_preserves_order() {
        let embedder = HashEmbedder::default();
        let out = embedder
            .embed(EmbeddingInput {
                texts: vec!["list pods".into(), "show nodes".into()],
            })
            .await
            .unwrap();
        assert_eq!(out.dimensions, EMBEDDING_DIM);
        assert_eq!(out.embeddings[0], embedder.embed_text("list pods"));
        assert_eq!(out.embeddings[1], embedder.embed_text("show nodes"));
    }
}
