// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote embedding service: `POST {base}/embed` with `{texts}` → `{embeddings}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use activator_core::{
    ActivatorError, AdapterType, EmbeddingAdapter, EmbeddingInput, EmbeddingOutput, PluginAdapter,
};

use crate::http::JsonClient;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Embedder backed by an HTTP service.
pub struct RemoteEmbedder {
    http: JsonClient,
    dimensions: usize,
}

impl RemoteEmbedder {
    pub fn new(base_url: &str, dimensions: usize, timeout: Duration) -> Result<Self, ActivatorError> {
        let http = JsonClient::new(base_url, timeout).map_err(|e| ActivatorError::Inference {
            message: format!("failed to build embedding client: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(Self { http, dimensions })
    }
}

#[async_trait]
impl PluginAdapter for RemoteEmbedder {
    fn name(&self) -> &str {
        "remote-embedder"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }
}

#[async_trait]
impl EmbeddingAdapter for RemoteEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, ActivatorError> {
        let response: EmbedResponse = self
            .http
            .post("/embed", &EmbedRequest { texts: &input.texts })
            .await
            .map_err(|e| ActivatorError::Inference {
                message: e.to_string(),
                source: Some(Box::new(e)),
            })?;

        if response.embeddings.len() != input.texts.len() {
            return Err(ActivatorError::inference(format!(
                "embedding service returned {} vectors for {} texts",
                response.embeddings.len(),
                input.texts.len()
            )));
        }
        if let Some(bad) = response
            .embeddings
            .iter()
            .find(|v| v.len() != self.dimensions)
        {
            return Err(ActivatorError::inference(format!(
                "embedding service returned {} dimensions, expected {}",
                bad.len(),
                self.dimensions
            )));
        }

        Ok(EmbeddingOutput {
            embeddings: response.embeddings,
            dimensions: self.dimensions,
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
