// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classification and reasoning services over HTTP.
//!
//! `POST {base}/infer` with `{text, context}`, answered by
//! `{tier, tool, parameters, confidence}`.

use std::time::Duration;

use async_trait::async_trait;

use activator_core::{
    ActivatorError, AdapterType, HealthStatus, InferenceAdapter, InferenceRequest, PluginAdapter,
    RouteSuggestion,
};

use crate::http::{HttpError, JsonClient};

/// Remote inference service (classifier or reasoning tier).
pub struct RemoteInference {
    name: String,
    http: JsonClient,
}

impl RemoteInference {
    pub fn new(name: &str, base_url: &str, timeout: Duration) -> Result<Self, ActivatorError> {
        let http = JsonClient::new(base_url, timeout).map_err(|e| ActivatorError::Inference {
            message: format!("failed to build HTTP client for {name}: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(Self {
            name: name.to_string(),
            http,
        })
    }
}

fn inference_error(err: HttpError) -> ActivatorError {
    ActivatorError::Inference {
        message: err.to_string(),
        source: Some(Box::new(err)),
    }
}

#[async_trait]
impl PluginAdapter for RemoteInference {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Inference
    }

    async fn health_check(&self) -> Result<HealthStatus, ActivatorError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl InferenceAdapter for RemoteInference {
    async fn infer(&self, request: InferenceRequest) -> Result<RouteSuggestion, ActivatorError> {
        let suggestion: RouteSuggestion = self
            .http
            .post("/infer", &request)
            .await
            .map_err(inference_error)?;
        if !(0.0..=1.0).contains(&suggestion.confidence) {
            return Err(ActivatorError::inference(format!(
                "{} returned confidence {} outside [0, 1]",
                self.name, suggestion.confidence
            )));
        }
        Ok(suggestion)
    }
}
