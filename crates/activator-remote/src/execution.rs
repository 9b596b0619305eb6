// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution capability over HTTP.
//!
//! `POST {base}/execute` with `{tool, parameters}`, answered by
//! `{success, result, error}`. Latency is measured on this side. Tool runs
//! have side effects, so requests are never retried.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use activator_core::{
    ActivatorError, AdapterType, ExecutionAdapter, ExecutionRequest, ExecutionResult,
    PluginAdapter,
};

use crate::http::JsonClient;

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    tool: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct ExecuteResponse {
    success: bool,
    #[serde(default)]
    result: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

/// Remote execution capability.
pub struct RemoteExecutor {
    http: JsonClient,
}

impl RemoteExecutor {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ActivatorError> {
        let http = JsonClient::new(base_url, timeout)
            .map_err(|e| ActivatorError::Internal(format!("failed to build execution client: {e}")))?
            .without_retries();
        Ok(Self { http })
    }
}

#[async_trait]
impl PluginAdapter for RemoteExecutor {
    fn name(&self) -> &str {
        "remote-executor"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Execution
    }
}

#[async_trait]
impl ExecutionAdapter for RemoteExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, ActivatorError> {
        let started = Instant::now();
        let response: ExecuteResponse = self
            .http
            .post(
                "/execute",
                &ExecuteRequest {
                    tool: &request.tool,
                    parameters: &request.parameters,
                },
            )
            .await
            .map_err(|e| ActivatorError::Execution {
                tool: request.tool.clone(),
                message: e.to_string(),
            })?;
        let latency = started.elapsed();
        debug!(query_id = %request.query_id, tool = %request.tool, success = response.success, latency_ms = latency.as_millis() as u64, "tool executed");

        Ok(ExecutionResult {
            success: response.success,
            output: response.result,
            error: response.error,
            latency,
        })
    }
}
