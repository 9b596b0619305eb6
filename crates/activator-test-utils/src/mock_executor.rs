// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution capability double.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use activator_core::{
    ActivatorError, AdapterType, ExecutionAdapter, ExecutionRequest, ExecutionResult,
    PluginAdapter,
};

/// Records every execution; tools succeed unless told to fail.
pub struct MockExecutor {
    delay: Duration,
    requests: Mutex<Vec<ExecutionRequest>>,
    failures: Mutex<HashMap<String, String>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Delay every execution by `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make `tool` report failure with `message`.
    pub fn fail_tool(&self, tool: &str, message: &str) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tool.to_string(), message.to_string());
    }

    /// Executions received so far.
    pub fn requests(&self) -> Vec<ExecutionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockExecutor {
    fn name(&self) -> &str {
        "mock-executor"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Execution
    }
}

#[async_trait]
impl ExecutionAdapter for MockExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, ActivatorError> {
        let started = Instant::now();
        let tool = request.tool.clone();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let failure = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&tool)
            .cloned();
        Ok(match failure {
            Some(message) => ExecutionResult {
                success: false,
                output: serde_json::Value::Null,
                error: Some(message),
                latency: started.elapsed(),
            },
            None => ExecutionResult {
                success: true,
                output: serde_json::json!({ "tool": tool, "status": "ok" }),
                error: None,
                latency: started.elapsed(),
            },
        })
    }
}
