// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution capability trait: the boundary to the cluster-operations tools.

use async_trait::async_trait;

use crate::error::ActivatorError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ExecutionRequest, ExecutionResult};

/// Runs a resolved tool with its parameters.
///
/// A tool that ran but failed is reported as `Ok` with `success == false`;
/// `Err` is reserved for transport or invocation failures.
#[async_trait]
pub trait ExecutionAdapter: PluginAdapter {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, ActivatorError>;
}
