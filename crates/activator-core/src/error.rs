// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Activator query router.

use std::time::Duration;

use thiserror::Error;

use crate::types::TierId;

/// The primary error type used across all Activator adapter traits and the cascade.
#[derive(Debug, Error)]
pub enum ActivatorError {
    /// Configuration errors (invalid TOML, bad rule pattern, unknown tier).
    #[error("configuration error: {0}")]
    Config(String),

    /// Vector store / persistence errors (unreachable backend, query failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A scale-from-zero tier did not report ready within its activation budget.
    #[error("tier {tier} not ready after {waited:?}")]
    ActivationTimeout { tier: TierId, waited: Duration },

    /// Embedding, classification, or reasoning service failure.
    #[error("inference error: {message}")]
    Inference {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Downstream tool failure reported by the execution capability.
    #[error("execution of `{tool}` failed: {message}")]
    Execution { tool: String, message: String },

    /// The caller abandoned the request.
    #[error("request cancelled")]
    Cancelled,

    /// The wall-clock budget of the active cascade path was exhausted.
    #[error("routing budget of {budget:?} exceeded")]
    BudgetExceeded { budget: Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ActivatorError {
    /// Build a storage error from any error value.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        ActivatorError::Storage {
            source: source.into(),
        }
    }

    /// Build an inference error without an underlying source.
    pub fn inference(message: impl Into<String>) -> Self {
        ActivatorError::Inference {
            message: message.into(),
            source: None,
        }
    }

    /// Whether the cascade escalates to the next tier on this error instead of failing.
    pub fn is_escalation_trigger(&self) -> bool {
        matches!(
            self,
            ActivatorError::ActivationTimeout { .. }
                | ActivatorError::Inference { .. }
                | ActivatorError::BudgetExceeded { .. }
        )
    }

    /// Stable tag persisted as `OutcomeRecord::error_type`.
    pub fn error_type(&self) -> &'static str {
        match self {
            ActivatorError::Config(_) => "config",
            ActivatorError::Storage { .. } => "storage",
            ActivatorError::ActivationTimeout { .. } => "activation_timeout",
            ActivatorError::Inference { .. } => "inference",
            ActivatorError::Execution { .. } => "execution",
            ActivatorError::Cancelled => "cancelled",
            ActivatorError::BudgetExceeded { .. } => "budget_exceeded",
            ActivatorError::Internal(_) => "internal",
        }
    }
}
