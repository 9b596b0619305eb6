// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing decisions and the report returned to callers.

use serde::Serialize;
use strum::Display;

use activator_core::{ActivatorError, QueryId, RouteType, TierId};

/// Where and how to execute a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    pub tier: TierId,
    pub tool: String,
    pub parameters: serde_json::Value,
    pub confidence: f64,
    pub requires_confirmation: bool,
}

/// Decision produced by one cascade tier.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Tier 1 rule match.
    Keyword { target: Target, pattern: String },
    /// Tier 2 reuse of a prior routing with a good track record.
    Similarity {
        target: Target,
        similarity: f32,
        source: QueryId,
    },
    /// Tier 3 classifier answer.
    Classified { target: Target },
    /// Tier 4 reasoning answer.
    Reasoned { target: Target },
}

impl Decision {
    pub fn route_type(&self) -> RouteType {
        match self {
            Decision::Keyword { .. } => RouteType::Keyword,
            Decision::Similarity { .. } => RouteType::Similarity,
            Decision::Classified { .. } => RouteType::Classifier,
            Decision::Reasoned { .. } => RouteType::Slm,
        }
    }

    pub fn target(&self) -> &Target {
        match self {
            Decision::Keyword { target, .. }
            | Decision::Similarity { target, .. }
            | Decision::Classified { target }
            | Decision::Reasoned { target } => target,
        }
    }
}

/// Why the cascade jumped to the reasoning tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EscalationReason {
    LowConfidence,
    ActivationTimeout,
    InferenceError,
    BudgetExceeded,
    RepeatedFailure,
}

impl EscalationReason {
    /// Reason for an escalation-triggering error.
    pub fn from_error(err: &ActivatorError) -> Option<Self> {
        match err {
            ActivatorError::ActivationTimeout { .. } => Some(Self::ActivationTimeout),
            ActivatorError::Inference { .. } => Some(Self::InferenceError),
            ActivatorError::BudgetExceeded { .. } => Some(Self::BudgetExceeded),
            _ => None,
        }
    }
}

/// One escalation taken while routing a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Escalation {
    pub from: RouteType,
    pub reason: EscalationReason,
}

/// Result of routing and executing one query.
#[derive(Debug, Clone, Serialize)]
pub struct RouteOutcome {
    pub query_id: QueryId,
    pub route_type: RouteType,
    pub tier: TierId,
    pub tool: String,
    pub confidence: f64,
    pub requires_confirmation: bool,
    /// Complexity score, when the cascade got as far as computing it.
    pub complexity: Option<u32>,
    pub escalations: Vec<Escalation>,
    pub success: bool,
    pub output: serde_json::Value,
    /// Tool error, verbatim.
    pub error: Option<String>,
    pub latency_ms: u64,
}
