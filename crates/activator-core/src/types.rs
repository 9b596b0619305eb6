// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the cascade, the stores, and the collaborator traits.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Unique identifier for an incoming query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryId(pub String);

impl QueryId {
    /// Generate a fresh random query id.
    pub fn generate() -> Self {
        QueryId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable natural-language request entering the router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub id: QueryId,
    pub text: String,
    /// Optional structured context forwarded to inference services.
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
    pub received_at: DateTime<Utc>,
}

impl Query {
    /// Create a query stamped with a new id and the current time.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: QueryId::generate(),
            text: text.into(),
            context: BTreeMap::new(),
            received_at: Utc::now(),
        }
    }

    pub fn with_context(mut self, context: BTreeMap<String, serde_json::Value>) -> Self {
        self.context = context;
        self
    }

    /// User feedback attached by the caller under `context["feedback"]`.
    pub fn feedback(&self) -> Option<String> {
        match self.context.get("feedback")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

/// Identifier of a scale-to-zero tier (classifier, reasoning, or an execution tier).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierId(pub String);

impl TierId {
    pub fn new(id: impl Into<String>) -> Self {
        TierId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TierId {
    fn from(s: &str) -> Self {
        TierId(s.to_string())
    }
}

/// Which cascade tier produced a routing decision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RouteType {
    Keyword,
    Similarity,
    Classifier,
    Slm,
}

impl RouteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteType::Keyword => "keyword",
            RouteType::Similarity => "similarity",
            RouteType::Classifier => "classifier",
            RouteType::Slm => "slm",
        }
    }
}

/// Persisted unit of learning: one per query, append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRecord {
    pub query_id: QueryId,
    pub query_text: String,
    /// Query embedding; empty when the embedder was unavailable.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub tier: TierId,
    pub tool: String,
    pub route_type: RouteType,
    pub confidence: f64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Execution outcome linked to a [`RoutingRecord`] by query id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub query_id: QueryId,
    pub success: bool,
    pub error_type: Option<String>,
    pub latency_ms: u64,
    pub user_feedback: Option<String>,
    pub created_at: String,
}

/// Aggregate success counters for a (route_type, tool) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessStatistic {
    pub route_type: RouteType,
    pub tool: String,
    pub attempts: u64,
    pub successes: u64,
}

impl SuccessStatistic {
    /// An empty statistic for a pair with no recorded outcomes.
    pub fn empty(route_type: RouteType, tool: impl Into<String>) -> Self {
        Self {
            route_type,
            tool: tool.into(),
            attempts: 0,
            successes: 0,
        }
    }

    /// Fraction of successful attempts; 0.0 with no attempts.
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }

    pub fn failures(&self) -> u64 {
        self.attempts.saturating_sub(self.successes)
    }

    /// Whether enough successful history exists to reuse this routing (inclusive thresholds).
    pub fn is_trustworthy(&self, min_samples: u64, min_success_rate: f64) -> bool {
        self.attempts >= min_samples && self.success_rate() >= min_success_rate
    }
}

/// Nearest prior routing above the similarity threshold, with its statistic.
#[derive(Debug, Clone)]
pub struct SimilarityHit {
    pub record: RoutingRecord,
    pub similarity: f32,
    pub statistic: SuccessStatistic,
}

/// Replica status reported by the cluster control interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStatus {
    pub replicas: u32,
    pub ready: bool,
}

/// Request sent to a classification or reasoning service.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceRequest {
    pub text: String,
    pub context: BTreeMap<String, serde_json::Value>,
}

/// Routing proposal returned by a classification or reasoning service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSuggestion {
    pub tier: TierId,
    pub tool: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
    pub confidence: f64,
}

/// Tool invocation handed to the execution capability.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRequest {
    pub query_id: QueryId,
    pub tool: String,
    pub parameters: serde_json::Value,
}

/// Result reported by the execution capability.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub success: bool,
    pub output: serde_json::Value,
    pub error: Option<String>,
    pub latency: Duration,
}

/// Input for an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    pub texts: Vec<String>,
}

/// Output from an embedding adapter.
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    pub embeddings: Vec<Vec<f32>>,
    pub dimensions: usize,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Embedding,
    Store,
    Inference,
    Cluster,
    Execution,
    Observability,
}
