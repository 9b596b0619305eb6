// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Activator query router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level Activator configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ActivatorConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Cascade thresholds and budgets.
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Scale-to-zero tiers and activation timing.
    #[serde(default)]
    pub tiers: TiersConfig,

    /// Routing history storage.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Query embedding settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Base URLs of the external collaborators.
    #[serde(default)]
    pub services: ServicesConfig,

    /// Ordered keyword rules. Declaration order is the sole tie-break.
    #[serde(default = "default_rules")]
    pub rules: Vec<RuleConfig>,
}

impl Default for ActivatorConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            gateway: GatewayConfig::default(),
            routing: RoutingConfig::default(),
            tiers: TiersConfig::default(),
            storage: StorageConfig::default(),
            embedding: EmbeddingConfig::default(),
            services: ServicesConfig::default(),
            rules: default_rules(),
        }
    }
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Instance name, reported by the health endpoint.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "activator".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Bind host.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bearer token required on `/v1/*` routes. `None` leaves them open.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
            bearer_token: None,
        }
    }
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    8080
}

/// Cascade thresholds.
///
/// Confidence and similarity thresholds are inclusive; the complexity gate is
/// strict (`score < tier3_score_ceiling` goes to the classifier).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RoutingConfig {
    /// Minimum cosine similarity for a Tier 2 hit.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Minimum recorded attempts before a Tier 2 hit may be reused.
    #[serde(default = "default_min_samples")]
    pub min_samples: u64,

    /// Minimum success rate before a Tier 2 hit may be reused.
    #[serde(default = "default_min_success_rate")]
    pub min_success_rate: f64,

    /// Complexity scores at or above this go straight to the reasoning tier.
    #[serde(default = "default_tier3_score_ceiling")]
    pub tier3_score_ceiling: u32,

    /// Classifier answers below this confidence escalate.
    #[serde(default = "default_classifier_min_confidence")]
    pub classifier_min_confidence: f64,

    /// Wall-clock budget of the classifier path, including execution.
    #[serde(default = "default_classifier_budget_secs")]
    pub classifier_budget_secs: u64,

    /// Wall-clock budget of the reasoning path, including execution.
    #[serde(default = "default_reasoning_budget_secs")]
    pub reasoning_budget_secs: u64,

    /// Failures on a similar prior query that force escalation to reasoning.
    #[serde(default = "default_repeated_failure_threshold")]
    pub repeated_failure_threshold: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            min_samples: default_min_samples(),
            min_success_rate: default_min_success_rate(),
            tier3_score_ceiling: default_tier3_score_ceiling(),
            classifier_min_confidence: default_classifier_min_confidence(),
            classifier_budget_secs: default_classifier_budget_secs(),
            reasoning_budget_secs: default_reasoning_budget_secs(),
            repeated_failure_threshold: default_repeated_failure_threshold(),
        }
    }
}

fn default_similarity_threshold() -> f32 {
    0.92
}

fn default_min_samples() -> u64 {
    3
}

fn default_min_success_rate() -> f64 {
    0.8
}

fn default_tier3_score_ceiling() -> u32 {
    50
}

fn default_classifier_min_confidence() -> f64 {
    0.5
}

fn default_classifier_budget_secs() -> u64 {
    30
}

fn default_reasoning_budget_secs() -> u64 {
    60
}

fn default_repeated_failure_threshold() -> u64 {
    2
}

/// Scale-to-zero tier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TiersConfig {
    /// Readiness polling interval while a tier is waking.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Idle time after the pending counter returns to 0 before scale-down.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,

    /// Cooldown monitor tick.
    #[serde(default = "default_cooldown_tick_secs")]
    pub cooldown_tick_secs: u64,

    /// Lightweight classification tier.
    #[serde(default = "default_classifier_tier")]
    pub classifier: TierEntry,

    /// Full reasoning tier.
    #[serde(default = "default_reasoning_tier")]
    pub reasoning: TierEntry,

    /// Execution tiers. The first entry is the default target.
    #[serde(default = "default_execution_tiers")]
    pub execution: Vec<TierEntry>,
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            cooldown_secs: default_cooldown_secs(),
            cooldown_tick_secs: default_cooldown_tick_secs(),
            classifier: default_classifier_tier(),
            reasoning: default_reasoning_tier(),
            execution: default_execution_tiers(),
        }
    }
}

impl TiersConfig {
    /// Every configured tier, classifier and reasoning first.
    pub fn all(&self) -> impl Iterator<Item = &TierEntry> {
        [&self.classifier, &self.reasoning]
            .into_iter()
            .chain(self.execution.iter())
    }

    /// Whether `name` is a configured execution tier.
    pub fn is_execution_tier(&self, name: &str) -> bool {
        self.execution.iter().any(|t| t.name == name)
    }
}

/// One scale-to-zero tier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TierEntry {
    /// Tier identifier, also the `tier` label on `pending_requests`.
    pub name: String,

    /// How long to wait for readiness before `ActivationTimeout`.
    pub activation_timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_cooldown_secs() -> u64 {
    300
}

fn default_cooldown_tick_secs() -> u64 {
    15
}

fn default_classifier_tier() -> TierEntry {
    TierEntry {
        name: "classifier".to_string(),
        activation_timeout_ms: 5_000,
    }
}

fn default_reasoning_tier() -> TierEntry {
    TierEntry {
        name: "reasoning".to_string(),
        activation_timeout_ms: 12_000,
    }
}

fn default_execution_tiers() -> Vec<TierEntry> {
    vec![TierEntry {
        name: "executor".to_string(),
        activation_timeout_ms: 3_000,
    }]
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

/// Routing history storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Which routing store to use.
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,

    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Delay before the single asynchronous persistence retry.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Sqlite
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("activator").join("routing.db"))
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "routing.db".to_string())
}

fn default_wal_mode() -> bool {
    true
}

fn default_retry_delay_ms() -> u64 {
    500
}

/// Embedding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// Vector dimension. Stored vectors of another dimension never match.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Remote embedding service base URL. `None` uses the local hash embedder.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            endpoint: None,
        }
    }
}

fn default_dimensions() -> usize {
    384
}

/// External collaborator endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServicesConfig {
    /// Classification service base URL.
    #[serde(default)]
    pub classifier: Option<String>,

    /// Reasoning service base URL.
    #[serde(default)]
    pub reasoning: Option<String>,

    /// Execution capability base URL.
    #[serde(default)]
    pub execution: Option<String>,

    /// Cluster control base URL.
    #[serde(default)]
    pub cluster: Option<String>,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            classifier: None,
            reasoning: None,
            execution: None,
            cluster: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// One keyword routing rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Regular expression, matched case-insensitively anywhere in the query.
    pub pattern: String,

    /// Execution tier that runs the tool.
    #[serde(default = "default_rule_tier")]
    pub tier: String,

    /// Tool name passed to the execution capability.
    pub tool: String,

    /// Static confidence in [0, 1].
    #[serde(default = "default_rule_confidence")]
    pub confidence: f64,

    /// Mutating tools ask the caller for confirmation.
    #[serde(default)]
    pub requires_confirmation: bool,

    /// Static tool parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,

    /// Sample queries this rule must match; used for overlap detection.
    #[serde(default)]
    pub examples: Vec<String>,
}

fn default_rule_tier() -> String {
    "executor".to_string()
}

fn default_rule_confidence() -> f64 {
    0.9
}

fn rule(
    pattern: &str,
    tool: &str,
    confidence: f64,
    requires_confirmation: bool,
    examples: &[&str],
) -> RuleConfig {
    RuleConfig {
        pattern: pattern.to_string(),
        tier: default_rule_tier(),
        tool: tool.to_string(),
        confidence,
        requires_confirmation,
        parameters: BTreeMap::new(),
        examples: examples.iter().map(|e| e.to_string()).collect(),
    }
}

/// Built-in rules covering the cluster-operations tool catalog, most specific first.
pub fn default_rules() -> Vec<RuleConfig> {
    vec![
        rule(
            r"(block|unblock).*client",
            "block_client",
            0.95,
            true,
            &["block the client with MAC aa:bb:cc:dd:ee:ff", "unblock client 42"],
        ),
        rule(
            r"\brestart\b.*\bpods?\b",
            "restart_pod",
            0.9,
            true,
            &["restart pod nginx-0", "restart the api pod"],
        ),
        rule(
            r"\bscale\b.*\bdeployments?\b",
            "scale_deployment",
            0.9,
            true,
            &["scale deployment web to 3 replicas"],
        ),
        rule(
            r"\b(delete|remove)\b.*\b(pod|deployment|service|namespace)s?\b",
            "delete_resource",
            0.9,
            true,
            &["delete pod nginx-0", "remove the service frontend"],
        ),
        rule(
            r"\bapply\b.*\bmanifests?\b",
            "apply_manifest",
            0.9,
            true,
            &["apply manifest deploy.yaml"],
        ),
        rule(
            r"\b(exec|execute|run)\b.*\b(in|on)\b.*\bpods?\b",
            "execute_command",
            0.85,
            true,
            &["exec ls -la in pod nginx-0", "run df -h on the api pod"],
        ),
        rule(
            r"^\s*(get|show|tail|fetch)\s+(the\s+)?logs?\b",
            "get_logs",
            0.9,
            false,
            &["get logs for pod nginx-0", "tail the logs of api-7f9c"],
        ),
        rule(
            r"^\s*(list|show|get)\s+(all\s+)?(the\s+)?pods\b",
            "get_pods",
            0.9,
            false,
            &["list pods", "show all pods in kube-system"],
        ),
        rule(
            r"^\s*(list|show|get)\s+(all\s+)?(the\s+)?deployments\b",
            "get_deployments",
            0.9,
            false,
            &["get deployments", "list all deployments"],
        ),
        rule(
            r"^\s*(list|show|get)\s+(all\s+)?(the\s+)?services\b",
            "get_services",
            0.9,
            false,
            &["list services"],
        ),
        rule(
            r"^\s*(list|show|get)\s+(all\s+)?(the\s+)?nodes\b",
            "get_nodes",
            0.9,
            false,
            &["show nodes"],
        ),
        rule(
            r"^\s*(list|show|get)\s+(all\s+)?(the\s+)?namespaces\b",
            "get_namespaces",
            0.9,
            false,
            &["list namespaces"],
        ),
        rule(
            r"^\s*(show|get)\s+(the\s+)?cluster\s+info\b",
            "get_cluster_info",
            0.9,
            false,
            &["show cluster info"],
        ),
    ]
}
