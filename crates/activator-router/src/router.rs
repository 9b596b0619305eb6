// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cascade orchestrator.
//!
//! Every query walks an explicit state machine:
//! `TIER1_KEYWORD -> TIER2_SIMILARITY -> TIER3_CLASSIFY -> TIER4_REASON ->
//! EXECUTE -> RECORD`, with `ESCALATE` reachable from Tier 2 (repeated prior
//! failure), from the classifier path (low confidence, inference failure) and
//! from EXECUTE of any Tier 1-3 decision whose tier timed out or whose budget
//! ran out. Escalation only ever leads to Tier 4, and Tier 4 never escalates,
//! so the machine cannot loop.
//!
//! The request's bookkeeping lives in a `Flight`. Tier leases taken along the
//! way are held by the flight until the request completes, and a flight that is
//! dropped before reaching RECORD (the caller went away) still queues its
//! routing record with a `cancelled` outcome.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use activator_config::model::{ActivatorConfig, RoutingConfig};
use activator_core::{
    ActivatorError, ExecutionAdapter, ExecutionRequest, ExecutionResult, InferenceAdapter,
    InferenceRequest, OutcomeRecord, Query, RouteSuggestion, RouteType, RoutingRecord,
    SimilarityHit, SuccessStatistic, TierId,
};
use activator_memory::VectorStoreClient;
use activator_prometheus::{
    record_escalation, record_route, record_route_latency, record_storage_error,
};
use activator_scaling::{TierActivator, TierLease};

use crate::complexity::ComplexityScorer;
use crate::decision::{Decision, Escalation, EscalationReason, RouteOutcome, Target};
use crate::keyword::KeywordMatcher;
use crate::recorder::OutcomeRecorder;

/// External collaborators the router drives.
pub struct Collaborators {
    pub vectors: VectorStoreClient,
    pub activator: TierActivator,
    pub classifier: Arc<dyn InferenceAdapter>,
    pub reasoner: Arc<dyn InferenceAdapter>,
    pub executor: Arc<dyn ExecutionAdapter>,
}

struct Inner {
    routing: RoutingConfig,
    classifier_tier: TierId,
    reasoning_tier: TierId,
    default_execution_tier: TierId,
    execution_tiers: HashSet<TierId>,
    matcher: KeywordMatcher,
    scorer: ComplexityScorer,
    vectors: VectorStoreClient,
    activator: TierActivator,
    classifier: Arc<dyn InferenceAdapter>,
    reasoner: Arc<dyn InferenceAdapter>,
    executor: Arc<dyn ExecutionAdapter>,
    recorder: OutcomeRecorder,
}

/// The routing cascade. Cheap to clone; each query is routed independently.
#[derive(Clone)]
pub struct Router {
    inner: Arc<Inner>,
}

#[derive(Debug)]
enum CascadeState {
    Keyword,
    Similarity,
    Classify,
    Reason,
    Execute(Decision),
    Escalate {
        from: RouteType,
        reason: EscalationReason,
    },
    Record(Result<ExecutionResult, ActivatorError>),
}

impl CascadeState {
    fn name(&self) -> &'static str {
        match self {
            CascadeState::Keyword => "tier1_keyword",
            CascadeState::Similarity => "tier2_similarity",
            CascadeState::Classify => "tier3_classify",
            CascadeState::Reason => "tier4_reason",
            CascadeState::Execute(_) => "execute",
            CascadeState::Escalate { .. } => "escalate",
            CascadeState::Record(_) => "record",
        }
    }
}

/// Wall-clock budget of one cascade path.
#[derive(Debug, Clone, Copy)]
struct Budget {
    limit: Duration,
    deadline: Instant,
}

impl Budget {
    fn start(limit: Duration) -> Self {
        Self {
            limit,
            deadline: Instant::now() + limit,
        }
    }

    async fn run<T, F>(&self, fut: F) -> Result<T, ActivatorError>
    where
        F: Future<Output = Result<T, ActivatorError>>,
    {
        tokio::time::timeout_at(self.deadline, fut)
            .await
            .map_err(|_| ActivatorError::BudgetExceeded { budget: self.limit })?
    }
}

/// Per-request bookkeeping.
struct Flight {
    query: Query,
    started: Instant,
    stage: RouteType,
    embedding: Vec<f32>,
    complexity: Option<u32>,
    decision: Option<Decision>,
    escalations: Vec<Escalation>,
    budget: Option<Budget>,
    leases: Vec<TierLease>,
    recorder: OutcomeRecorder,
    recorded: bool,
}

impl Flight {
    fn new(query: Query, recorder: OutcomeRecorder) -> Self {
        Self {
            query,
            started: Instant::now(),
            stage: RouteType::Keyword,
            embedding: Vec::new(),
            complexity: None,
            decision: None,
            escalations: Vec::new(),
            budget: None,
            leases: Vec::new(),
            recorder,
            recorded: false,
        }
    }

    /// Route type of the tier that produced the decision, or of the tier
    /// being evaluated when no decision exists yet.
    fn route_type(&self) -> RouteType {
        self.decision
            .as_ref()
            .map_or(self.stage, Decision::route_type)
    }

    fn records(&self, success: bool, error_type: Option<&str>) -> (RoutingRecord, OutcomeRecord) {
        let created_at = Utc::now().to_rfc3339();
        let (tier, tool, confidence) = match &self.decision {
            Some(decision) => {
                let target = decision.target();
                (target.tier.clone(), target.tool.clone(), target.confidence)
            }
            None => (TierId::new(""), String::new(), 0.0),
        };
        let routing = RoutingRecord {
            query_id: self.query.id.clone(),
            query_text: self.query.text.clone(),
            embedding: self.embedding.clone(),
            tier,
            tool,
            route_type: self.route_type(),
            confidence,
            created_at: created_at.clone(),
        };
        let outcome = OutcomeRecord {
            query_id: self.query.id.clone(),
            success,
            error_type: error_type.map(str::to_string),
            latency_ms: self.started.elapsed().as_millis() as u64,
            user_feedback: self.query.feedback(),
            created_at,
        };
        (routing, outcome)
    }
}

impl Drop for Flight {
    fn drop(&mut self) {
        if self.recorded {
            return;
        }
        info!(query_id = %self.query.id, stage = %self.route_type(), "request cancelled");
        let (routing, outcome) =
            self.records(false, Some(ActivatorError::Cancelled.error_type()));
        self.recorder.submit(routing, outcome);
    }
}

impl Router {
    pub fn new(
        config: &ActivatorConfig,
        collaborators: Collaborators,
    ) -> Result<Self, ActivatorError> {
        let default_execution_tier = config
            .tiers
            .execution
            .first()
            .map(|t| TierId::new(t.name.clone()))
            .ok_or_else(|| {
                ActivatorError::Config("at least one execution tier is required".into())
            })?;
        let execution_tiers = config
            .tiers
            .execution
            .iter()
            .map(|t| TierId::new(t.name.clone()))
            .collect();
        let recorder = OutcomeRecorder::new(
            collaborators.vectors.clone(),
            Duration::from_millis(config.storage.retry_delay_ms),
        );

        Ok(Self {
            inner: Arc::new(Inner {
                routing: config.routing.clone(),
                classifier_tier: TierId::new(config.tiers.classifier.name.clone()),
                reasoning_tier: TierId::new(config.tiers.reasoning.name.clone()),
                default_execution_tier,
                execution_tiers,
                matcher: KeywordMatcher::from_config(&config.rules)?,
                scorer: ComplexityScorer::new(),
                vectors: collaborators.vectors,
                activator: collaborators.activator,
                classifier: collaborators.classifier,
                reasoner: collaborators.reasoner,
                executor: collaborators.executor,
                recorder,
            }),
        })
    }

    pub fn activator(&self) -> &TierActivator {
        &self.inner.activator
    }

    pub fn recorder(&self) -> &OutcomeRecorder {
        &self.inner.recorder
    }

    /// Route `query` until it completes or `cancel` fires.
    pub async fn route_until(
        &self,
        query: Query,
        cancel: &CancellationToken,
    ) -> Result<RouteOutcome, ActivatorError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ActivatorError::Cancelled),
            outcome = self.route(query) => outcome,
        }
    }

    /// Route and execute one query.
    ///
    /// Returns `Ok` whenever a decision was executed, including when the tool
    /// itself failed (`success == false`, error verbatim). Timeouts and
    /// inference failures below Tier 4 escalate, so `Err` comes from the
    /// reasoning path (including its execution tier not waking) or from a
    /// non-escalating error. A routing record is queued either way.
    pub async fn route(&self, query: Query) -> Result<RouteOutcome, ActivatorError> {
        let mut flight = Flight::new(query, self.inner.recorder.clone());
        let mut state = CascadeState::Keyword;

        loop {
            debug!(query_id = %flight.query.id, state = state.name(), "cascade transition");
            state = match state {
                CascadeState::Keyword => self.keyword(&mut flight),
                CascadeState::Similarity => self.similarity(&mut flight).await,
                CascadeState::Classify => self.classify(&mut flight).await,
                CascadeState::Reason => self.reason(&mut flight).await,
                CascadeState::Execute(decision) => self.execute(&mut flight, decision).await,
                CascadeState::Escalate { from, reason } => {
                    info!(query_id = %flight.query.id, from = %from, reason = %reason, "escalating to reasoning tier");
                    record_escalation(&reason.to_string());
                    flight.escalations.push(Escalation { from, reason });
                    CascadeState::Reason
                }
                CascadeState::Record(result) => return self.record(flight, result),
            };
        }
    }

    fn keyword(&self, flight: &mut Flight) -> CascadeState {
        flight.stage = RouteType::Keyword;
        let text = &flight.query.text;
        match self.inner.matcher.find(text) {
            Some(rule) => CascadeState::Execute(Decision::Keyword {
                target: Target {
                    tier: rule.tier.clone(),
                    tool: rule.tool.clone(),
                    parameters: rule.parameters_for(text),
                    confidence: rule.confidence,
                    requires_confirmation: rule.requires_confirmation,
                },
                pattern: rule.pattern.as_str().to_string(),
            }),
            None => CascadeState::Similarity,
        }
    }

    async fn similarity(&self, flight: &mut Flight) -> CascadeState {
        flight.stage = RouteType::Similarity;
        let routing = &self.inner.routing;

        match self
            .inner
            .vectors
            .embed_and_search(&flight.query.text, routing.similarity_threshold)
            .await
        {
            Ok(search) => {
                flight.embedding = search.embedding;
                if let Some(hit) = search.hit {
                    let stats = &hit.statistic;
                    if stats.is_trustworthy(routing.min_samples, routing.min_success_rate) {
                        return CascadeState::Execute(self.reuse(flight, hit));
                    }
                    if self.is_repeated_failure(stats) {
                        return CascadeState::Escalate {
                            from: RouteType::Similarity,
                            reason: EscalationReason::RepeatedFailure,
                        };
                    }
                    debug!(
                        query_id = %flight.query.id,
                        attempts = stats.attempts,
                        successes = stats.successes,
                        "similar routing not trusted for reuse"
                    );
                }
            }
            Err(e) => {
                if matches!(e, ActivatorError::Storage { .. }) {
                    record_storage_error("search_similar");
                }
                warn!(query_id = %flight.query.id, error = %e, "similarity lookup failed; continuing without reuse");
            }
        }

        let score = self.inner.scorer.score(&flight.query.text);
        flight.complexity = Some(score);
        if score < routing.tier3_score_ceiling {
            CascadeState::Classify
        } else {
            debug!(query_id = %flight.query.id, score, "complexity routes past the classifier");
            CascadeState::Reason
        }
    }

    fn is_repeated_failure(&self, stats: &SuccessStatistic) -> bool {
        let routing = &self.inner.routing;
        stats.attempts >= routing.min_samples
            && stats.failures() >= routing.repeated_failure_threshold
            && stats.success_rate() < routing.min_success_rate
    }

    fn reuse(&self, flight: &Flight, hit: SimilarityHit) -> Decision {
        let tool = hit.record.tool;
        let tier = if self.inner.execution_tiers.contains(&hit.record.tier) {
            hit.record.tier
        } else {
            self.inner.default_execution_tier.clone()
        };
        Decision::Similarity {
            target: Target {
                requires_confirmation: self.inner.matcher.requires_confirmation(&tool),
                tier,
                parameters: serde_json::json!({ "query": flight.query.text }),
                confidence: hit.statistic.success_rate(),
                tool,
            },
            similarity: hit.similarity,
            source: hit.record.query_id,
        }
    }

    async fn classify(&self, flight: &mut Flight) -> CascadeState {
        flight.stage = RouteType::Classifier;
        let budget = Budget::start(Duration::from_secs(self.inner.routing.classifier_budget_secs));
        flight.budget = Some(budget);

        let consulted = self
            .consult(
                flight,
                &self.inner.classifier_tier,
                self.inner.classifier.as_ref(),
                budget,
            )
            .await;

        let escalate = |reason| CascadeState::Escalate {
            from: RouteType::Classifier,
            reason,
        };
        match consulted {
            Ok(suggestion) if suggestion.confidence < self.inner.routing.classifier_min_confidence => {
                debug!(query_id = %flight.query.id, confidence = suggestion.confidence, "classifier not confident");
                escalate(EscalationReason::LowConfidence)
            }
            Ok(suggestion) => match self.target_from(suggestion) {
                Ok(target) => CascadeState::Execute(Decision::Classified { target }),
                Err(e) => {
                    debug!(query_id = %flight.query.id, error = %e, "classifier answer unusable");
                    escalate(EscalationReason::InferenceError)
                }
            },
            Err(e) => match EscalationReason::from_error(&e) {
                Some(reason) => escalate(reason),
                None => CascadeState::Record(Err(e)),
            },
        }
    }

    async fn reason(&self, flight: &mut Flight) -> CascadeState {
        flight.stage = RouteType::Slm;
        let budget = Budget::start(Duration::from_secs(self.inner.routing.reasoning_budget_secs));
        flight.budget = Some(budget);

        let consulted = self
            .consult(
                flight,
                &self.inner.reasoning_tier,
                self.inner.reasoner.as_ref(),
                budget,
            )
            .await
            .and_then(|suggestion| self.target_from(suggestion));
        match consulted {
            Ok(target) => CascadeState::Execute(Decision::Reasoned { target }),
            Err(e) => CascadeState::Record(Err(e)),
        }
    }

    /// Wake an inference tier and ask it for a routing.
    async fn consult(
        &self,
        flight: &mut Flight,
        tier: &TierId,
        service: &dyn InferenceAdapter,
        budget: Budget,
    ) -> Result<RouteSuggestion, ActivatorError> {
        let lease = budget.run(self.inner.activator.activate(tier)).await?;
        flight.leases.push(lease);
        let request = InferenceRequest {
            text: flight.query.text.clone(),
            context: flight.query.context.clone(),
        };
        budget.run(service.infer(request)).await
    }

    fn target_from(&self, suggestion: RouteSuggestion) -> Result<Target, ActivatorError> {
        if suggestion.tool.trim().is_empty() {
            return Err(ActivatorError::inference("suggestion names no tool"));
        }
        let tier = if suggestion.tier.as_str().is_empty() {
            self.inner.default_execution_tier.clone()
        } else if self.inner.execution_tiers.contains(&suggestion.tier) {
            suggestion.tier
        } else {
            return Err(ActivatorError::inference(format!(
                "suggested tier `{}` is not an execution tier",
                suggestion.tier
            )));
        };
        let parameters = match suggestion.parameters {
            serde_json::Value::Null => serde_json::json!({}),
            other => other,
        };
        Ok(Target {
            requires_confirmation: self.inner.matcher.requires_confirmation(&suggestion.tool),
            tier,
            tool: suggestion.tool,
            parameters,
            confidence: suggestion.confidence,
        })
    }

    async fn execute(&self, flight: &mut Flight, decision: Decision) -> CascadeState {
        let route_type = decision.route_type();
        let classifier_budget = Duration::from_secs(self.inner.routing.classifier_budget_secs);
        let budget = *flight
            .budget
            .get_or_insert_with(|| Budget::start(classifier_budget));
        let target = decision.target().clone();
        flight.decision = Some(decision);

        match self.invoke(flight, &target, budget).await {
            Ok(result) => CascadeState::Record(Ok(result)),
            Err(e) => {
                if route_type != RouteType::Slm
                    && let Some(reason) = EscalationReason::from_error(&e)
                {
                    flight.decision = None;
                    return CascadeState::Escalate {
                        from: route_type,
                        reason,
                    };
                }
                CascadeState::Record(Err(e))
            }
        }
    }

    /// Wake the execution tier and run the tool.
    async fn invoke(
        &self,
        flight: &mut Flight,
        target: &Target,
        budget: Budget,
    ) -> Result<ExecutionResult, ActivatorError> {
        let lease = budget.run(self.inner.activator.activate(&target.tier)).await?;
        flight.leases.push(lease);

        let request = ExecutionRequest {
            query_id: flight.query.id.clone(),
            tool: target.tool.clone(),
            parameters: target.parameters.clone(),
        };
        let started = Instant::now();
        match budget.run(self.inner.executor.execute(request)).await {
            Ok(result) => Ok(result),
            Err(e @ ActivatorError::BudgetExceeded { .. }) => Err(e),
            Err(e) => Ok(ExecutionResult {
                success: false,
                output: serde_json::Value::Null,
                error: Some(e.to_string()),
                latency: started.elapsed(),
            }),
        }
    }

    fn record(
        &self,
        mut flight: Flight,
        result: Result<ExecutionResult, ActivatorError>,
    ) -> Result<RouteOutcome, ActivatorError> {
        let (success, error_type) = match &result {
            Ok(execution) if execution.success => (true, None),
            Ok(_) => (false, Some("execution")),
            Err(e) => (false, Some(e.error_type())),
        };
        let (routing, outcome) = flight.records(success, error_type);
        let latency_ms = outcome.latency_ms;
        let route_type = routing.route_type;
        flight.recorded = true;
        self.inner.recorder.submit(routing, outcome);
        record_route_latency(flight.started.elapsed().as_secs_f64());

        let execution = match result {
            Ok(execution) => execution,
            Err(e) => {
                warn!(query_id = %flight.query.id, route_type = %route_type, error = %e, "routing failed");
                return Err(e);
            }
        };
        let Some(decision) = flight.decision.as_ref() else {
            return Err(ActivatorError::Internal(
                "executed without a decision".into(),
            ));
        };
        let target = decision.target();
        record_route(route_type.as_str());
        info!(
            query_id = %flight.query.id,
            route_type = %route_type,
            tier = %target.tier,
            tool = %target.tool,
            success,
            latency_ms,
            "query routed"
        );

        Ok(RouteOutcome {
            query_id: flight.query.id.clone(),
            route_type,
            tier: target.tier.clone(),
            tool: target.tool.clone(),
            confidence: target.confidence,
            requires_confirmation: target.requires_confirmation,
            complexity: flight.complexity,
            escalations: flight.escalations.clone(),
            success,
            output: execution.output,
            error: execution.error,
            latency_ms,
        })
    }
}
