// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stand-ins for collaborators with no configured endpoint.
//!
//! A router without a classifier still answers keyword and similarity
//! routes; queries that reach an unconfigured tier fail with the error
//! kind that tier would produce.

use async_trait::async_trait;

use activator_core::{
    ActivatorError, AdapterType, ClusterControl, ExecutionAdapter, ExecutionRequest,
    ExecutionResult, HealthStatus, InferenceAdapter, InferenceRequest, PluginAdapter,
    RouteSuggestion, TierId, TierStatus,
};

/// Inference tier with no endpoint. Every call is an inference error.
pub struct UnconfiguredInference {
    name: String,
}

impl UnconfiguredInference {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl PluginAdapter for UnconfiguredInference {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Inference
    }

    async fn health_check(&self) -> Result<HealthStatus, ActivatorError> {
        Ok(HealthStatus::Degraded(format!("{} endpoint not configured", self.name)))
    }
}

#[async_trait]
impl InferenceAdapter for UnconfiguredInference {
    async fn infer(&self, _request: InferenceRequest) -> Result<RouteSuggestion, ActivatorError> {
        Err(ActivatorError::inference(format!(
            "{} endpoint not configured",
            self.name
        )))
    }
}

/// Cluster control for always-on deployments: every tier reports one ready
/// replica and scale requests are accepted without effect.
#[derive(Default)]
pub struct StaticCluster;

#[async_trait]
impl PluginAdapter for StaticCluster {
    fn name(&self) -> &str {
        "static-cluster"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cluster
    }
}

#[async_trait]
impl ClusterControl for StaticCluster {
    async fn scale(&self, _tier: &TierId, _replicas: u32) -> Result<(), ActivatorError> {
        Ok(())
    }

    async fn get_status(&self, _tier: &TierId) -> Result<TierStatus, ActivatorError> {
        Ok(TierStatus {
            replicas: 1,
            ready: true,
        })
    }
}

/// Execution capability with no endpoint.
#[derive(Default)]
pub struct UnconfiguredExecutor;

#[async_trait]
impl PluginAdapter for UnconfiguredExecutor {
    fn name(&self) -> &str {
        "unconfigured-executor"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Execution
    }

    async fn health_check(&self) -> Result<HealthStatus, ActivatorError> {
        Ok(HealthStatus::Degraded("execution endpoint not configured".into()))
    }
}

#[async_trait]
impl ExecutionAdapter for UnconfiguredExecutor {
    async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, ActivatorError> {
        Err(ActivatorError::Execution {
            tool: request.tool,
            message: "execution endpoint not configured".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activator_core::QueryId;

    #[tokio::test]
    async fn unconfigured_inference_escalates() {
        let classifier = UnconfiguredInference::new("classifier");
        let err = classifier
            .infer(InferenceRequest {
                text: "anything".into(),
                context: Default::default(),
            })
            .await
            .unwrap_err();
        assert!(err.is_escalation_trigger());
        assert!(err.to_string().contains("classifier"));
    }

    #[tokio::test]
    async fn static_cluster_is_always_ready() {
        let cluster = StaticCluster;
        let tier = TierId::new("reasoning");
        cluster.scale(&tier, 1).await.unwrap();
        assert_eq!(
            cluster.get_status(&tier).await.unwrap(),
            TierStatus {
                replicas: 1,
                ready: true
            }
        );
    }

    #[tokio::test]
    async fn unconfigured_executor_names_the_tool() {
        let err = UnconfiguredExecutor
            .execute(ExecutionRequest {
                query_id: QueryId("q".into()),
                tool: "get_pods".into(),
                parameters: serde_json::json!({}),
            })
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "execution");
        assert!(err.to_string().contains("get_pods"));
    }
}
