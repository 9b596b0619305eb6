// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Activator query router.
//!
//! This crate provides the error type, the routing domain types, and the
//! adapter traits behind which every external collaborator (embedder, vector
//! store, inference services, cluster control, execution) sits.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ActivatorError;
pub use types::{
    AdapterType, EmbeddingInput, EmbeddingOutput, ExecutionRequest, ExecutionResult,
    HealthStatus, InferenceRequest, OutcomeRecord, Query, QueryId, RouteSuggestion, RouteType,
    RoutingRecord, SimilarityHit, SuccessStatistic, TierId, TierStatus,
};

pub use traits::{
    ClusterControl, EmbeddingAdapter, ExecutionAdapter, InferenceAdapter, PluginAdapter,
    RoutingStore,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;

    use proptest::prelude::*;

    #[test]
    fn activator_error_has_all_variants() {
        let _config = ActivatorError::Config("test".into());
        let _storage = ActivatorError::storage(std::io::Error::other("test"));
        let _timeout = ActivatorError::ActivationTimeout {
            tier: TierId::new("classifier"),
            waited: Duration::from_secs(5),
        };
        let _inference = ActivatorError::inference("test");
        let _execution = ActivatorError::Execution {
            tool: "get_pods".into(),
            message: "boom".into(),
        };
        let _cancelled = ActivatorError::Cancelled;
        let _budget = ActivatorError::BudgetExceeded {
            budget: Duration::from_secs(30),
        };
        let _internal = ActivatorError::Internal("test".into());
    }

    #[test]
    fn escalation_triggers() {
        assert!(
            ActivatorError::ActivationTimeout {
                tier: TierId::new("reasoning"),
                waited: Duration::from_secs(12),
            }
            .is_escalation_trigger()
        );
        assert!(ActivatorError::inference("down").is_escalation_trigger());
        assert!(
            ActivatorError::BudgetExceeded {
                budget: Duration::from_secs(30)
            }
            .is_escalation_trigger()
        );
        assert!(!ActivatorError::Cancelled.is_escalation_trigger());
        assert!(!ActivatorError::storage(std::io::Error::other("x")).is_escalation_trigger());
        assert!(
            !ActivatorError::Execution {
                tool: "t".into(),
                message: "m".into()
            }
            .is_escalation_trigger()
        );
    }

    #[test]
    fn error_type_tags_are_stable() {
        assert_eq!(ActivatorError::Cancelled.error_type(), "cancelled");
        assert_eq!(
            ActivatorError::ActivationTimeout {
                tier: TierId::new("executor"),
                waited: Duration::from_secs(3),
            }
            .error_type(),
            "activation_timeout"
        );
        assert_eq!(
            ActivatorError::Execution {
                tool: "t".into(),
                message: "m".into()
            }
            .error_type(),
            "execution"
        );
    }

    #[test]
    fn execution_error_message_is_verbatim() {
        let err = ActivatorError::Execution {
            tool: "restart_pod".into(),
            message: "pod nginx-0 not found".into(),
        };
        assert_eq!(
            err.to_string(),
            "execution of `restart_pod` failed: pod nginx-0 not found"
        );
    }

    #[test]
    fn route_type_display_and_parse() {
        for rt in [
            RouteType::Keyword,
            RouteType::Similarity,
            RouteType::Classifier,
            RouteType::Slm,
        ] {
            assert_eq!(rt.to_string(), rt.as_str());
            assert_eq!(RouteType::from_str(rt.as_str()).unwrap(), rt);
        }
        let json = serde_json::to_string(&RouteType::Slm).unwrap();
        assert_eq!(json, "\"slm\"");
    }

    #[test]
    fn adapter_type_round_trips() {
        for variant in [
            AdapterType::Embedding,
            AdapterType::Store,
            AdapterType::Inference,
            AdapterType::Cluster,
            AdapterType::Execution,
            AdapterType::Observability,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        assert_ne!(HealthStatus::Degraded("slow".into()), healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), healthy);
    }

    #[test]
    fn query_ids_are_unique() {
        let a = Query::new("get pods");
        let b = Query::new("get pods");
        assert_ne!(a.id, b.id);
        assert!(a.context.is_empty());
    }

    #[test]
    fn query_feedback_from_context() {
        let mut ctx = std::collections::BTreeMap::new();
        ctx.insert("feedback".to_string(), serde_json::json!("wrong pod"));
        let q = Query::new("restart pod nginx").with_context(ctx);
        assert_eq!(q.feedback().as_deref(), Some("wrong pod"));

        let mut ctx = std::collections::BTreeMap::new();
        ctx.insert("feedback".to_string(), serde_json::json!({"rating": 5}));
        let q = Query::new("x").with_context(ctx);
        assert_eq!(q.feedback().as_deref(), Some(r#"{"rating":5}"#));

        assert_eq!(Query::new("x").feedback(), None);
    }

    #[test]
    fn tier_id_serializes_transparently() {
        let tier = TierId::from("reasoning");
        assert_eq!(serde_json::to_string(&tier).unwrap(), "\"reasoning\"");
        assert_eq!(tier.to_string(), "reasoning");
    }

    #[test]
    fn success_statistic_thresholds_are_inclusive() {
        let stat = SuccessStatistic {
            route_type: RouteType::Keyword,
            tool: "get_pods".into(),
            attempts: 5,
            successes: 4,
        };
        assert!(stat.is_trustworthy(5, 0.8));
        assert!(!stat.is_trustworthy(6, 0.8));
        assert!(!stat.is_trustworthy(3, 0.81));
        assert_eq!(stat.failures(), 1);

        let empty = SuccessStatistic::empty(RouteType::Slm, "x");
        assert_eq!(empty.success_rate(), 0.0);
        assert!(!empty.is_trustworthy(0, 0.1));
    }

    proptest! {
        #[test]
        fn success_rate_is_a_fraction(attempts in 0u64..10_000, successes in 0u64..10_000) {
            let successes = successes.min(attempts);
            let stat = SuccessStatistic {
                route_type: RouteType::Similarity,
                tool: "t".into(),
                attempts,
                successes,
            };
            let rate = stat.success_rate();
            prop_assert!((0.0..=1.0).contains(&rate));
            prop_assert_eq!(stat.failures() + stat.successes, attempts);
        }
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_embedding_adapter<T: EmbeddingAdapter>() {}
        fn _assert_routing_store<T: RoutingStore>() {}
        fn _assert_inference_adapter<T: InferenceAdapter>() {}
        fn _assert_cluster_control<T: ClusterControl>() {}
        fn _assert_execution_adapter<T: ExecutionAdapter>() {}
    }
}
