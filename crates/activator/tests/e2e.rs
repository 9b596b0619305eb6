// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end routing scenarios.
//!
//! Each test builds an isolated TestHarness with mock collaborators and runs
//! queries through the full cascade, from keyword matching to the recorded
//! outcome.

use std::time::Duration;

use activator_core::{OutcomeRecord, QueryId, RouteType, RoutingRecord, RoutingStore, TierId};
use activator_test_utils::{MockClusterControl, MockInference, TestHarness};
use futures::future::join_all;

const CLASSIFIED_QUERY: &str = "drain node worker-3 for maintenance";

/// Store `n` successful classifier routings of `text` to `tool`.
async fn record_prior_successes(harness: &TestHarness, text: &str, tool: &str, n: usize) {
    let embedding = harness.vectors.embed(text).await.unwrap();
    let store = harness.store.inner();
    for i in 0..n {
        let query_id = QueryId(format!("prior-{i}"));
        let now = chrono::Utc::now().to_rfc3339();
        store
            .insert_routing(&RoutingRecord {
                query_id: query_id.clone(),
                query_text: text.to_string(),
                embedding: embedding.clone(),
                tier: TierId::new("executor"),
                tool: tool.to_string(),
                route_type: RouteType::Classifier,
                confidence: 0.9,
                created_at: now.clone(),
            })
            .await
            .unwrap();
        store
            .insert_outcome(&OutcomeRecord {
                query_id,
                success: true,
                error_type: None,
                latency_ms: 40,
                user_feedback: None,
                created_at: now,
            })
            .await
            .unwrap();
    }
}

// ---- Scenario A: keyword match ----

#[tokio::test]
async fn scenario_a_keyword_match_stays_in_tier_one() {
    let harness = TestHarness::builder().build().await.unwrap();

    let outcome = harness
        .route("block the client with MAC aa:bb:cc:dd:ee:ff")
        .await
        .unwrap();

    assert_eq!(outcome.route_type, RouteType::Keyword);
    assert_eq!(outcome.tool, "block_client");
    assert_eq!(outcome.confidence, 0.95);
    assert!(outcome.success);
    assert_eq!(harness.store.searches(), 0);
    assert_eq!(harness.cluster.woken_tiers(), vec!["executor".to_string()]);

    harness.settle().await;
    let routings = harness.store.routings();
    assert_eq!(routings.len(), 1);
    assert_eq!(routings[0].route_type, RouteType::Keyword);
    assert_eq!(routings[0].tool, "block_client");
}

// ---- Scenario B: complex query goes straight to reasoning ----

#[tokio::test]
async fn scenario_b_complex_query_routes_to_reasoning() {
    let harness = TestHarness::builder()
        .with_classifier(MockInference::suggesting("classifier", "get_logs", 0.9))
        .with_reasoner(MockInference::suggesting("reasoning", "get_logs", 0.85))
        .build()
        .await
        .unwrap();

    let outcome = harness
        .route("investigate high latency on switch 3")
        .await
        .unwrap();

    assert_eq!(outcome.route_type, RouteType::Slm);
    assert_eq!(outcome.complexity, Some(50));
    assert_eq!(outcome.tool, "get_logs");
    assert!(outcome.escalations.is_empty());
    assert_eq!(harness.classifier.calls(), 0);
    assert_eq!(harness.reasoner.calls(), 1);
    assert_eq!(harness.cluster.scale_calls_for("reasoning"), 1);
    assert_eq!(harness.cluster.scale_calls_for("classifier"), 0);
    assert_eq!(harness.config.routing.reasoning_budget_secs, 60);
}

// ---- Scenario C: trusted similarity hit is reused ----

#[tokio::test]
async fn scenario_c_trusted_history_is_reused() {
    let harness = TestHarness::builder()
        .with_classifier(MockInference::suggesting("classifier", "cordon_node", 0.9))
        .with_reasoner(MockInference::suggesting("reasoning", "cordon_node", 0.9))
        .build()
        .await
        .unwrap();
    record_prior_successes(&harness, CLASSIFIED_QUERY, "cordon_node", 5).await;

    let outcome = harness.route(CLASSIFIED_QUERY).await.unwrap();

    assert_eq!(outcome.route_type, RouteType::Similarity);
    assert_eq!(outcome.tool, "cordon_node");
    assert_eq!(outcome.confidence, 1.0);
    assert_eq!(harness.classifier.calls(), 0);
    assert_eq!(harness.reasoner.calls(), 0);
    assert_eq!(harness.cluster.woken_tiers(), vec!["executor".to_string()]);
}

#[tokio::test]
async fn scenario_c_learning_loop_with_sqlite() {
    let harness = TestHarness::builder()
        .with_sqlite()
        .with_classifier(MockInference::suggesting("classifier", "cordon_node", 0.9))
        .build()
        .await
        .unwrap();

    // Three classified successes make the routing trustworthy.
    harness.seed(CLASSIFIED_QUERY, 3).await.unwrap();
    assert_eq!(harness.classifier.calls(), 3);

    let outcome = harness.route(CLASSIFIED_QUERY).await.unwrap();
    assert_eq!(outcome.route_type, RouteType::Similarity);
    assert_eq!(harness.classifier.calls(), 3);
}

// ---- Scenario D: vector store outage ----

#[tokio::test]
async fn scenario_d_store_outage_does_not_block_routing() {
    let harness = TestHarness::builder()
        .with_classifier(MockInference::suggesting("classifier", "cordon_node", 0.9))
        .build()
        .await
        .unwrap();
    harness.store.set_unreachable(true);

    let keyword = harness.route("list pods in kube-system").await.unwrap();
    assert_eq!(keyword.route_type, RouteType::Keyword);
    assert!(keyword.success);
    // The write is still queued when the response comes back.
    assert_eq!(harness.router.recorder().in_flight(), 1);

    let classified = harness.route(CLASSIFIED_QUERY).await.unwrap();
    assert_eq!(classified.route_type, RouteType::Classifier);
    assert!(classified.success);

    harness.settle().await;
    // One attempt and one retry per request.
    assert_eq!(harness.store.write_attempts(), 4);
    assert!(harness.store.routings().is_empty());
}

// ---- Coalesced activation ----

#[tokio::test]
async fn concurrent_queries_share_one_wake_per_tier() {
    let harness = TestHarness::builder()
        .with_cluster(MockClusterControl::with_ready_after(Duration::from_millis(50)))
        .with_classifier(MockInference::suggesting("classifier", "cordon_node", 0.9))
        .build()
        .await
        .unwrap();

    let queries: Vec<String> = (0..8).map(|i| format!("drain node worker-{i} now")).collect();
    let outcomes = join_all(queries.iter().map(|q| harness.route(q))).await;

    for outcome in outcomes {
        let outcome = outcome.unwrap();
        assert_eq!(outcome.route_type, RouteType::Classifier);
    }
    assert_eq!(harness.cluster.scale_calls_for("classifier"), 1);
    assert_eq!(harness.cluster.scale_calls_for("executor"), 1);
    assert_eq!(harness.activator.pending(&TierId::new("classifier")), 0);
    assert_eq!(harness.activator.pending(&TierId::new("executor")), 0);
}
