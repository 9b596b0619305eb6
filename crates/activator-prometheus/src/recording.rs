// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any installed recorder collects these; with no
//! recorder installed every call is a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Autoscaler trigger gauge. The name and the `tier` label are read by the
/// external autoscaler and must not change.
pub const PENDING_REQUESTS: &str = "pending_requests";

/// Register all Activator metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_gauge!(
        PENDING_REQUESTS,
        "Requests waiting on or holding a tier; >= 1 triggers scale-up"
    );
    describe_counter!(
        "activator_routes_total",
        "Routing decisions by the cascade tier that produced them"
    );
    describe_counter!(
        "activator_escalations_total",
        "Cascade escalations by reason"
    );
    describe_histogram!(
        "activator_activation_seconds",
        "Time from wake request to tier readiness"
    );
    describe_counter!(
        "activator_storage_errors_total",
        "Routing store failures by operation"
    );
    describe_histogram!(
        "activator_route_latency_seconds",
        "End-to-end request latency including execution"
    );
}

/// Publish the pending-request count of a tier.
pub fn set_pending_requests(tier: &str, pending: u64) {
    metrics::gauge!(PENDING_REQUESTS, "tier" => tier.to_string()).set(pending as f64);
}

/// Record a routing decision.
pub fn record_route(route_type: &str) {
    metrics::counter!("activator_routes_total", "route_type" => route_type.to_string())
        .increment(1);
}

/// Record an escalation.
pub fn record_escalation(reason: &str) {
    metrics::counter!("activator_escalations_total", "reason" => reason.to_string()).increment(1);
}

/// Record how long a tier took to become ready.
pub fn record_activation(tier: &str, seconds: f64) {
    metrics::histogram!("activator_activation_seconds", "tier" => tier.to_string())
        .record(seconds);
}

/// Record a routing store failure.
pub fn record_storage_error(op: &str) {
    metrics::counter!("activator_storage_errors_total", "op" => op.to_string()).increment(1);
}

/// Record end-to-end request latency.
pub fn record_route_latency(seconds: f64) {
    metrics::histogram!("activator_route_latency_seconds").record(seconds);
}
