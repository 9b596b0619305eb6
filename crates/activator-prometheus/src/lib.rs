// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for the Activator.
//!
//! Uses the metrics-rs facade with the Prometheus exporter. Metrics are
//! rendered in Prometheus text format via [`PrometheusAdapter::render`], which
//! the gateway serves at `/metrics`. The `pending_requests{tier}` gauge is the
//! signal the external autoscaler scales tiers on.

pub mod recording;

use async_trait::async_trait;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use activator_core::{ActivatorError, AdapterType, HealthStatus, PluginAdapter};

pub use recording::{
    PENDING_REQUESTS, record_activation, record_escalation, record_route, record_route_latency,
    record_storage_error, register_metrics, set_pending_requests,
};

/// Prometheus metrics adapter.
///
/// Installs the Prometheus recorder and exposes a handle for rendering
/// metrics in Prometheus text format.
pub struct PrometheusAdapter {
    handle: PrometheusHandle,
}

impl PrometheusAdapter {
    /// Install the Prometheus recorder globally.
    ///
    /// Only one recorder can be installed per process; a second call fails.
    pub fn new() -> Result<Self, ActivatorError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            ActivatorError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        recording::register_metrics();

        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Get a reference to the Prometheus handle for rendering.
    pub fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

#[async_trait]
impl PluginAdapter for PrometheusAdapter {
    fn name(&self) -> &str {
        "prometheus"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Observability
    }

    async fn health_check(&self) -> Result<HealthStatus, ActivatorError> {
        Ok(HealthStatus::Healthy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Render what `f` records through a thread-local recorder.
    fn render_with(f: impl FnOnce()) -> String {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, f);
        handle.render()
    }

    #[test]
    fn pending_requests_gauge_carries_tier_label() {
        let out = render_with(|| {
            set_pending_requests("classifier", 3);
            set_pending_requests("reasoning", 0);
        });
        assert!(out.contains(r#"pending_requests{tier="classifier"} 3"#), "{out}");
        assert!(out.contains(r#"pending_requests{tier="reasoning"} 0"#), "{out}");
    }

    #[test]
    fn route_and_escalation_counters() {
        let out = render_with(|| {
            record_route("keyword");
            record_route("keyword");
            record_escalation("low_confidence");
            record_storage_error("search");
        });
        assert!(out.contains(r#"activator_routes_total{route_type="keyword"} 2"#), "{out}");
        assert!(out.contains(r#"activator_escalations_total{reason="low_confidence"} 1"#), "{out}");
        assert!(out.contains(r#"activator_storage_errors_total{op="search"} 1"#), "{out}");
    }

    #[test]
    fn helpers_are_noops_without_recorder() {
        set_pending_requests("executor", 1);
        record_activation("executor", 0.25);
        record_route_latency(1.5);
    }
}
