// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the routing API.
//!
//! Handles POST /v1/route, GET /v1/tiers, GET /health, GET /metrics.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use activator_core::{ActivatorError, Query};
use activator_scaling::TierSnapshot;

use crate::server::GatewayState;

/// Request body for POST /v1/route.
#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    /// Natural-language query.
    pub text: String,
    /// Optional context forwarded to inference services. A `feedback` entry
    /// is stored with the outcome.
    #[serde(default)]
    pub context: BTreeMap<String, serde_json::Value>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Response body for GET /v1/tiers.
#[derive(Debug, Serialize)]
pub struct TiersResponse {
    pub tiers: Vec<TierSnapshot>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error description.
    pub error: String,
    /// Stable error kind, matching the persisted outcome `error_type`.
    pub error_type: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            error_type: error_type.into(),
        }
    }
}

/// HTTP status for a failed route.
pub fn status_for(err: &ActivatorError) -> StatusCode {
    match err {
        ActivatorError::Config(_) => StatusCode::BAD_REQUEST,
        ActivatorError::ActivationTimeout { .. } | ActivatorError::BudgetExceeded { .. } => {
            StatusCode::GATEWAY_TIMEOUT
        }
        ActivatorError::Inference { .. } | ActivatorError::Execution { .. } => {
            StatusCode::BAD_GATEWAY
        }
        ActivatorError::Storage { .. } | ActivatorError::Cancelled => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        ActivatorError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// POST /v1/route
///
/// Routes the query through the cascade and executes the chosen tool. The
/// route is abandoned when the client disconnects or the server shuts down.
pub async fn post_route(
    State(state): State<GatewayState>,
    Json(body): Json<RouteRequest>,
) -> Response {
    if body.text.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("query text is empty", "invalid_request")),
        )
            .into_response();
    }

    let query = Query::new(body.text).with_context(body.context);
    let query_id = query.id.clone();

    match state.router.route_until(query, &state.shutdown).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => {
            tracing::warn!(query_id = %query_id, error = %err, "route failed");
            (
                status_for(&err),
                Json(ErrorResponse::new(err.to_string(), err.error_type())),
            )
                .into_response()
        }
    }
}

/// GET /v1/tiers
///
/// Returns the phase, replica count, and pending requests of every tier.
pub async fn get_tiers(State(state): State<GatewayState>) -> Json<TiersResponse> {
    Json(TiersResponse {
        tiers: state.router.activator().snapshot(),
    })
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.health.service_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}

/// GET /metrics
///
/// Prometheus text format. 404 when no recorder is installed.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activator_core::TierId;
    use std::time::Duration;

    #[test]
    fn route_request_deserializes_without_context() {
        let req: RouteRequest = serde_json::from_str(r#"{"text": "list pods"}"#).unwrap();
        assert_eq!(req.text, "list pods");
        assert!(req.context.is_empty());
    }

    #[test]
    fn route_request_keeps_feedback_context() {
        let req: RouteRequest =
            serde_json::from_str(r#"{"text": "list pods", "context": {"feedback": "wrong pod"}}"#)
                .unwrap();
        assert_eq!(req.context["feedback"], "wrong pod");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_for(&ActivatorError::ActivationTimeout {
                tier: TierId::new("reasoning"),
                waited: Duration::from_secs(12),
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&ActivatorError::inference("no route")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&ActivatorError::Cancelled),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&ActivatorError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn error_response_serializes() {
        let json =
            serde_json::to_string(&ErrorResponse::new("tier busy", "activation_timeout")).unwrap();
        assert!(json.contains("\"error\":\"tier busy\""));
        assert!(json.contains("\"error_type\":\"activation_timeout\""));
    }
}
