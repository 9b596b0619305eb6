// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cluster control over HTTP.
//!
//! `POST {base}/tiers/{id}/scale` with `{replicas}`;
//! `GET {base}/tiers/{id}/status` answered by `{replicas, ready}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use activator_core::{
    ActivatorError, AdapterType, ClusterControl, PluginAdapter, TierId, TierStatus,
};

use crate::http::{HttpError, JsonClient};

#[derive(Serialize)]
struct ScaleRequest {
    replicas: u32,
}

/// Remote cluster control endpoint.
pub struct RemoteCluster {
    http: JsonClient,
}

impl RemoteCluster {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ActivatorError> {
        let http = JsonClient::new(base_url, timeout)
            .map_err(|e| ActivatorError::Internal(format!("failed to build cluster client: {e}")))?;
        Ok(Self { http })
    }
}

fn cluster_error(err: HttpError) -> ActivatorError {
    ActivatorError::Internal(format!("cluster control: {err}"))
}

#[async_trait]
impl PluginAdapter for RemoteCluster {
    fn name(&self) -> &str {
        "remote-cluster"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cluster
    }
}

#[async_trait]
impl ClusterControl for RemoteCluster {
    async fn scale(&self, tier: &TierId, replicas: u32) -> Result<(), ActivatorError> {
        self.http
            .post_unit(&format!("/tiers/{tier}/scale"), &ScaleRequest { replicas })
            .await
            .map_err(cluster_error)
    }

    async fn get_status(&self, tier: &TierId) -> Result<TierStatus, ActivatorError> {
        self.http
            .get(&format!("/tiers/{tier}/status"))
            .await
            .map_err(cluster_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn scale_posts_replica_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tiers/classifier/scale"))
            .and(body_json(serde_json::json!({"replicas": 1})))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let cluster = RemoteCluster::new(&server.uri(), Duration::from_secs(5)).unwrap();
        cluster.scale(&TierId::new("classifier"), 1).await.unwrap();
    }

    #[tokio::test]
    async fn status_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tiers/executor/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"replicas": 1, "ready": true})),
            )
            .mount(&server)
            .await;

        let cluster = RemoteCluster::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let status = cluster.get_status(&TierId::new("executor")).await.unwrap();
        assert_eq!(status, TierStatus { replicas: 1, ready: true });
    }

    #[tokio::test]
    async fn rejected_scale_is_internal_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tiers/reasoning/scale"))
            .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let cluster = RemoteCluster::new(&server.uri(), Duration::from_secs(5)).unwrap();
        let err = cluster.scale(&TierId::new("reasoning"), 1).await.unwrap_err();
        assert!(matches!(err, ActivatorError::Internal(ref m) if m.contains("quota exceeded")));
    }
}
