// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP clients for the Activator's external collaborators.
//!
//! Each collaborator is optional in `[services]`; a missing endpoint is
//! replaced by a stand-in from [`fallback`].

pub mod cluster;
pub mod embedding;
pub mod execution;
pub mod fallback;
pub mod http;
pub mod inference;

use std::sync::Arc;
use std::time::Duration;

use activator_config::model::ServicesConfig;
use activator_core::{ActivatorError, ClusterControl, ExecutionAdapter, InferenceAdapter};
use tracing::info;

pub use cluster::RemoteCluster;
pub use embedding::RemoteEmbedder;
pub use execution::RemoteExecutor;
pub use fallback::{StaticCluster, UnconfiguredExecutor, UnconfiguredInference};
pub use http::{HttpError, JsonClient};
pub use inference::RemoteInference;

/// Collaborator adapters resolved from `[services]`.
pub struct RemoteServices {
    pub classifier: Arc<dyn InferenceAdapter>,
    pub reasoner: Arc<dyn InferenceAdapter>,
    pub executor: Arc<dyn ExecutionAdapter>,
    pub cluster: Arc<dyn ClusterControl>,
}

impl RemoteServices {
    /// Build remote clients for configured endpoints and stand-ins for the rest.
    pub fn from_config(config: &ServicesConfig) -> Result<Self, ActivatorError> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        let classifier: Arc<dyn InferenceAdapter> = match &config.classifier {
            Some(url) => Arc::new(RemoteInference::new("classifier", url, timeout)?),
            None => Arc::new(UnconfiguredInference::new("classifier")),
        };
        let reasoner: Arc<dyn InferenceAdapter> = match &config.reasoning {
            Some(url) => Arc::new(RemoteInference::new("reasoning", url, timeout)?),
            None => Arc::new(UnconfiguredInference::new("reasoning")),
        };
        let executor: Arc<dyn ExecutionAdapter> = match &config.execution {
            Some(url) => Arc::new(RemoteExecutor::new(url, timeout)?),
            None => Arc::new(UnconfiguredExecutor),
        };
        let cluster: Arc<dyn ClusterControl> = match &config.cluster {
            Some(url) => Arc::new(RemoteCluster::new(url, timeout)?),
            None => {
                info!("no cluster endpoint configured, treating every tier as always ready");
                Arc::new(StaticCluster)
            }
        };

        Ok(Self {
            classifier,
            reasoner,
            executor,
            cluster,
        })
    }
}
