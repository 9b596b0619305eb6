// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `activator serve` command implementation.
//!
//! Wires the routing store, embedder, remote collaborators, tier activator,
//! cooldown monitor, and router together, then serves the gateway until
//! SIGINT/SIGTERM. Queued outcome writes are drained before exit.

use std::sync::Arc;
use std::time::Duration;

use activator_config::model::{ActivatorConfig, StorageBackend};
use activator_config::rule_warnings;
use activator_core::{ActivatorError, EmbeddingAdapter, RoutingStore};
use activator_gateway::{AuthConfig, GatewayState, HealthState};
use activator_memory::{HashEmbedder, InMemoryRoutingStore, SqliteRoutingStore, VectorStoreClient};
use activator_prometheus::PrometheusAdapter;
use activator_remote::{RemoteEmbedder, RemoteServices};
use activator_router::{Collaborators, Router};
use activator_scaling::{CooldownMonitor, TierActivator};
use tracing::{info, warn};

use crate::shutdown;

/// Runs the `activator serve` command.
pub async fn run_serve(config: ActivatorConfig) -> Result<(), ActivatorError> {
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting activator serve");

    for warning in rule_warnings(&config.rules) {
        warn!(%warning, "ambiguous keyword rule");
    }

    let prometheus = PrometheusAdapter::new()?;
    let metrics_handle = prometheus.handle().clone();

    let store = open_store(&config).await?;
    let embedder = build_embedder(&config)?;
    let vectors = VectorStoreClient::new(embedder, store);

    let services = RemoteServices::from_config(&config.services)?;
    let activator = TierActivator::from_config(&config.tiers, services.cluster.clone());

    let router = Router::new(
        &config,
        Collaborators {
            vectors,
            activator: activator.clone(),
            classifier: services.classifier,
            reasoner: services.reasoner,
            executor: services.executor,
        },
    )?;
    info!(rules = config.rules.len(), "router ready");

    let cancel = shutdown::install_signal_handler();

    let monitor = CooldownMonitor::from_config(activator.clone(), &config.tiers);
    let monitor_task = tokio::spawn(monitor.run(cancel.clone()));

    let state = GatewayState {
        router: router.clone(),
        auth: AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
        health: HealthState {
            start_time: std::time::Instant::now(),
            service_name: config.service.name.clone(),
            prometheus_render: Some(Arc::new(move || metrics_handle.render())),
        },
        shutdown: cancel.clone(),
    };

    let served = activator_gateway::start_server(&config.gateway, state).await;
    // A bind failure returns before any signal arrives.
    cancel.cancel();

    if let Err(e) = monitor_task.await {
        warn!(error = %e, "cooldown monitor task failed");
    }

    let queued = router.recorder().in_flight();
    if queued > 0 {
        info!(queued, "draining outcome writes");
    }
    router.recorder().drain().await;
    activator.shutdown().await;

    info!("activator serve shutdown complete");
    served
}

async fn open_store(config: &ActivatorConfig) -> Result<Arc<dyn RoutingStore>, ActivatorError> {
    let store: Arc<dyn RoutingStore> = match config.storage.backend {
        StorageBackend::Sqlite => Arc::new(SqliteRoutingStore::new(config.storage.clone())),
        StorageBackend::Memory => {
            warn!("in-memory routing store: learned routes are lost on restart");
            Arc::new(InMemoryRoutingStore::new())
        }
    };
    store.initialize().await?;
    info!(backend = ?config.storage.backend, "routing store initialized");
    Ok(store)
}

fn build_embedder(config: &ActivatorConfig) -> Result<Arc<dyn EmbeddingAdapter>, ActivatorError> {
    let dimensions = config.embedding.dimensions;
    Ok(match &config.embedding.endpoint {
        Some(url) => {
            let timeout = Duration::from_secs(config.services.request_timeout_secs);
            Arc::new(RemoteEmbedder::new(url, dimensions, timeout)?)
        }
        None => Arc::new(HashEmbedder::new(dimensions)),
    })
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("activator={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
