// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end routing tests.
//!
//! `TestHarness` assembles a complete router with mock collaborators, a
//! hash embedder, and a fault-injecting routing store (in-memory by default,
//! or SQLite in a temp directory).

use std::collections::BTreeMap;
use std::sync::Arc;

use activator_config::model::ActivatorConfig;
use activator_core::{ActivatorError, Query, RoutingStore};
use activator_memory::{HashEmbedder, InMemoryRoutingStore, SqliteRoutingStore, VectorStoreClient};
use activator_router::{Collaborators, RouteOutcome, Router};
use activator_scaling::TierActivator;

use crate::faulty_store::FaultyStore;
use crate::mock_cluster::MockClusterControl;
use crate::mock_executor::MockExecutor;
use crate::mock_inference::MockInference;

/// Builder for test environments.
pub struct TestHarnessBuilder {
    config: ActivatorConfig,
    cluster: Option<MockClusterControl>,
    classifier: Option<MockInference>,
    reasoner: Option<MockInference>,
    executor: Option<MockExecutor>,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ActivatorConfig::default();
        config.tiers.poll_interval_ms = 10;
        config.storage.retry_delay_ms = 20;
        Self {
            config,
            cluster: None,
            classifier: None,
            reasoner: None,
            executor: None,
            sqlite: false,
        }
    }

    /// Start from an explicit configuration.
    pub fn with_config(mut self, config: ActivatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_cluster(mut self, cluster: MockClusterControl) -> Self {
        self.cluster = Some(cluster);
        self
    }

    pub fn with_classifier(mut self, classifier: MockInference) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_reasoner(mut self, reasoner: MockInference) -> Self {
        self.reasoner = Some(reasoner);
        self
    }

    pub fn with_executor(mut self, executor: MockExecutor) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Back the store with SQLite in a temp directory.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, ActivatorError> {
        let mut config = self.config;
        let temp_dir = tempfile::TempDir::new().map_err(ActivatorError::storage)?;

        let inner: Arc<dyn RoutingStore> = if self.sqlite {
            config.storage.database_path = temp_dir
                .path()
                .join("routing.db")
                .to_string_lossy()
                .to_string();
            Arc::new(SqliteRoutingStore::new(config.storage.clone()))
        } else {
            Arc::new(InMemoryRoutingStore::new())
        };
        let store = Arc::new(FaultyStore::new(inner));
        store.initialize().await?;

        let cluster = Arc::new(self.cluster.unwrap_or_default());
        let classifier = Arc::new(
            self.classifier
                .unwrap_or_else(|| MockInference::new("mock-classifier")),
        );
        let reasoner = Arc::new(
            self.reasoner
                .unwrap_or_else(|| MockInference::new("mock-reasoner")),
        );
        let executor = Arc::new(self.executor.unwrap_or_default());

        let vectors = VectorStoreClient::new(
            Arc::new(HashEmbedder::new(config.embedding.dimensions)),
            store.clone(),
        );
        let activator = TierActivator::from_config(&config.tiers, cluster.clone());
        let router = Router::new(
            &config,
            Collaborators {
                vectors: vectors.clone(),
                activator: activator.clone(),
                classifier: classifier.clone(),
                reasoner: reasoner.clone(),
                executor: executor.clone(),
            },
        )?;

        Ok(TestHarness {
            router,
            activator,
            vectors,
            store,
            cluster,
            classifier,
            reasoner,
            executor,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A router wired to mock collaborators, with every part exposed for assertions.
pub struct TestHarness {
    pub router: Router,
    pub activator: TierActivator,
    pub vectors: VectorStoreClient,
    pub store: Arc<FaultyStore>,
    pub cluster: Arc<MockClusterControl>,
    pub classifier: Arc<MockInference>,
    pub reasoner: Arc<MockInference>,
    pub executor: Arc<MockExecutor>,
    pub config: ActivatorConfig,
    /// Temp directory kept alive for SQLite cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Route one query through the full cascade.
    pub async fn route(&self, text: &str) -> Result<RouteOutcome, ActivatorError> {
        self.router.route(Query::new(text)).await
    }

    /// Route one query carrying a context map.
    pub async fn route_with_context(
        &self,
        text: &str,
        context: BTreeMap<String, serde_json::Value>,
    ) -> Result<RouteOutcome, ActivatorError> {
        self.router
            .route(Query::new(text).with_context(context))
            .await
    }

    /// Wait for every queued outcome write to land.
    pub async fn settle(&self) {
        self.router.recorder().drain().await;
    }

    /// Route `text` `n` times, settling after each so statistics accumulate.
    pub async fn seed(&self, text: &str, n: usize) -> Result<(), ActivatorError> {
        for _ in 0..n {
            self.route(text).await?;
            self.settle().await;
        }
        Ok(())
    }
}
