// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed routing store with vector BLOB storage.
//!
//! All statements run on tokio-rusqlite's background thread. The outcome
//! insert and the statistic update share one transaction, and the outcome
//! table is keyed by query id, so replays are detected by the database itself.

use async_trait::async_trait;
use rusqlite::OptionalExtension;
use tokio::sync::OnceCell;
use tokio_rusqlite::Connection;
use tracing::debug;

use activator_config::model::StorageConfig;
use activator_core::{
    ActivatorError, AdapterType, HealthStatus, OutcomeRecord, PluginAdapter, QueryId,
    RouteType, RoutingRecord, RoutingStore, SimilarityHit, SuccessStatistic, TierId,
};

use crate::memory_store::counts_toward_statistics;
use crate::types::{blob_to_vec, cosine_similarity, vec_to_blob};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Helper to convert tokio_rusqlite errors into ActivatorError::Storage.
fn storage_err(e: tokio_rusqlite::Error) -> ActivatorError {
    ActivatorError::Storage {
        source: Box::new(e),
    }
}

/// SQLite [`RoutingStore`]. Opened lazily by [`RoutingStore::initialize`].
pub struct SqliteRoutingStore {
    config: StorageConfig,
    conn: OnceCell<Connection>,
}

impl SqliteRoutingStore {
    /// Create a store for `config.database_path`. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            conn: OnceCell::new(),
        }
    }

    fn conn(&self) -> Result<&Connection, ActivatorError> {
        self.conn
            .get()
            .ok_or_else(|| ActivatorError::storage("routing store not initialized"))
    }

    async fn open(&self) -> Result<Connection, ActivatorError> {
        let path = self.config.database_path.clone();
        if let Some(parent) = std::path::Path::new(&path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ActivatorError::storage)?;
        }

        let conn = Connection::open(&path)
            .await
            .map_err(ActivatorError::storage)?;
        let wal_mode = self.config.wal_mode;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
            }
            conn.busy_timeout(std::time::Duration::from_secs(5))?;
            embedded::migrations::runner()
                .run(conn)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Ok(())
        })
        .await
        .map_err(storage_err)?;
        debug!(path = %path, wal_mode, "routing store opened");
        Ok(conn)
    }
}

#[async_trait]
impl PluginAdapter for SqliteRoutingStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Store
    }

    async fn health_check(&self) -> Result<HealthStatus, ActivatorError> {
        let Ok(conn) = self.conn() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        match conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
        {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }
}

#[async_trait]
impl RoutingStore for SqliteRoutingStore {
    async fn initialize(&self) -> Result<(), ActivatorError> {
        self.conn.get_or_try_init(|| self.open()).await?;
        Ok(())
    }

    async fn search_similar(
        &self,
        embedding: &[f32],
        threshold: f32,
    ) -> Result<Option<SimilarityHit>, ActivatorError> {
        let query = embedding.to_vec();
        self.conn()?
            .call(move |conn| -> Result<Option<SimilarityHit>, rusqlite::Error> {
                let mut best: Option<(String, f32)> = None;
                {
                    let mut stmt = conn.prepare(
                        "SELECT query_id, embedding FROM routing_records WHERE tool != '' ORDER BY rowid ASC",
                    )?;
                    let mut rows = stmt.query([])?;
                    while let Some(row) = rows.next()? {
                        let blob: Vec<u8> = row.get(1)?;
                        let score = cosine_similarity(&query, &blob_to_vec(&blob));
                        if score >= threshold && best.as_ref().is_none_or(|(_, s)| score > *s) {
                            best = Some((row.get(0)?, score));
                        }
                    }
                }

                let Some((query_id, similarity)) = best else {
                    return Ok(None);
                };
                let Some(record) = load_routing(conn, &query_id)? else {
                    return Ok(None);
                };
                let statistic = load_statistic(conn, record.route_type, &record.tool)?;
                Ok(Some(SimilarityHit {
                    record,
                    similarity,
                    statistic,
                }))
            })
            .await
            .map_err(storage_err)
    }

    async fn insert_routing(&self, record: &RoutingRecord) -> Result<(), ActivatorError> {
        let query_id = record.query_id.0.clone();
        let query_text = record.query_text.clone();
        let embedding = vec_to_blob(&record.embedding);
        let tier = record.tier.0.clone();
        let tool = record.tool.clone();
        let route_type = record.route_type.as_str();
        let confidence = record.confidence;
        let created_at = record.created_at.clone();

        self.conn()?
            .call(move |conn| -> Result<(), rusqlite::Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO routing_records (query_id, query_text, embedding, tier, tool, route_type, confidence, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![query_id, query_text, embedding, tier, tool, route_type, confidence, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_err)
    }

    async fn insert_outcome(&self, outcome: &OutcomeRecord) -> Result<bool, ActivatorError> {
        let outcome = outcome.clone();
        self.conn()?
            .call(move |conn| -> Result<bool, rusqlite::Error> {
                let tx = conn.transaction()?;
                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO outcome_records (query_id, success, error_type, latency_ms, user_feedback, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    rusqlite::params![
                        outcome.query_id.0,
                        outcome.success,
                        outcome.error_type,
                        outcome.latency_ms as i64,
                        outcome.user_feedback,
                        outcome.created_at,
                    ],
                )?;
                if inserted == 0 {
                    return Ok(false);
                }

                let route: Option<(String, String)> = tx
                    .query_row(
                        "SELECT route_type, tool FROM routing_records WHERE query_id = ?1",
                        rusqlite::params![outcome.query_id.0],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;
                if let Some((route_type, tool)) = route
                    && counts_toward_statistics(&outcome, &tool)
                {
                    tx.execute(
                        "INSERT INTO success_stats (route_type, tool, attempts, successes) VALUES (?1, ?2, 1, ?3)
                         ON CONFLICT(route_type, tool) DO UPDATE SET attempts = attempts + 1, successes = successes + excluded.successes",
                        rusqlite::params![route_type, tool, outcome.success as i64],
                    )?;
                }
                tx.commit()?;
                Ok(true)
            })
            .await
            .map_err(storage_err)
    }

    async fn statistic(
        &self,
        route_type: RouteType,
        tool: &str,
    ) -> Result<SuccessStatistic, ActivatorError> {
        let tool = tool.to_string();
        self.conn()?
            .call(move |conn| -> Result<SuccessStatistic, rusqlite::Error> {
                load_statistic(conn, route_type, &tool)
            })
            .await
            .map_err(storage_err)
    }
}

fn load_routing(
    conn: &rusqlite::Connection,
    query_id: &str,
) -> Result<Option<RoutingRecord>, rusqlite::Error> {
    conn.query_row(
        "SELECT query_id, query_text, embedding, tier, tool, route_type, confidence, created_at FROM routing_records WHERE query_id = ?1",
        rusqlite::params![query_id],
        |row| {
            let blob: Vec<u8> = row.get(2)?;
            let route_type: String = row.get(5)?;
            Ok(RoutingRecord {
                query_id: QueryId(row.get(0)?),
                query_text: row.get(1)?,
                embedding: blob_to_vec(&blob),
                tier: TierId(row.get(3)?),
                tool: row.get(4)?,
                route_type: parse_route_type(&route_type)?,
                confidence: row.get(6)?,
                created_at: row.get(7)?,
            })
        },
    )
    .optional()
}

fn load_statistic(
    conn: &rusqlite::Connection,
    route_type: RouteType,
    tool: &str,
) -> Result<SuccessStatistic, rusqlite::Error> {
    let counts: Option<(i64, i64)> = conn
        .query_row(
            "SELECT attempts, successes FROM success_stats WHERE route_type = ?1 AND tool = ?2",
            rusqlite::params![route_type.as_str(), tool],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (attempts, successes) = counts.unwrap_or((0, 0));
    Ok(SuccessStatistic {
        route_type,
        tool: tool.to_string(),
        attempts: attempts.max(0) as u64,
        successes: successes.max(0) as u64,
    })
}

fn parse_route_type(value: &str) -> Result<RouteType, rusqlite::Error> {
    value.parse::<RouteType>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })
}
