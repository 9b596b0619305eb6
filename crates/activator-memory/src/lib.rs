// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing history for the Activator.
//!
//! Stores one routing record per query together with its embedding, links at
//! most one outcome to each record, and keeps per (route_type, tool) success
//! statistics that gate similarity reuse. Two backends implement
//! [`activator_core::RoutingStore`]: SQLite for production and an in-memory
//! store for tests and ephemeral deployments.

pub mod client;
pub mod embedder;
pub mod ledger;
pub mod memory_store;
pub mod store;
pub mod types;

pub use client::{SimilaritySearch, VectorStoreClient};
pub use embedder::{EMBEDDING_DIM, HashEmbedder};
pub use ledger::SuccessLedger;
pub use memory_store::InMemoryRoutingStore;
pub use store::SqliteRoutingStore;
pub use types::{blob_to_vec, cosine_similarity, vec_to_blob};
