// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Activator collaborators.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod cluster;
pub mod embedding;
pub mod execution;
pub mod inference;
pub mod storage;

pub use adapter::PluginAdapter;
pub use cluster::ClusterControl;
pub use embedding::EmbeddingAdapter;
pub use execution::ExecutionAdapter;
pub use inference::InferenceAdapter;
pub use storage::RoutingStore;
