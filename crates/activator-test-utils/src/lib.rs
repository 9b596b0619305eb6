// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Activator integration tests.
//!
//! Provides mock collaborators and a test harness for fast, deterministic,
//! CI-runnable tests without a cluster or inference services.
//!
//! # Components
//!
//! - [`MockClusterControl`] - cluster control with configurable readiness delays
//! - [`MockInference`] - scripted classification / reasoning service
//! - [`MockExecutor`] - execution capability that records every call
//! - [`FaultyStore`] - routing store wrapper with injectable failures
//! - [`TestHarness`] - a complete router wired to the mocks

pub mod faulty_store;
pub mod harness;
pub mod mock_cluster;
pub mod mock_executor;
pub mod mock_inference;

pub use faulty_store::FaultyStore;
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_cluster::MockClusterControl;
pub use mock_executor::MockExecutor;
pub use mock_inference::MockInference;
