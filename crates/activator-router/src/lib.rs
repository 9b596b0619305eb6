// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query routing for the Activator.
//!
//! This crate provides:
//! - [`KeywordMatcher`]: ordered, case-insensitive rule matching (Tier 1)
//! - [`ComplexityScorer`]: deterministic complexity scoring that gates Tier 3 vs Tier 4
//! - [`Router`]: the cascade state machine, from keyword match to execution
//! - [`OutcomeRecorder`]: non-blocking persistence of routing and outcome records

pub mod complexity;
pub mod decision;
pub mod keyword;
pub mod recorder;
pub mod router;

pub use complexity::ComplexityScorer;
pub use decision::{Decision, Escalation, EscalationReason, RouteOutcome, Target};
pub use keyword::{KeywordMatcher, KeywordRule};
pub use recorder::OutcomeRecorder;
pub use router::{Collaborators, Router};
