// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scale-from-zero tier management for the Activator.
//!
//! Each tier (classifier, reasoning, and every execution tier) lives in a
//! fixed arena slot with its own lock. [`TierActivator::activate`] wakes a
//! tier at most once per cold period no matter how many requests arrive, and
//! hands out [`TierLease`]s that drive the `pending_requests{tier}` gauge.
//! [`CooldownMonitor`] tracks tiers back down to COLD once the autoscaler has
//! drained them.

pub mod activator;
pub mod cooldown;
pub mod tier;

pub use activator::TierActivator;
pub use cooldown::CooldownMonitor;
pub use tier::{TierLease, TierPhase, TierSnapshot, TierSpec};
