// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tier state: the arena of tier slots, their phases, and pending-request leases.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use tokio::time::Instant;

use activator_core::TierId;
use activator_prometheus::set_pending_requests;

/// Lifecycle of a scale-to-zero tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TierPhase {
    Cold,
    Waking,
    Ready,
    Cooling,
}

/// Readiness broadcast for one wake attempt, tagged with its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WakeSignal {
    Idle,
    Waking(u64),
    Ready(u64),
    Failed(u64),
}

/// Static description of a tier.
#[derive(Debug, Clone)]
pub struct TierSpec {
    pub id: TierId,
    pub activation_timeout: Duration,
}

#[derive(Debug)]
pub(crate) struct SlotState {
    pub(crate) phase: TierPhase,
    pub(crate) replicas: u32,
    pub(crate) last_activity: Instant,
    pub(crate) generation: u64,
}

/// One tier's record in the arena. Each slot carries its own lock; tiers
/// never contend with each other.
#[derive(Debug)]
pub(crate) struct TierSlot {
    pub(crate) spec: TierSpec,
    pending: AtomicU64,
    state: Mutex<SlotState>,
    pub(crate) signal: watch::Sender<WakeSignal>,
}

impl TierSlot {
    fn new(spec: TierSpec) -> Self {
        let (signal, _) = watch::channel(WakeSignal::Idle);
        set_pending_requests(spec.id.as_str(), 0);
        Self {
            spec,
            pending: AtomicU64::new(0),
            state: Mutex::new(SlotState {
                phase: TierPhase::Cold,
                replicas: 0,
                last_activity: Instant::now(),
                generation: 0,
            }),
            signal,
        }
    }

    /// Lock the slot state. The guard is never held across an await point.
    pub(crate) fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn pending(&self) -> u64 {
        self.pending.load(Ordering::SeqCst)
    }

    fn adjust_pending(&self, increment: bool) {
        // The gauge is published under the slot lock so concurrent updates
        // cannot publish out of order.
        let mut state = self.lock();
        let now = if increment {
            self.pending.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            self.pending.fetch_sub(1, Ordering::SeqCst).saturating_sub(1)
        };
        state.last_activity = Instant::now();
        set_pending_requests(self.spec.id.as_str(), now);
    }
}

/// Fixed set of tier slots indexed by tier id.
#[derive(Debug)]
pub(crate) struct TierArena {
    slots: Vec<Arc<TierSlot>>,
    index: HashMap<TierId, usize>,
}

impl TierArena {
    pub(crate) fn new(specs: Vec<TierSpec>) -> Self {
        let mut slots = Vec::with_capacity(specs.len());
        let mut index = HashMap::with_capacity(specs.len());
        for spec in specs {
            if index.contains_key(&spec.id) {
                continue;
            }
            index.insert(spec.id.clone(), slots.len());
            slots.push(Arc::new(TierSlot::new(spec)));
        }
        Self { slots, index }
    }

    pub(crate) fn get(&self, tier: &TierId) -> Option<&Arc<TierSlot>> {
        self.index.get(tier).map(|&i| &self.slots[i])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<TierSlot>> {
        self.slots.iter()
    }
}

/// RAII claim on a tier. Holding a lease keeps the tier's pending counter
/// (and therefore the `pending_requests` gauge) above zero; dropping it
/// releases the claim, including on error and cancellation paths.
#[derive(Debug)]
pub struct TierLease {
    slot: Arc<TierSlot>,
}

impl TierLease {
    pub(crate) fn acquire(slot: Arc<TierSlot>) -> Self {
        slot.adjust_pending(true);
        Self { slot }
    }

    pub fn tier(&self) -> &TierId {
        &self.slot.spec.id
    }
}

impl Drop for TierLease {
    fn drop(&mut self) {
        self.slot.adjust_pending(false);
    }
}

/// Point-in-time view of one tier, served by `GET /v1/tiers`.
#[derive(Debug, Clone, Serialize)]
pub struct TierSnapshot {
    pub tier: TierId,
    pub phase: TierPhase,
    pub replicas: u32,
    pub pending: u64,
    pub idle_secs: f64,
}

impl TierSnapshot {
    pub(crate) fn of(slot: &TierSlot) -> Self {
        let state = slot.lock();
        Self {
            tier: slot.spec.id.clone(),
            phase: state.phase,
            replicas: state.replicas,
            pending: slot.pending(),
            idle_secs: state.last_activity.elapsed().as_secs_f64(),
        }
    }
}
