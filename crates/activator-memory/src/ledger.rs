// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Success ledger: per (route_type, tool) counters with exactly-once accounting.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use activator_core::{QueryId, RouteType, SuccessStatistic};

#[derive(Debug, Default)]
struct LedgerState {
    counted: HashSet<QueryId>,
    counters: HashMap<(RouteType, String), (u64, u64)>,
}

/// Thread-safe success counters.
///
/// A single mutex guards both the set of already-counted query ids and the
/// counters, so the duplicate check and the increment happen atomically.
#[derive(Debug, Default)]
pub struct SuccessLedger {
    state: Mutex<LedgerState>,
}

impl SuccessLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one outcome. Returns `false` if `query_id` was already counted.
    pub fn record(&self, query_id: &QueryId, route_type: RouteType, tool: &str, success: bool) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !state.counted.insert(query_id.clone()) {
            return false;
        }
        let entry = state
            .counters
            .entry((route_type, tool.to_string()))
            .or_insert((0, 0));
        entry.0 += 1;
        if success {
            entry.1 += 1;
        }
        true
    }

    /// Mark an outcome as seen without touching any counter.
    ///
    /// Returns `false` if `query_id` was already seen.
    pub fn mark_seen(&self, query_id: &QueryId) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.counted.insert(query_id.clone())
    }

    /// Current statistic for a pair.
    pub fn get(&self, route_type: RouteType, tool: &str) -> SuccessStatistic {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let (attempts, successes) = state
            .counters
            .get(&(route_type, tool.to_string()))
            .copied()
            .unwrap_or((0, 0));
        SuccessStatistic {
            route_type,
            tool: tool.to_string(),
            attempts,
            successes,
        }
    }
}
