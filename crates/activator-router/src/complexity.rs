// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic complexity scoring.
//!
//! Gates Tier 3 versus Tier 4: additive heuristic signals over the raw query,
//! clamped to [0, 100]. No network, no state.

use std::sync::LazyLock;

use regex::Regex;

/// Investigative verbs and their weights (case-insensitive substring).
const INVESTIGATIVE_VERBS: &[(&str, i64)] = &[
    ("investigate", 20),
    ("analyze", 18),
    ("troubleshoot", 22),
];

/// Prefixes of plain lookups.
const LOOKUP_PREFIXES: &[&str] = &["list", "show", "get"];

/// Operational symptoms that call for diagnosis rather than a lookup.
const SYMPTOMS: &[&str] = &[
    "latency",
    "packet loss",
    "timeout",
    "slow",
    "outage",
    "intermittent",
    "degraded",
    "crashloop",
    "oomkilled",
    "error rate",
];

const LOOKUP_PENALTY: i64 = -5;
const LONG_QUERY_CHARS: usize = 500;
const LONG_QUERY_BONUS: i64 = 15;
const QUESTION_MARK_WEIGHT: i64 = 8;
const MAC_FRAGMENT_WEIGHT: i64 = 3;
const SYMPTOM_BONUS: i64 = 15;
const DIAGNOSIS_BONUS: i64 = 15;

/// Two leading hex pairs of a MAC-address-like token.
static MAC_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9a-f]{2}:[0-9a-f]{2}:").expect("MAC fragment pattern is valid")
});

/// Heuristic complexity scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexityScorer;

impl ComplexityScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score `text` in [0, 100].
    pub fn score(&self, text: &str) -> u32 {
        let lower = text.to_lowercase();
        let mut score: i64 = 0;

        let mut investigative = false;
        for (verb, weight) in INVESTIGATIVE_VERBS {
            if lower.contains(verb) {
                score += weight;
                investigative = true;
            }
        }

        let trimmed = lower.trim_start();
        if LOOKUP_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
            score += LOOKUP_PENALTY;
        }

        if text.chars().count() > LONG_QUERY_CHARS {
            score += LONG_QUERY_BONUS;
        }

        score += QUESTION_MARK_WEIGHT * text.matches('?').count() as i64;
        score += MAC_FRAGMENT_WEIGHT * MAC_FRAGMENT.find_iter(text).count() as i64;

        if SYMPTOMS.iter().any(|s| lower.contains(s)) {
            score += SYMPTOM_BONUS;
            if investigative {
                score += DIAGNOSIS_BONUS;
            }
        }

        score.clamp(0, 100) as u32
    }
}
