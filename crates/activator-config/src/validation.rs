// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde cannot express: threshold ranges,
//! positive timeouts, tier references, and keyword rule ambiguities.

use std::collections::HashSet;

use regex::Regex;

use crate::diagnostic::ConfigError;
use crate::model::{ActivatorConfig, RuleConfig};

/// A keyword rule ambiguity worth flagging at load time.
///
/// Configuration order stays authoritative, so these are warnings, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleWarning {
    /// An example of `rules[index]` also matches the later `rules[later]`.
    Overlap {
        index: usize,
        tool: String,
        later: usize,
        later_tool: String,
        example: String,
    },
    /// `rules[index]` declares no examples, so its overlaps cannot be checked.
    Unchecked { index: usize, tool: String },
}

impl std::fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleWarning::Overlap {
                index,
                tool,
                later,
                later_tool,
                example,
            } => write!(
                f,
                "example {example:?} of rules[{index}] (`{tool}`) also matches rules[{later}] (`{later_tool}`); rules[{index}] wins"
            ),
            RuleWarning::Unchecked { index, tool } => write!(
                f,
                "rules[{index}] (`{tool}`) declares no examples; overlaps with other rules cannot be checked"
            ),
        }
    }
}

/// Compile a rule pattern the way the keyword matcher does (case-insensitive).
pub fn compile_rule_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){pattern}"))
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ActivatorConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let routing = &config.routing;
    if !(0.0..=1.0).contains(&routing.similarity_threshold) {
        errors.push(validation(format!(
            "routing.similarity_threshold must be within [0, 1], got {}",
            routing.similarity_threshold
        )));
    }
    for (key, value) in [
        ("routing.min_success_rate", routing.min_success_rate),
        (
            "routing.classifier_min_confidence",
            routing.classifier_min_confidence,
        ),
    ] {
        if !(0.0..=1.0).contains(&value) {
            errors.push(validation(format!(
                "{key} must be within [0, 1], got {value}"
            )));
        }
    }
    if routing.tier3_score_ceiling > 100 {
        errors.push(validation(format!(
            "routing.tier3_score_ceiling must be at most 100, got {}",
            routing.tier3_score_ceiling
        )));
    }

    for (key, value) in [
        ("routing.classifier_budget_secs", routing.classifier_budget_secs),
        ("routing.reasoning_budget_secs", routing.reasoning_budget_secs),
        ("tiers.poll_interval_ms", config.tiers.poll_interval_ms),
        ("tiers.cooldown_tick_secs", config.tiers.cooldown_tick_secs),
        ("services.request_timeout_secs", config.services.request_timeout_secs),
    ] {
        if value == 0 {
            errors.push(validation(format!("{key} must be positive")));
        }
    }

    if config.embedding.dimensions == 0 {
        errors.push(validation("embedding.dimensions must be positive".to_string()));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation(
            "storage.database_path must not be empty".to_string(),
        ));
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(validation("gateway.host must not be empty".to_string()));
    }

    // Tiers
    if config.tiers.execution.is_empty() {
        errors.push(validation(
            "tiers.execution must declare at least one execution tier".to_string(),
        ));
    }
    let mut seen_tiers = HashSet::new();
    for tier in config.tiers.all() {
        if tier.name.trim().is_empty() {
            errors.push(validation("tier names must not be empty".to_string()));
        } else if !seen_tiers.insert(tier.name.as_str()) {
            errors.push(validation(format!("duplicate tier name `{}`", tier.name)));
        }
        if tier.activation_timeout_ms == 0 {
            errors.push(validation(format!(
                "tier `{}` activation_timeout_ms must be positive",
                tier.name
            )));
        }
    }

    // Rules
    let mut seen_patterns = HashSet::new();
    for (i, rule) in config.rules.iter().enumerate() {
        if !seen_patterns.insert(rule.pattern.as_str()) {
            errors.push(validation(format!(
                "duplicate pattern `{}` in rules[{i}]",
                rule.pattern
            )));
        }
        if rule.tool.trim().is_empty() {
            errors.push(validation(format!("rules[{i}].tool must not be empty")));
        }
        if !(0.0..=1.0).contains(&rule.confidence) {
            errors.push(validation(format!(
                "rules[{i}].confidence must be within [0, 1], got {}",
                rule.confidence
            )));
        }
        if !config.tiers.is_execution_tier(&rule.tier) {
            errors.push(validation(format!(
                "rules[{i}].tier `{}` is not a configured execution tier",
                rule.tier
            )));
        }
    }

    let compiled = compile_rules(&config.rules, &mut errors);
    if let Some(compiled) = compiled {
        for (i, rule) in config.rules.iter().enumerate() {
            for example in &rule.examples {
                if !compiled[i].is_match(example) {
                    errors.push(validation(format!(
                        "rules[{i}] (`{}`) does not match its own example {example:?}",
                        rule.tool
                    )));
                    continue;
                }
                if let Some(earlier) = compiled[..i].iter().position(|re| re.is_match(example)) {
                    errors.push(ConfigError::ShadowedRule {
                        index: i,
                        tool: rule.tool.clone(),
                        earlier,
                        earlier_tool: config.rules[earlier].tool.clone(),
                        example: example.clone(),
                    });
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Report rule examples that also match a later rule, and rules with no
/// examples to check.
///
/// Patterns that do not compile are skipped; [`validate_config`] reports them.
pub fn rule_warnings(rules: &[RuleConfig]) -> Vec<RuleWarning> {
    let compiled: Vec<Option<Regex>> = rules
        .iter()
        .map(|r| compile_rule_pattern(&r.pattern).ok())
        .collect();

    let mut warnings = Vec::new();
    for (i, rule) in rules.iter().enumerate() {
        let Some(own) = &compiled[i] else { continue };
        if rule.examples.is_empty() {
            warnings.push(RuleWarning::Unchecked {
                index: i,
                tool: rule.tool.clone(),
            });
            continue;
        }
        for example in rule.examples.iter().filter(|e| own.is_match(e)) {
            for (later, re) in compiled.iter().enumerate().skip(i + 1) {
                if re.as_ref().is_some_and(|re| re.is_match(example)) {
                    warnings.push(RuleWarning::Overlap {
                        index: i,
                        tool: rule.tool.clone(),
                        later,
                        later_tool: rules[later].tool.clone(),
                        example: example.clone(),
                    });
                }
            }
        }
    }
    warnings
}

fn compile_rules(rules: &[RuleConfig], errors: &mut Vec<ConfigError>) -> Option<Vec<Regex>> {
    let mut compiled = Vec::with_capacity(rules.len());
    let mut ok = true;
    for (index, rule) in rules.iter().enumerate() {
        match compile_rule_pattern(&rule.pattern) {
            Ok(re) => compiled.push(re),
            Err(e) => {
                ok = false;
                errors.push(ConfigError::InvalidPattern {
                    index,
                    pattern: rule.pattern.clone(),
                    detail: e.to_string(),
                });
            }
        }
    }
    ok.then_some(compiled)
}

fn validation(message: String) -> ConfigError {
    ConfigError::Validation { message }
}
