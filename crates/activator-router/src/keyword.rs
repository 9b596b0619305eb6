// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier 1: ordered keyword rules.
//!
//! Rules are evaluated in declaration order and the first case-insensitive
//! match wins. Matching is pure: no I/O, no state.

use std::collections::BTreeMap;

use regex::Regex;

use activator_config::model::RuleConfig;
use activator_config::validation::compile_rule_pattern;
use activator_core::{ActivatorError, TierId};

/// A compiled routing rule.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub pattern: Regex,
    pub tier: TierId,
    pub tool: String,
    pub confidence: f64,
    pub requires_confirmation: bool,
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl KeywordRule {
    /// Tool parameters for `text`: the rule's static parameters plus the raw query.
    pub fn parameters_for(&self, text: &str) -> serde_json::Value {
        let mut params: serde_json::Map<String, serde_json::Value> = self
            .parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        params
            .entry("query")
            .or_insert_with(|| serde_json::Value::String(text.to_string()));
        serde_json::Value::Object(params)
    }
}

/// Ordered rule list; declaration order is the only tie-break.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    rules: Vec<KeywordRule>,
}

impl KeywordMatcher {
    /// Compile the configured rules.
    pub fn from_config(rules: &[RuleConfig]) -> Result<Self, ActivatorError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let pattern = compile_rule_pattern(&rule.pattern).map_err(|e| {
                    ActivatorError::Config(format!("invalid rule pattern {:?}: {e}", rule.pattern))
                })?;
                Ok(KeywordRule {
                    pattern,
                    tier: TierId::new(rule.tier.clone()),
                    tool: rule.tool.clone(),
                    confidence: rule.confidence,
                    requires_confirmation: rule.requires_confirmation,
                    parameters: rule.parameters.clone(),
                })
            })
            .collect::<Result<Vec<_>, ActivatorError>>()?;
        Ok(Self { rules })
    }

    /// First rule whose pattern matches `text`, if any.
    pub fn find(&self, text: &str) -> Option<&KeywordRule> {
        self.rules.iter().find(|rule| rule.pattern.is_match(text))
    }

    /// Whether any rule routing to `tool` asks for confirmation.
    pub fn requires_confirmation(&self, tool: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.tool == tool && rule.requires_confirmation)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use activator_config::model::default_rules;

    fn rule(pattern: &str, tool: &str) -> RuleConfig {
        RuleConfig {
            pattern: pattern.to_string(),
            tier: "executor".to_string(),
            tool: tool.to_string(),
            confidence: 0.9,
            requires_confirmation: false,
            parameters: BTreeMap::new(),
            examples: Vec::new(),
        }
    }

    #[test]
    fn block_client_rule_matches_mac_query() {
        let matcher = KeywordMatcher::from_config(&default_rules()).unwrap();
        let hit = matcher
            .find("block the client with MAC aa:bb:cc:dd:ee:ff")
            .expect("block rule should match");
        assert_eq!(hit.tool, "block_client");
        assert_eq!(hit.confidence, 0.95);
        assert_eq!(hit.tier.as_str(), "executor");
    }

    #[test]
    fn matching_is_case_insensitive() {
        let matcher = KeywordMatcher::from_config(&[rule("restart.*pod", "restart_pod")]).unwrap();
        assert!(matcher.find("RESTART the Pod web-0").is_some());
    }

    #[test]
    fn first_declared_rule_wins() {
        let matcher = KeywordMatcher::from_config(&[
            rule("pods?", "get_pods"),
            rule("restart.*pod", "restart_pod"),
        ])
        .unwrap();
        assert_eq!(matcher.find("restart pod web-0").unwrap().tool, "get_pods");
    }

    #[test]
    fn no_match_returns_none() {
        let matcher = KeywordMatcher::from_config(&default_rules()).unwrap();
        assert!(matcher.find("investigate high latency on switch 3").is_none());
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = KeywordMatcher::from_config(&[rule("(unclosed", "broken")]).unwrap_err();
        assert!(matches!(err, ActivatorError::Config(_)));
    }

    #[test]
    fn parameters_carry_query_text() {
        let mut config = rule("logs?", "get_logs");
        config
            .parameters
            .insert("tail".to_string(), serde_json::json!(100));
        let matcher = KeywordMatcher::from_config(&[config]).unwrap();
        let params = matcher.find("show logs").unwrap().parameters_for("show logs");
        assert_eq!(params["tail"], serde_json::json!(100));
        assert_eq!(params["query"], serde_json::json!("show logs"));
    }

    #[test]
    fn confirmation_flag_by_tool() {
        let matcher = KeywordMatcher::from_config(&default_rules()).unwrap();
        assert!(matcher.requires_confirmation("delete_resource"));
        assert!(!matcher.requires_confirmation("get_pods"));
        assert!(!matcher.requires_confirmation("unknown_tool"));
    }
}
