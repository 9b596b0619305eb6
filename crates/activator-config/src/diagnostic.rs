// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns figment and validation failures into miette diagnostics.
//!
//! Unknown keys carry a Jaro-Winkler "did you mean" suggestion. When the
//! offending file is known, unknown keys and mistyped values are labelled at
//! their position inside the right TOML table.

#![allow(unused_assignments)] // emitted by the miette Diagnostic derive

use figment::error::Kind;
use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler score for a key suggestion.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Label position and source text for one diagnostic.
type Located = (Option<SourceSpan>, Option<NamedSource<String>>);

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(activator::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest valid key, if any is close enough.
        suggestion: Option<String>,
        /// Comma-separated keys accepted by the table.
        valid_keys: String,
        #[label("not a recognized key")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A value of the wrong type, or an enum value outside its variants.
    #[error("invalid value for `{key}`: {detail}")]
    #[diagnostic(code(activator::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
        #[label("this value")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A key without a default is absent, e.g. a rule without `tool`.
    #[error("missing required key `{key}`")]
    #[diagnostic(code(activator::config::missing_key))]
    MissingKey { key: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(activator::config::validation))]
    Validation { message: String },

    #[error("rules[{index}].pattern `{pattern}` is not a valid regular expression")]
    #[diagnostic(code(activator::config::invalid_pattern), help("{detail}"))]
    InvalidPattern {
        index: usize,
        pattern: String,
        /// Regex compiler message.
        detail: String,
    },

    /// A rule example is captured by an earlier rule, so the rule never sees it.
    #[error("rules[{index}] (`{tool}`) is shadowed by rules[{earlier}] (`{earlier_tool}`) for example {example:?}")]
    #[diagnostic(
        code(activator::config::shadowed_rule),
        help("move rules[{index}] above rules[{earlier}] or narrow the earlier pattern")
    )]
    ShadowedRule {
        index: usize,
        tool: String,
        earlier: usize,
        earlier_tool: String,
        example: String,
    },

    #[error("configuration error: {0}")]
    #[diagnostic(code(activator::config::other))]
    Other(String),
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? Valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// Convert every error carried by a `figment::Error` into a diagnostic.
///
/// `sources` holds `(path, content)` of the TOML files that were merged; they
/// are only used to place labels.
pub fn figment_to_config_errors(
    err: figment::Error,
    sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                let (span, src) = locate(&error, tables(&error.path), field, sources);
                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion: suggest_key(field, expected),
                    valid_keys: expected.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => {
                let mut key = tables(&error.path).join(".");
                if !key.is_empty() {
                    key.push('.');
                }
                key.push_str(field);
                ConfigError::MissingKey { key }
            }
            Kind::InvalidType(actual, expected) => {
                value_error(&error, format!("found {actual}"), expected.clone(), sources)
            }
            Kind::UnknownVariant(actual, expected) => value_error(
                &error,
                format!("unknown variant `{actual}`"),
                format!("one of: {}", expected.join(", ")),
                sources,
            ),
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

/// Diagnostic for a bad value; the error path ends at the value's key.
fn value_error(
    error: &figment::Error,
    detail: String,
    expected: String,
    sources: &[(String, String)],
) -> ConfigError {
    let path = tables(&error.path);
    let (span, src) = match path.split_last() {
        Some((key, table)) => locate(error, table.to_vec(), key, sources),
        None => (None, None),
    };
    ConfigError::InvalidType {
        key: path.join("."),
        detail,
        expected,
        span,
        src,
    }
}

/// Path segments naming tables and keys; array indices are dropped because
/// every `[[rules]]` entry shares one header.
fn tables(path: &[String]) -> Vec<&str> {
    path.iter()
        .map(String::as_str)
        .filter(|segment| segment.parse::<usize>().is_err())
        .collect()
}

fn locate(
    error: &figment::Error,
    table: Vec<&str>,
    key: &str,
    sources: &[(String, String)],
) -> Located {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|source| match source {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });
    let source = match file {
        Some(path) => sources.iter().find(|(p, _)| *p == path),
        // Inline strings carry no file; a lone source is the only candidate.
        None if sources.len() == 1 => sources.first(),
        None => None,
    };
    let Some((name, content)) = source else {
        return (None, None);
    };

    match find_key_offset(content, &table.join("."), key) {
        Some(offset) => (
            Some(SourceSpan::new(offset.into(), key.len())),
            Some(NamedSource::new(name, content.clone())),
        ),
        None => (None, None),
    }
}

/// Byte offset of `key = ...` declared under the header `[table]` (or
/// `[[table]]`); an empty `table` is the root.
fn find_key_offset(content: &str, table: &str, key: &str) -> Option<usize> {
    let mut current = "";
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix('[') {
            current = header
                .trim_start_matches('[')
                .split(']')
                .next()
                .unwrap_or_default()
                .trim();
        } else if current == table
            && let Some(rest) = trimmed.strip_prefix(key)
            && rest.trim_start().starts_with('=')
        {
            return Some(offset + line.len() - line.trim_start().len());
        }
        offset += line.len();
    }
    None
}

/// Closest valid key by Jaro-Winkler similarity, if above the threshold.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key), *key))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

/// Print diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut out = String::new();
        match handler.render_report(&mut out, error) {
            Ok(()) => eprint!("{out}"),
            Err(_) => eprintln!("error: {error}"),
        }
    }
}
