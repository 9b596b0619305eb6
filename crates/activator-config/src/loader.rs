// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./activator.toml` > `~/.config/activator/activator.toml`
//! > `/etc/activator/activator.toml`, with environment variable overrides via the
//! `ACTIVATOR_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ActivatorConfig;

/// Sections addressable from `ACTIVATOR_<SECTION>_<KEY>` environment variables.
const ENV_SECTIONS: &[&str] = &[
    "service",
    "gateway",
    "routing",
    "tiers",
    "storage",
    "embedding",
    "services",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/activator/activator.toml` (system-wide)
/// 3. `~/.config/activator/activator.toml` (user XDG config)
/// 4. `./activator.toml` (local directory)
/// 5. `ACTIVATOR_*` environment variables
pub fn load_config() -> Result<ActivatorConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over compiled defaults (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ActivatorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ActivatorConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ActivatorConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ActivatorConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ActivatorConfig::default()))
        .merge(Toml::file("/etc/activator/activator.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("activator/activator.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("activator.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so underscore-containing keys
/// survive: `ACTIVATOR_ROUTING_MIN_SUCCESS_RATE` maps to `routing.min_success_rate`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("ACTIVATOR_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name onto a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    // `services_` must be tried before `service_`.
    let mut sections: Vec<&str> = ENV_SECTIONS.to_vec();
    sections.sort_by_key(|s| std::cmp::Reverse(s.len()));
    for section in sections {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(
            map_env_key("routing_min_success_rate"),
            "routing.min_success_rate"
        );
        assert_eq!(map_env_key("gateway_bearer_token"), "gateway.bearer_token");
        assert_eq!(map_env_key("service_log_level"), "service.log_level");
        assert_eq!(map_env_key("services_classifier"), "services.classifier");
        assert_eq!(
            map_env_key("services_request_timeout_secs"),
            "services.request_timeout_secs"
        );
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn string_overrides_defaults() {
        let config = load_config_from_str("[gateway]\nport = 9090\n").unwrap();
        assert_eq!(config.gateway.port, 9090);
        assert_eq!(config.gateway.host, "127.0.0.1");
    }
}
