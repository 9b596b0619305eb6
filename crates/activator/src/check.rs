// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `activator check` command implementation.

use activator_config::{ActivatorConfig, rule_warnings};

/// Print a configuration summary and keyword rule warnings.
///
/// Reaching this point means the configuration already validated.
pub fn run_check(config: &ActivatorConfig) {
    println!("configuration OK");
    println!(
        "  tiers: {}",
        config
            .tiers
            .all()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("  keyword rules: {}", config.rules.len());
    println!("  storage: {:?} ({})", config.storage.backend, config.storage.database_path);

    let warnings = rule_warnings(&config.rules);
    if warnings.is_empty() {
        println!("  no keyword rule overlaps");
        return;
    }
    for warning in &warnings {
        println!("  warning: {warning}");
    }
}
