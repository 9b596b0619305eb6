// SPDX-FileCopyrightText: 2026 Activator Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Activator - adaptive query router with scale-to-zero tier activation.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod check;
mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use activator_config::{ActivatorConfig, ConfigError};

/// Activator - adaptive query router with scale-to-zero tier activation.
#[derive(Parser, Debug)]
#[command(name = "activator", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the router and its HTTP gateway.
    Serve,
    /// Validate the configuration and report keyword rule overlaps.
    Check,
}

fn load(path: Option<&PathBuf>) -> Result<ActivatorConfig, Vec<ConfigError>> {
    match path {
        Some(path) => activator_config::load_and_validate_path(path),
        None => activator_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(errors) => {
            activator_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("activator: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Check) => check::run_check(&config),
        None => {
            println!("activator: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from(["activator", "check", "--config", "/tmp/a.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a.toml")));
    }

    #[test]
    fn missing_config_file_loads_defaults() {
        let config = load(Some(&PathBuf::from("/nonexistent/activator.toml")))
            .expect("missing file should fall back to defaults");
        assert_eq!(config.service.name, "activator");
    }
}
