//! SectorLens command-line shell
//!
//! This is the thin shell that parses arguments, wires the components and
//! reads/writes files. Resolution logic lives in the `crates/` directory.

pub mod args;
pub mod commands;
pub mod input;
pub mod output;
pub mod state;

use anyhow::Context;
use args::{Cli, Command};
use sectorlens_core::AppConfig;
use tracing::info;

/// Initialize tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sectorlens=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

/// Load configuration and run the requested command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    info!("Starting SectorLens v{}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::load_with_env().context("failed to load configuration")?;

    match cli.command {
        Command::Resolve(resolve) => {
            resolve.apply_to(&mut config);
            config.validate().context("invalid configuration")?;
            let summary = commands::resolve::run(&config, &resolve).await?;
            info!(
                rows = summary.rows,
                unique_domains = summary.unique_domains,
                output = %summary.output.display(),
                "Wrote results"
            );
        }
        Command::MigrateCache => {
            config.validate().context("invalid configuration")?;
            let imported = commands::cache::migrate(&config).await?;
            println!("Imported {imported} rows into the cache");
        }
        Command::CleanMirror => {
            let outcome = commands::cache::clean_mirror(&config)?;
            println!("Mirror now holds {} unique rows", outcome.remaining);
            if let Some(backup) = outcome.backup {
                println!("Backup written to {}", backup.display());
            }
        }
        Command::Health => {
            let report = commands::health::run(&config).await?;
            print!("{report}");
            if !report.is_healthy() {
                anyhow::bail!("health check failed");
            }
        }
    }

    Ok(())
}
