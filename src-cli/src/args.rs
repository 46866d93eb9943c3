//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use sectorlens_core::AppConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sectorlens",
    about = "Resolve email addresses and domains to a company name and business sector",
    version,
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve every email or domain in a file
    Resolve(ResolveArgs),
    /// Import the CSV mirror into the cache database and exit
    MigrateCache,
    /// Remove duplicate rows from the CSV mirror (a backup is kept)
    CleanMirror,
    /// Check the cache database and report circuit breaker states
    Health,
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// File with one email address or domain per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output CSV (defaults to `<input>.results.csv`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Reference dataset CSV with `domain,company,sector` columns
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Disable the web fallback for unmatched domains
    #[arg(long)]
    pub no_web: bool,

    /// Number of concurrent resolutions
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Minimum seconds between requests to the same host
    #[arg(long)]
    pub min_delay: Option<f64>,

    /// Fuzzy match threshold (0-100)
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Skip the knowledge-graph lookup for unresolved sectors
    #[arg(long)]
    pub no_knowledge_graph: bool,

    /// Write a JSON metrics snapshot here after the run
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,
}

impl ResolveArgs {
    /// Overlay the flags that were given on top of `config`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn apply_to(&self, config: &mut AppConfig) {
        if self.no_web {
            config.resolver.use_web = false;
        }
        if let Some(workers) = self.workers {
            config.resolver.workers = workers;
        }
        if let Some(secs) = self.min_delay {
            config.resolver.min_delay_ms = (secs.max(0.0) * 1000.0).round() as u64;
        }
        if let Some(threshold) = self.threshold {
            config.resolver.fuzzy_threshold = threshold;
        }
        if self.no_knowledge_graph {
            config.web.knowledge_graph = false;
        }
        if let Some(path) = &self.metrics_out {
            config.monitoring.metrics_path = Some(path.clone());
        }
    }

    /// Where results are written.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("results.csv"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve_flags() {
        let cli = Cli::try_parse_from([
            "sectorlens",
            "resolve",
            "--input",
            "emails.txt",
            "--no-web",
            "--workers",
            "8",
            "--min-delay",
            "1.5",
        ])
        .expect("valid arguments");

        let Command::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        let mut config = AppConfig::default();
        args.apply_to(&mut config);

        assert!(!config.resolver.use_web);
        assert_eq!(config.resolver.workers, 8);
        assert_eq!(config.resolver.min_delay_ms, 1500);
        assert!(config.web.knowledge_graph);
        assert_eq!(args.output_path(), PathBuf::from("emails.results.csv"));
    }

    #[test]
    fn test_maintenance_commands() {
        let cli = Cli::try_parse_from(["sectorlens", "clean-mirror"]).expect("valid arguments");
        assert!(matches!(cli.command, Command::CleanMirror));

        let cli = Cli::try_parse_from(["sectorlens", "migrate-cache"]).expect("valid arguments");
        assert!(matches!(cli.command, Command::MigrateCache));
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["sectorlens", "resolve"]).is_err());
    }
}
