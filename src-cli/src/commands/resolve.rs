//! The `resolve` command.

use crate::args::ResolveArgs;
use crate::input::read_input;
use crate::output::write_results;
use crate::state::AppState;
use anyhow::Context;
use sectorlens_core::AppConfig;
use sectorlens_matcher::{LocalMatcher, ReferenceTable};
use sectorlens_resilience::alerts;
use sectorlens_resolver::{DomainLookup, DomainResolver};
use sectorlens_web::WebResolver;
use std::path::PathBuf;
use std::sync::Arc;

/// What a run produced.
#[derive(Debug)]
pub struct ResolveSummary {
    /// Rows written to the output file
    pub rows: usize,
    /// Distinct domains resolved
    pub unique_domains: usize,
    /// Output file
    pub output: PathBuf,
}

/// Resolve the input file and write the result table.
pub async fn run(config: &AppConfig, args: &ResolveArgs) -> anyhow::Result<ResolveSummary> {
    let records = read_input(&args.input)?;
    let state = AppState::open(config).await?;

    let table = match &args.reference {
        Some(path) => ReferenceTable::load_csv(path)
            .with_context(|| format!("failed to load reference dataset {}", path.display()))?,
        None => ReferenceTable::default(),
    };

    let matcher = LocalMatcher::new(Arc::new(table))
        .with_fuzzy_threshold(config.resolver.fuzzy_threshold)
        .with_web_fallback(config.resolver.use_web);

    let lookup: Option<Arc<dyn DomainLookup>> = if config.resolver.use_web {
        let web = WebResolver::from_config(
            Arc::clone(&state.resilience),
            Arc::clone(&state.cache),
            config,
        )
        .context("failed to build the web resolver")?;
        Some(Arc::new(web))
    } else {
        None
    };

    let resolver = DomainResolver::new(
        Arc::clone(&state.cache),
        matcher,
        lookup,
        Arc::clone(&state.resilience),
        config,
    );

    let domains = records.iter().filter_map(|record| record.domain.clone());
    let results = resolver.resolve_all(domains).await?;

    let output = args.output_path();
    let rows = write_results(&output, &records, &results)?;

    report_metrics(config, &state)?;

    Ok(ResolveSummary {
        rows,
        unique_domains: results.len(),
        output,
    })
}

fn report_metrics(config: &AppConfig, state: &AppState) -> anyhow::Result<()> {
    let metrics = state.resilience.metrics();
    let snapshot = metrics.snapshot();

    tracing::info!(
        requests = snapshot.requests_total,
        success_rate = snapshot.success_rate,
        cache_hit_rate = snapshot.cache_hit_rate,
        circuit_trips = snapshot.circuit_breaker_trips,
        "Run metrics"
    );

    for alert in alerts::evaluate(&snapshot, &config.monitoring.alerts) {
        tracing::warn!(kind = ?alert.kind, "{alert}");
    }

    if let Some(path) = &config.monitoring.metrics_path {
        metrics
            .export_json(path)
            .with_context(|| format!("failed to export metrics to {}", path.display()))?;
        tracing::info!("Metrics exported to {}", path.display());
    }

    Ok(())
}
