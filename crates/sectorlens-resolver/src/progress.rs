//! Progress reporting for batch runs.

use sectorlens_core::ResolutionResult;

/// Observer notified as a batch advances.
pub trait ProgressReporter: Send + Sync {
    /// A batch of `total` unique domains is starting.
    fn started(&self, total: usize);

    /// One domain finished; `done` of `total` are complete.
    fn resolved(&self, result: &ResolutionResult, done: usize, total: usize);

    /// The batch finished.
    fn finished(&self, total: usize);
}

/// Reports progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn started(&self, total: usize) {
        tracing::info!(total, "Resolving domains");
    }

    fn resolved(&self, result: &ResolutionResult, done: usize, total: usize) {
        tracing::info!(
            domain = %result.domain,
            company = %result.company,
            sector = %result.sector,
            source = %result.source,
            "[{done}/{total}] resolved"
        );
    }

    fn finished(&self, total: usize) {
        tracing::info!(total, "Resolution complete");
    }
}

/// Discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn started(&self, _total: usize) {}

    fn resolved(&self, _result: &ResolutionResult, _done: usize, _total: usize) {}

    fn finished(&self, _total: usize) {}
}
