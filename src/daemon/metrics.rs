//! Prometheus metrics for the store and sweeper.
//!
//! The `metrics` macros are no-ops until [`install_recorder`] runs, so the
//! store can record unconditionally.

use crate::daemon::services::transcription::SweepReport;
use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Installs the global Prometheus recorder and returns a render handle.
///
/// # Errors
///
/// Returns an error if a global recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

/// Counts one store operation (`create`, `get`, `list`, `update`, `delete`).
pub fn record_store_operation(op: &'static str) {
    metrics::counter!("scribe_store_operations_total", "op" => op).increment(1);
}

/// Counts the outcome of one sweeper pass.
pub fn record_sweep(report: &SweepReport) {
    metrics::counter!("scribe_sweep_runs_total").increment(1);
    metrics::counter!("scribe_sweep_deleted_total").increment(report.deleted as u64);
    metrics::counter!("scribe_sweep_repaired_total").increment(report.repaired as u64);
}
