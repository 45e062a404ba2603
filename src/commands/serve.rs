//! `scribe serve` - run the HTTP API.

use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::daemon::http::{self, AppState, SharedState};
use crate::daemon::metrics;
use crate::daemon::services::transcription::{MockProducer, Sweeper};

/// Shared state plus the background sweeper, ready to serve.
pub(crate) struct Started {
    pub(crate) state: SharedState,
    pub(crate) sweeper_task: Option<JoinHandle<()>>,
}

/// Start the API server and, if enabled, the background sweeper.
///
/// Runs until Ctrl+C.
pub async fn execute(config: Config, port: Option<u16>) -> Result<()> {
    let mut config = config;
    if let Some(port) = port {
        config.server.port = port;
    }

    let started = start(&config)?;
    let result = http::serve(config.bind_addr()?, started.state).await;

    if let Some(task) = started.sweeper_task {
        task.abort();
    }
    result
}

/// Opens the store, installs the metrics recorder, then spawns the sweeper.
///
/// The recorder goes first: the sweeper's first pass runs immediately.
pub(crate) fn start(config: &Config) -> Result<Started> {
    let store = super::open_store(config)?;
    let sweeper = Sweeper::new(store.clone());

    let metrics = match metrics::install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics disabled");
            None
        },
    };

    let sweeper_task = if config.sweeper.enabled {
        tracing::info!(
            interval_secs = config.sweeper.interval_secs,
            "Starting expiry sweeper"
        );
        Some(sweeper.clone().spawn(config.sweep_interval()))
    } else {
        None
    };

    Ok(Started {
        state: Arc::new(AppState {
            store,
            sweeper,
            producer: Arc::new(MockProducer::default()),
            metrics,
        }),
        sweeper_task,
    })
}
