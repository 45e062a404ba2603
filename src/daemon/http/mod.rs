//! HTTP surface over the transcription store.
//!
//! A thin axum layer: handlers parse the request, call the store and map
//! [`StoreError`] to a status code. No storage logic lives here.
//!
//! Routes:
//! - `POST   /transcriptions` - multipart upload (`audio` field), owner in `x-user-id`
//! - `GET    /transcriptions/{id}`
//! - `PATCH  /transcriptions/{id}`
//! - `DELETE /transcriptions/{id}`
//! - `GET    /users/{owner_id}/transcriptions`
//! - `POST   /maintenance/sweep`
//! - `GET    /health`, `GET /metrics`

mod handlers;
mod types;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use crate::constants;
use crate::daemon::services::transcription::{
    StoreError, Sweeper, TranscriptionProducer, TranscriptionStore,
};

pub use types::{ErrorResponse, HealthResponse, ListResponse};

/// Everything the handlers need, shared across requests.
pub struct AppState {
    pub store: TranscriptionStore,
    pub sweeper: Sweeper,
    pub producer: Arc<dyn TranscriptionProducer>,
    /// Present when a Prometheus recorder was installed.
    pub metrics: Option<PrometheusHandle>,
}

pub type SharedState = Arc<AppState>;

/// Handler error mapped onto an HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadGateway(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => Self::BadRequest(msg),
            StoreError::NotFound { id } => Self::NotFound(format!("Transcription '{id}' not found")),
            StoreError::Producer(e) => Self::BadGateway(e.to_string()),
            other => {
                tracing::error!(error = %other, "Storage failure");
                Self::Internal("Internal storage error".to_string())
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Builds the router with body limits sized for the configured max upload.
pub fn router(state: SharedState) -> Router {
    let body_limit = usize::try_from(state.store.config().max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(constants::MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/transcriptions", post(handlers::create_transcription))
        .route(
            "/transcriptions/{id}",
            get(handlers::get_transcription)
                .patch(handlers::update_transcription)
                .delete(handlers::delete_transcription),
        )
        .route(
            "/users/{owner_id}/transcriptions",
            get(handlers::list_user_transcriptions),
        )
        .route("/maintenance/sweep", post(handlers::run_sweep))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, state: SharedState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!(%addr, "Transcription API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
