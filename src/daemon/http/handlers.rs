//! Route handlers.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
};
use bytes::Bytes;

use super::types::{HealthResponse, ListResponse};
use super::{AppError, SharedState};
use crate::daemon::services::transcription::{
    AudioUpload, SweepReport, Transcription, TranscriptionPatch,
};

/// Header carrying the uploading user's id.
pub(crate) const USER_ID_HEADER: &str = "x-user-id";

/// Multipart field names accepted for the audio file.
const AUDIO_FIELDS: &[&str] = &["audio", "file"];

/// GET /health
pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /metrics - Prometheus text format.
pub(crate) async fn metrics(State(state): State<SharedState>) -> Result<String, AppError> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or_else(|| AppError::ServiceUnavailable("Metrics recorder is not installed".to_string()))
}

/// POST /transcriptions - Upload audio and store its transcription.
pub(crate) async fn create_transcription(
    State(state): State<SharedState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Transcription>), AppError> {
    let owner_id = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .trim()
        .to_string();

    let upload = read_upload(multipart).await?;
    let record = state
        .store
        .create_from_upload(&owner_id, &upload, state.producer.as_ref())
        .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// Pulls the first audio field out of a multipart body.
async fn read_upload(mut multipart: Multipart) -> Result<AudioUpload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if !field.name().is_some_and(|name| AUDIO_FIELDS.contains(&name)) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let mime_type = field
            .content_type()
            .filter(|ct| *ct != "application/octet-stream")
            .map(str::to_string)
            .or_else(|| mime_guess::from_path(&filename).first_raw().map(str::to_string))
            .unwrap_or_default();
        let data: Bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read audio upload: {e}")))?;

        return Ok(AudioUpload {
            filename,
            mime_type,
            data,
        });
    }

    Err(AppError::BadRequest(
        "Missing 'audio' file field in multipart body".to_string(),
    ))
}

/// GET /transcriptions/{id}
pub(crate) async fn get_transcription(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Transcription>, AppError> {
    Ok(Json(state.store.get(&id).await?))
}

/// PATCH /transcriptions/{id} - Change status, text or confidence.
pub(crate) async fn update_transcription(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(patch): Json<TranscriptionPatch>,
) -> Result<Json<Transcription>, AppError> {
    if patch.is_empty() {
        return Err(AppError::BadRequest(
            "Patch must set at least one of status, text, confidence".to_string(),
        ));
    }
    Ok(Json(state.store.update(&id, &patch).await?))
}

/// DELETE /transcriptions/{id}
pub(crate) async fn delete_transcription(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/{owner_id}/transcriptions
pub(crate) async fn list_user_transcriptions(
    State(state): State<SharedState>,
    Path(owner_id): Path<String>,
) -> Result<Json<ListResponse>, AppError> {
    let transcriptions = state.store.list_by_owner(&owner_id).await?;
    Ok(Json(ListResponse {
        owner_id,
        count: transcriptions.len(),
        transcriptions,
    }))
}

/// POST /maintenance/sweep - Run one sweeper pass now.
pub(crate) async fn run_sweep(
    State(state): State<SharedState>,
) -> Result<Json<SweepReport>, AppError> {
    Ok(Json(state.sweeper.run_once().await?))
}
