//! Response bodies for the HTTP API.

use serde::Serialize;

use crate::daemon::services::transcription::Transcription;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// An owner's transcriptions, newest first.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub owner_id: String,
    pub count: usize,
    pub transcriptions: Vec<Transcription>,
}
