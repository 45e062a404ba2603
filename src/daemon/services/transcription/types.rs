//! Record and request types for the transcription store.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle marker of a transcription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TranscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TranscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored transcription.
///
/// Persisted as a flat JSON object with camelCase field names. `id`,
/// `owner_id`, the file metadata and both timestamps are fixed at creation;
/// only `status`, `text` and `confidence` change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub id: String,
    pub owner_id: String,
    pub original_filename: String,
    pub file_size_bytes: u64,
    pub mime_type: String,
    pub duration_seconds: Option<f64>,
    pub text: String,
    /// In `[0, 1]` when present.
    pub confidence: Option<f64>,
    pub status: TranscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Transcription {
    /// Whether the record is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Metadata of the uploaded audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMeta {
    pub original_filename: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub duration_seconds: Option<f64>,
}

/// Raw audio handed to `create_from_upload`.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl AudioUpload {
    pub fn file_meta(&self) -> FileMeta {
        FileMeta {
            original_filename: self.filename.clone(),
            size_bytes: self.data.len() as u64,
            mime_type: self.mime_type.clone(),
            duration_seconds: None,
        }
    }
}

/// Output of a [`TranscriptionProducer`](super::TranscriptionProducer).
#[derive(Debug, Clone, PartialEq)]
pub struct ProducedTranscript {
    pub text: String,
    pub confidence: Option<f64>,
}

/// Mutable subset of a transcription.
///
/// Anything else a caller sends alongside these fields is ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptionPatch {
    #[serde(default)]
    pub status: Option<TranscriptionStatus>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl TranscriptionPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.text.is_none() && self.confidence.is_none()
    }

    /// Applies the patch to a copy of `record`.
    pub(crate) fn apply(&self, record: &Transcription) -> Transcription {
        let mut updated = record.clone();
        if let Some(status) = self.status {
            updated.status = status;
        }
        if let Some(text) = &self.text {
            updated.text.clone_from(text);
        }
        if let Some(confidence) = self.confidence {
            updated.confidence = Some(confidence);
        }
        updated
    }
}
