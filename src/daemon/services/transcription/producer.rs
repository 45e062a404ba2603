//! Seam for the external speech-to-text service.

use super::types::ProducedTranscript;
use async_trait::async_trait;

/// Failure reported by a [`TranscriptionProducer`].
#[derive(Debug, thiserror::Error)]
pub enum ProducerError {
    #[error("transcription service unavailable: {0}")]
    Unavailable(String),

    #[error("audio could not be transcribed: {0}")]
    Rejected(String),
}

/// Turns raw audio into text.
///
/// Called once per creation. The store never persists anything when this
/// fails.
#[async_trait]
pub trait TranscriptionProducer: Send + Sync {
    async fn transcribe(
        &self,
        audio: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<ProducedTranscript, ProducerError>;
}

/// Placeholder producer that never inspects the audio.
#[derive(Debug, Clone)]
pub struct MockProducer {
    confidence: Option<f64>,
}

impl MockProducer {
    pub fn new(confidence: Option<f64>) -> Self {
        Self { confidence }
    }
}

impl Default for MockProducer {
    fn default() -> Self {
        Self::new(Some(0.95))
    }
}

#[async_trait]
impl TranscriptionProducer for MockProducer {
    async fn transcribe(
        &self,
        audio: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<ProducedTranscript, ProducerError> {
        tracing::debug!(filename, mime_type, bytes = audio.len(), "Producing mock transcription");
        Ok(ProducedTranscript {
            text: format!(
                "This is a mock transcription of {filename} ({} bytes of {mime_type}).",
                audio.len()
            ),
            confidence: self.confidence,
        })
    }
}
