//! JSON encoding of records and owner indexes.
//!
//! Records are a flat object (see [`Transcription`]); an owner index is a
//! JSON array of ids in insertion order. There is no schema version: bytes
//! that don't match the current shape decode to
//! [`StoreError::CorruptRecord`].

use super::error::{Result, StoreError};
use super::types::Transcription;
use anyhow::Context;

pub fn encode_record(record: &Transcription) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec(record)
        .with_context(|| format!("Failed to serialize transcription '{}'", record.id))
}

pub fn decode_record(key: &str, bytes: &[u8]) -> Result<Transcription> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::CorruptRecord {
        key: key.to_string(),
        source,
    })
}

pub fn encode_index(ids: &[String]) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec(ids).context("Failed to serialize owner index")
}

pub fn decode_index(key: &str, bytes: &[u8]) -> Result<Vec<String>> {
    serde_json::from_slice(bytes).map_err(|source| StoreError::CorruptRecord {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::daemon::services::transcription::TranscriptionStatus;
    use chrono::{TimeZone, Utc};

    fn sample() -> Transcription {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        Transcription {
            id: "t-1".to_string(),
            owner_id: "u1".to_string(),
            original_filename: "memo.wav".to_string(),
            file_size_bytes: 1000,
            mime_type: "audio/wav".to_string(),
            duration_seconds: None,
            text: "hello".to_string(),
            confidence: Some(0.5),
            status: TranscriptionStatus::Completed,
            created_at,
            expires_at: created_at + chrono::TimeDelta::hours(24),
        }
    }

    #[test]
    fn test_record_is_flat_camel_case() {
        let value: serde_json::Value =
            serde_json::from_slice(&encode_record(&sample()).unwrap()).unwrap();
        assert_eq!(value["ownerId"], "u1");
        assert_eq!(value["fileSizeBytes"], 1000);
        assert_eq!(value["status"], "completed");
        assert!(value["durationSeconds"].is_null());
    }

    #[test]
    fn test_float_fields_decode_exactly() {
        let mut record = sample();
        record.confidence = Some(0.985_690_694_632_869_5);
        record.duration_seconds = Some(0.1 + 0.2);

        let decoded = decode_record("k", &encode_record(&record).unwrap()).unwrap();
        assert_eq!(
            decoded.confidence.map(f64::to_bits),
            record.confidence.map(f64::to_bits)
        );
        assert_eq!(
            decoded.duration_seconds.map(f64::to_bits),
            record.duration_seconds.map(f64::to_bits)
        );
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = decode_record("transcription:x", br#"{"id":"x"}"#).unwrap_err();
        assert!(matches!(err, StoreError::CorruptRecord { ref key, .. } if key == "transcription:x"));

        let err = decode_record("transcription:x", b"not json").unwrap_err();
        assert!(matches!(err, StoreError::CorruptRecord { .. }));
    }

    #[test]
    fn test_index_keeps_order() {
        let ids = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let bytes = encode_index(&ids).unwrap();
        assert_eq!(bytes, br#"["b","a","c"]"#);
        assert_eq!(decode_index("k", &bytes).unwrap(), ids);
    }

    #[test]
    fn test_index_rejects_non_list() {
        assert!(decode_index("k", br#"{"ids":[]}"#).is_err());
    }
}
