//! Transcription record store with per-owner indexing and TTL expiry.
//!
//! Layered bottom-up:
//!
//! - [`keys`] - primary and owner-index key naming
//! - [`codec`] - JSON encoding of records and indexes
//! - [`TranscriptionStore`] - create/get/list/update/delete
//! - [`Sweeper`] - expiry sweeping and index repair
//!
//! Speech-to-text is behind [`TranscriptionProducer`]; [`MockProducer`]
//! stands in for a real engine.
//!
//! # Example
//!
//! ```ignore
//! use scribe::daemon::services::kv::KvStore;
//! use scribe::daemon::services::transcription::{
//!     FileMeta, ProducedTranscript, StoreConfig, TranscriptionStore,
//! };
//!
//! let store = TranscriptionStore::new(KvStore::memory(), StoreConfig::default());
//! let record = store
//!     .create(
//!         "u1",
//!         FileMeta {
//!             original_filename: "memo.wav".into(),
//!             size_bytes: 1000,
//!             mime_type: "audio/wav".into(),
//!             duration_seconds: None,
//!         },
//!         ProducedTranscript { text: "hello".into(), confidence: Some(0.9) },
//!     )
//!     .await?;
//! assert_eq!(store.list_by_owner("u1").await?, vec![record]);
//! ```

mod clock;
pub mod codec;
mod error;
pub mod keys;
mod producer;
mod store;
mod sweeper;
mod types;

#[cfg(test)]
mod property_tests;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, StoreError};
pub use producer::{MockProducer, ProducerError, TranscriptionProducer};
pub use store::{StoreConfig, TranscriptionStore, is_allowed_mime_type};
pub use sweeper::{SweepReport, Sweeper};
pub use types::{
    AudioUpload, FileMeta, ProducedTranscript, Transcription, TranscriptionPatch,
    TranscriptionStatus,
};
