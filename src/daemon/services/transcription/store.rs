//! CRUD, listing and expiry bookkeeping over the KV layer.
//!
//! Every record lives under its own primary key. Each owner additionally has
//! an index key holding the ids they own, which is what makes listing
//! possible without a full scan. The two are updated one after the other,
//! never atomically:
//!
//! - `create` writes the record, then appends to the index.
//! - `delete` removes the record, then filters the index.
//!
//! If the second step fails the primary effect stands and the gap is logged.
//! Index updates are read-modify-write without compare-and-swap, so
//! concurrent creates and deletes for the same owner can lose an update; the
//! [`Sweeper`](super::Sweeper) repairs dangling index entries.

use super::clock::{Clock, SystemClock};
use super::codec;
use super::error::{Result, StoreError};
use super::keys;
use super::producer::TranscriptionProducer;
use super::types::{
    AudioUpload, FileMeta, ProducedTranscript, Transcription, TranscriptionPatch,
    TranscriptionStatus,
};
use crate::constants;
use crate::daemon::metrics;
use crate::daemon::services::kv::KvStore;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Policy knobs for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Lifetime of a record; `expires_at = created_at + ttl`.
    pub ttl: TimeDelta,
    /// Largest accepted `file_size_bytes`.
    pub max_file_size: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: TimeDelta::hours(constants::DEFAULT_TTL_HOURS as i64),
            max_file_size: constants::MAX_FILE_SIZE,
        }
    }
}

/// Returns true if `mime_type` is on the upload allow-list.
///
/// Parameters such as `; codecs=opus` and letter case are ignored.
pub fn is_allowed_mime_type(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    constants::ALLOWED_MIME_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

fn validate_confidence(confidence: Option<f64>) -> Result<()> {
    match confidence {
        Some(c) if !(0.0..=1.0).contains(&c) => Err(StoreError::validation(format!(
            "confidence {c} is outside [0, 1]"
        ))),
        _ => Ok(()),
    }
}

/// Transcription record store.
///
/// Cheap to clone; clones share the KV handle and clock.
#[derive(Clone)]
pub struct TranscriptionStore {
    kv: KvStore,
    clock: Arc<dyn Clock>,
    config: StoreConfig,
}

impl TranscriptionStore {
    /// Creates a store using wall-clock time.
    pub fn new(kv: KvStore, config: StoreConfig) -> Self {
        Self::with_clock(kv, config, Arc::new(SystemClock))
    }

    /// Creates a store with an explicit time source.
    pub fn with_clock(kv: KvStore, config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self { kv, clock, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub(crate) fn kv(&self) -> &KvStore {
        &self.kv
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Checks upload metadata against the size and MIME policies.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Validation`] naming the first violated constraint.
    pub fn validate_file(&self, meta: &FileMeta) -> Result<()> {
        if meta.original_filename.trim().is_empty() {
            return Err(StoreError::validation("original filename must not be empty"));
        }
        if meta.size_bytes == 0 {
            return Err(StoreError::validation("file must not be empty"));
        }
        if meta.size_bytes > self.config.max_file_size {
            return Err(StoreError::validation(format!(
                "file size {} exceeds maximum of {} bytes",
                meta.size_bytes, self.config.max_file_size
            )));
        }
        if !is_allowed_mime_type(&meta.mime_type) {
            return Err(StoreError::validation(format!(
                "unsupported MIME type '{}'",
                meta.mime_type
            )));
        }
        if let Some(duration) = meta.duration_seconds
            && !(duration.is_finite() && duration >= 0.0)
        {
            return Err(StoreError::validation(format!(
                "duration {duration} must be a non-negative number of seconds"
            )));
        }
        Ok(())
    }

    /// Persists a new transcription for `owner_id`.
    ///
    /// All validation happens before the first write. The record is written
    /// first and the owner index second; if the index append fails the
    /// record is still returned and readable by id, but won't be listed.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Validation`] for an empty owner, a bad file or an
    ///   out-of-range confidence
    /// - [`StoreError::Backend`] if the record write fails
    pub async fn create(
        &self,
        owner_id: &str,
        meta: FileMeta,
        produced: ProducedTranscript,
    ) -> Result<Transcription> {
        if owner_id.trim().is_empty() {
            return Err(StoreError::validation("owner id must not be empty"));
        }
        self.validate_file(&meta)?;
        validate_confidence(produced.confidence)?;

        let now = self.clock.now();
        let record = Transcription {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            original_filename: meta.original_filename,
            file_size_bytes: meta.size_bytes,
            mime_type: meta.mime_type,
            duration_seconds: meta.duration_seconds,
            text: produced.text,
            confidence: produced.confidence,
            status: TranscriptionStatus::Completed,
            created_at: now,
            expires_at: now + self.config.ttl,
        };

        self.write_record(&record, now).await?;
        metrics::record_store_operation("create");

        if let Err(e) = self.append_to_index(owner_id, &record.id).await {
            tracing::warn!(
                id = %record.id,
                owner = %owner_id,
                error = %e,
                "Record stored but owner index append failed; it will not be listed"
            );
        }

        tracing::debug!(id = %record.id, owner = %owner_id, "Created transcription");
        Ok(record)
    }

    /// Validates `upload`, runs it through `producer`, then calls
    /// [`create`](Self::create).
    ///
    /// # Errors
    ///
    /// Everything `create` returns, plus [`StoreError::Producer`] when the
    /// producer fails. No write happens in either failure case.
    pub async fn create_from_upload(
        &self,
        owner_id: &str,
        upload: &AudioUpload,
        producer: &dyn TranscriptionProducer,
    ) -> Result<Transcription> {
        if owner_id.trim().is_empty() {
            return Err(StoreError::validation("owner id must not be empty"));
        }
        let meta = upload.file_meta();
        self.validate_file(&meta)?;

        let produced = producer
            .transcribe(&upload.data, &upload.filename, &upload.mime_type)
            .await
            .inspect_err(|e| {
                tracing::warn!(owner = %owner_id, filename = %upload.filename, error = %e, "Producer failed");
            })?;

        self.create(owner_id, meta, produced).await
    }

    /// Fetches a record by id.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if no record exists. A record whose bytes
    /// fail to decode is logged and reported as not found as well.
    pub async fn get(&self, id: &str) -> Result<Transcription> {
        metrics::record_store_operation("get");
        self.fetch(id).await
    }

    /// `get` without the operation metric; used for every id a listing reads.
    async fn fetch(&self, id: &str) -> Result<Transcription> {
        match self.load(id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(StoreError::not_found(id)),
            Err(StoreError::CorruptRecord { key, source }) => {
                tracing::warn!(%key, error = %source, "Unreadable transcription record");
                Err(StoreError::not_found(id))
            },
            Err(e) => Err(e),
        }
    }

    /// Lists an owner's transcriptions, newest first.
    ///
    /// An owner without an index gets an empty list. Indexed ids whose
    /// record is missing or unreadable are skipped. Records with equal
    /// `created_at` keep their index order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the index itself cannot be read.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Transcription>> {
        metrics::record_store_operation("list");
        let ids = self.read_index(owner_id).await?;

        let mut records = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.fetch(id).await {
                Ok(record) => records.push(record),
                Err(StoreError::NotFound { .. }) => {
                    tracing::debug!(%id, owner = %owner_id, "Skipping missing indexed record");
                },
                Err(e) => {
                    tracing::warn!(%id, owner = %owner_id, error = %e, "Skipping unreadable indexed record");
                },
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    /// Changes the status, text or confidence of a record.
    ///
    /// Every other field is carried over from the stored record. The index
    /// is untouched.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the record doesn't exist
    /// - [`StoreError::Validation`] if the new confidence is out of range
    pub async fn update(&self, id: &str, patch: &TranscriptionPatch) -> Result<Transcription> {
        validate_confidence(patch.confidence)?;
        let existing = self.get(id).await?;

        let updated = patch.apply(&existing);
        self.write_record(&updated, self.clock.now()).await?;
        metrics::record_store_operation("update");

        tracing::debug!(%id, status = %updated.status, "Updated transcription");
        Ok(updated)
    }

    /// Removes a record and its owner index entry.
    ///
    /// A record that exists but can't be decoded is still removed; its index
    /// entry is left for the sweeper to repair.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the record doesn't exist (including when a
    /// concurrent delete wins the race).
    pub async fn delete(&self, id: &str) -> Result<()> {
        let key = keys::record_key(id);
        let owner_id = match self.load(id).await {
            Ok(Some(record)) => Some(record.owner_id),
            Ok(None) => return Err(StoreError::not_found(id)),
            Err(StoreError::CorruptRecord { source, .. }) => {
                tracing::warn!(%key, error = %source, "Deleting unreadable transcription record");
                None
            },
            Err(e) => return Err(e),
        };

        if !self.kv.delete(&key).await? {
            return Err(StoreError::not_found(id));
        }
        metrics::record_store_operation("delete");

        if let Some(owner_id) = owner_id
            && let Err(e) = self.remove_from_index(&owner_id, id).await
        {
            tracing::warn!(
                %id,
                owner = %owner_id,
                error = %e,
                "Record deleted but owner index update failed"
            );
        }

        tracing::debug!(%id, "Deleted transcription");
        Ok(())
    }

    /// Reads a record, surfacing decode failures as `CorruptRecord`.
    async fn load(&self, id: &str) -> Result<Option<Transcription>> {
        let key = keys::record_key(id);
        match self.kv.get(&key).await? {
            Some(bytes) => codec::decode_record(&key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Writes a record with a backend TTL matching its remaining lifetime.
    ///
    /// Records already past expiry are written without a backend TTL and
    /// left for the sweeper.
    async fn write_record(&self, record: &Transcription, now: DateTime<Utc>) -> Result<()> {
        let bytes = codec::encode_record(record)?;
        let ttl = remaining_ttl(record.expires_at, now);
        self.kv
            .put(&keys::record_key(&record.id), &bytes, ttl)
            .await?;
        Ok(())
    }

    /// Reads an owner's index; a missing or unreadable index is empty.
    pub(crate) async fn read_index(&self, owner_id: &str) -> Result<Vec<String>> {
        let key = keys::index_key(owner_id);
        let Some(bytes) = self.kv.get(&key).await? else {
            return Ok(Vec::new());
        };
        match codec::decode_index(&key, &bytes) {
            Ok(ids) => Ok(ids),
            Err(e) => {
                tracing::warn!(%key, error = %e, "Treating unreadable owner index as empty");
                Ok(Vec::new())
            },
        }
    }

    /// Writes an owner's index, deleting the key once it is empty.
    pub(crate) async fn write_index(&self, owner_id: &str, ids: &[String]) -> Result<()> {
        let key = keys::index_key(owner_id);
        if ids.is_empty() {
            self.kv.delete(&key).await?;
        } else {
            self.kv.put(&key, &codec::encode_index(ids)?, None).await?;
        }
        Ok(())
    }

    async fn append_to_index(&self, owner_id: &str, id: &str) -> Result<()> {
        let mut ids = self.read_index(owner_id).await?;
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
        self.write_index(owner_id, &ids).await
    }

    async fn remove_from_index(&self, owner_id: &str, id: &str) -> Result<()> {
        let mut ids = self.read_index(owner_id).await?;
        let before = ids.len();
        ids.retain(|existing| existing != id);
        if ids.len() == before {
            return Ok(());
        }
        self.write_index(owner_id, &ids).await
    }
}

fn remaining_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<Duration> {
    (expires_at - now)
        .to_std()
        .ok()
        .filter(|remaining| !remaining.is_zero())
}
