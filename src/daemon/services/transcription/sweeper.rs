//! Expiry sweeping and owner index repair.
//!
//! The sweeper scans primary records, deletes the ones past `expires_at`
//! through [`TranscriptionStore::delete`] (which also fixes the owner
//! index), and drops index entries whose record is gone. A failure on one key
//! is logged and skipped; only a failed scan aborts a pass. Running a pass
//! twice in a row is a no-op the second time.

use super::codec;
use super::error::{Result, StoreError};
use super::keys;
use super::store::TranscriptionStore;
use crate::daemon::metrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Backend entries dropped because their TTL elapsed.
    pub purged: usize,
    /// Expired records deleted.
    pub deleted: usize,
    /// Dangling index entries removed.
    pub repaired: usize,
}

/// Maintenance worker for a [`TranscriptionStore`].
#[derive(Clone)]
pub struct Sweeper {
    store: TranscriptionStore,
}

impl Sweeper {
    pub fn new(store: TranscriptionStore) -> Self {
        Self { store }
    }

    /// Deletes every record whose `expires_at` is before `now`.
    ///
    /// Returns how many records this call deleted. Records that vanish
    /// mid-sweep, fail to read or fail to decode are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] only if the key scan fails.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<usize> {
        let kv = self.store.kv();
        let record_keys = kv.scan_prefix(keys::RECORD_PREFIX).await?;
        let mut deleted = 0;

        for key in &record_keys {
            let Some(id) = keys::id_from_record_key(key) else {
                continue;
            };

            let bytes = match kv.get(key).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(%key, error = %e, "Sweep failed to read record");
                    continue;
                },
            };

            let record = match codec::decode_record(key, &bytes) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(%key, error = %e, "Sweep skipping unreadable record");
                    continue;
                },
            };

            if !record.is_expired_at(now) {
                continue;
            }

            match self.store.delete(id).await {
                Ok(()) => {
                    tracing::debug!(%id, expires_at = %record.expires_at, "Swept expired transcription");
                    deleted += 1;
                },
                Err(StoreError::NotFound { .. }) => {},
                Err(e) => {
                    tracing::warn!(%id, error = %e, "Sweep failed to delete expired record");
                },
            }
        }

        Ok(deleted)
    }

    /// Drops index entries that point at records which no longer exist.
    ///
    /// Returns the number of ids removed across all owners. An index that
    /// ends up empty is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] only if the key scan fails.
    pub async fn repair_indexes(&self) -> Result<usize> {
        let kv = self.store.kv();
        let index_keys = kv.scan_prefix(keys::INDEX_PREFIX).await?;
        let mut removed = 0;

        for key in &index_keys {
            let Some(owner_id) = keys::owner_from_index_key(key) else {
                continue;
            };
            match self.repair_index(owner_id).await {
                Ok(n) => removed += n,
                Err(e) => {
                    tracing::warn!(owner = %owner_id, error = %e, "Index repair failed");
                },
            }
        }

        Ok(removed)
    }

    async fn repair_index(&self, owner_id: &str) -> Result<usize> {
        let kv = self.store.kv();
        let ids = self.store.read_index(owner_id).await?;

        let mut live = Vec::with_capacity(ids.len());
        for id in ids.iter() {
            if kv.get(&keys::record_key(id)).await?.is_some() {
                live.push(id.clone());
            }
        }

        let removed = ids.len() - live.len();
        if removed > 0 {
            self.store.write_index(owner_id, &live).await?;
            tracing::debug!(owner = %owner_id, removed, "Repaired owner index");
        }
        Ok(removed)
    }

    /// Runs one full pass: backend purge, expiry sweep, index repair.
    ///
    /// # Errors
    ///
    /// Returns the first error from a scan or the backend purge.
    pub async fn run_once(&self) -> Result<SweepReport> {
        let purged = self.store.kv().purge_expired().await?;
        let deleted = self.sweep(self.store.now()).await?;
        let repaired = self.repair_indexes().await?;

        let report = SweepReport {
            purged,
            deleted,
            repaired,
        };
        metrics::record_sweep(&report);
        if report != SweepReport::default() {
            tracing::info!(purged, deleted, repaired, "Sweep finished");
        }
        Ok(report)
    }

    /// Runs [`run_once`](Self::run_once) every `interval` on a tokio task.
    ///
    /// The first pass happens immediately. Failed passes are logged and the
    /// loop continues; abort the returned handle to stop it.
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    tracing::warn!(error = %e, "Sweep pass failed");
                }
            }
        })
    }
}
