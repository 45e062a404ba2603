//! Storage contract consumed by the transcription store.
//!
//! Any technology that can provide point reads, TTL-aware writes, deletes and
//! a prefix scan can back the store.

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Untyped key-value backend.
///
/// All backends must be thread-safe (`Send + Sync`) for use with tokio.
/// No compare-and-swap is part of the contract: concurrent writers to the
/// same key race and the last write wins.
#[async_trait]
pub trait KvBackend: Send + Sync + 'static {
    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist or has expired.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores a value, replacing any previous one.
    ///
    /// With `ttl` set the backend may drop the entry once the duration has
    /// elapsed. `None` keeps it until it is deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Deletes a key.
    ///
    /// Returns `Ok(true)` if the key existed. Deleting a missing key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Returns every live key starting with `prefix`.
    ///
    /// The result is a snapshot: keys deleted after the scan may still be
    /// listed, and callers must treat a later miss as normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>>;

    /// Proactively drops entries whose TTL has elapsed.
    ///
    /// Returns the number of entries removed. Backends that expire entries
    /// natively can keep the default, which does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn purge_expired(&self) -> Result<usize> {
        Ok(0)
    }
}
