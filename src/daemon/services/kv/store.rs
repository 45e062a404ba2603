//! Cloneable handle over a [`KvBackend`].

use super::backend::KvBackend;
use super::memory::MemoryBackend;
use super::redb::RedbBackend;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Shared key-value store handle.
///
/// Clones share the backend. `serve` builds one over a [`RedbBackend`];
/// tests use a [`MemoryBackend`].
#[derive(Clone)]
pub struct KvStore {
    backend: Arc<dyn KvBackend>,
}

impl KvStore {
    /// Opens a persistent redb-backed store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::custom(RedbBackend::open(path)?))
    }

    /// Creates a fresh in-memory store.
    pub fn memory() -> Self {
        Self::custom(MemoryBackend::new())
    }

    /// Wraps a caller-provided backend.
    pub fn custom<B: KvBackend>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Retrieves a value by key.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.backend.get(key).await
    }

    /// Stores a value with an optional TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn put(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        self.backend.put(key, value.to_vec(), ttl).await
    }

    /// Deletes a key, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.backend.delete(key).await
    }

    /// Lists live keys starting with `prefix`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        self.backend.scan_prefix(prefix).await
    }

    /// Drops entries whose backend TTL has elapsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    pub async fn purge_expired(&self) -> Result<usize> {
        self.backend.purge_expired().await
    }
}
