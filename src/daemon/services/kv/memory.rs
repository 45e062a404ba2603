//! In-memory KV backend.
//!
//! Backed by `DashMap`; entries expire lazily on access or eagerly through
//! [`KvBackend::purge_expired`].

use super::backend::KvBackend;
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct MemoryEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() >= exp)
    }
}

/// Non-persistent backend for tests, development and embedding.
///
/// Cloning shares the underlying map, so a test can keep a handle to the
/// backend it gave to a [`KvStore`](super::KvStore) and poke at raw keys.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Arc<DashMap<String, MemoryEntry>>,
}

impl MemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, including ones that have expired but not
    /// yet been purged.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(entry) = self.data.get(key) else {
            return Ok(None);
        };
        if entry.is_expired() {
            drop(entry);
            self.data.remove_if(key, |_, e| e.is_expired());
            return Ok(None);
        }
        Ok(Some(entry.value.clone()))
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        self.data
            .insert(key.to_string(), MemoryEntry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.data.remove(key).is_some())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .data
            .iter()
            .filter(|entry| entry.key().starts_with(prefix) && !entry.value().is_expired())
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn purge_expired(&self) -> Result<usize> {
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired());
        Ok(before.saturating_sub(self.data.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let backend = MemoryBackend::new();

        backend.put("key1", b"value1".to_vec(), None).await.unwrap();
        let value = backend.get("key1").await.unwrap();
        assert_eq!(value, Some(b"value1".to_vec()));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_reports_presence() {
        let backend = MemoryBackend::new();

        backend.put("key1", b"value1".to_vec(), None).await.unwrap();
        assert!(backend.delete("key1").await.unwrap());
        assert!(!backend.delete("key1").await.unwrap());
        assert_eq!(backend.get("key1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scan_prefix_is_sorted_and_filtered() {
        let backend = MemoryBackend::new();

        backend.put("transcription:b", b"v".to_vec(), None).await.unwrap();
        backend.put("transcription:a", b"v".to_vec(), None).await.unwrap();
        backend.put("user_transcriptions:u1", b"v".to_vec(), None).await.unwrap();

        let keys = backend.scan_prefix("transcription:").await.unwrap();
        assert_eq!(keys, vec!["transcription:a", "transcription:b"]);
    }

    #[tokio::test]
    async fn test_ttl_expiration() {
        let backend = MemoryBackend::new();

        backend
            .put("expiring", b"value".to_vec(), Some(Duration::from_millis(10)))
            .await
            .unwrap();
        assert!(backend.get("expiring").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(backend.get("expiring").await.unwrap().is_none());
        assert!(backend.scan_prefix("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_purge_expired_counts_removed() {
        let backend = MemoryBackend::new();

        backend.put("keep", b"v".to_vec(), None).await.unwrap();
        backend
            .put("drop", b"v".to_vec(), Some(Duration::ZERO))
            .await
            .unwrap();

        assert_eq!(backend.purge_expired().await.unwrap(), 1);
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let backend = MemoryBackend::new();
        let handle = backend.clone();

        backend.put("shared", b"v".to_vec(), None).await.unwrap();
        assert!(!handle.is_empty());
    }
}
