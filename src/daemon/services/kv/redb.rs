//! Redb-backed KV backend.
//!
//! Persists entries on local disk inside a single table. Values are wrapped
//! in a JSON [`KvEntry`] envelope carrying the absolute expiry, and expired
//! entries are treated as absent on every read path.

use super::backend::KvBackend;
use super::types::KvEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub(crate) const KV_TABLE: TableDefinition<'static, &'static str, &'static [u8]> =
    TableDefinition::new("scribe_kv");

/// Persistent backend with ACID guarantees.
///
/// `RedbBackend` is `Clone`; clones share one database handle.
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Opens or creates a database at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Parent directory cannot be created
    /// - Database file cannot be opened or created
    /// - Initialization transaction fails to begin or commit
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        let db = Database::create(path)
            .with_context(|| format!("Failed to open store database: {}", path.display()))?;

        // Create the table up front so read transactions can always open it
        let write_txn = db
            .begin_write()
            .context("Failed to begin initialization transaction")?;
        {
            let _table = write_txn
                .open_table(KV_TABLE)
                .context("Failed to initialize KV table")?;
        }
        write_txn
            .commit()
            .context("Failed to commit initialization transaction")?;

        Ok(Self { db: Arc::new(db) })
    }

    fn get_sync(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(KV_TABLE)
            .context("Failed to open KV table")?;

        let Some(guard) = table
            .get(key)
            .with_context(|| format!("Failed to read key '{key}'"))?
        else {
            return Ok(None);
        };

        let entry: KvEntry = serde_json::from_slice(guard.value())
            .with_context(|| format!("Failed to deserialize entry for key '{key}'"))?;

        if entry.is_expired()? {
            drop(guard);
            drop(table);
            drop(read_txn);
            self.delete_expired_sync(key)?;
            return Ok(None);
        }

        Ok(Some(entry.value))
    }

    fn put_sync(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let entry = match ttl {
            Some(ttl) => KvEntry::with_ttl(value, ttl)?,
            None => KvEntry::new(value),
        };
        let json = serde_json::to_vec(&entry).context("Failed to serialize entry to JSON")?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(KV_TABLE)
                .context("Failed to open KV table")?;
            table
                .insert(key, json.as_slice())
                .with_context(|| format!("Failed to insert key '{key}'"))?;
        }
        write_txn
            .commit()
            .context("Failed to commit put transaction")?;

        Ok(())
    }

    fn delete_sync(&self, key: &str) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let removed = {
            let mut table = write_txn
                .open_table(KV_TABLE)
                .context("Failed to open KV table")?;
            table
                .remove(key)
                .with_context(|| format!("Failed to remove key '{key}'"))?
                .is_some()
        };
        write_txn
            .commit()
            .context("Failed to commit delete transaction")?;

        Ok(removed)
    }

    /// Removes `key` only if it is still expired inside the write
    /// transaction, so a `put` racing the expiry check survives.
    fn delete_expired_sync(&self, key: &str) -> Result<bool> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let removed = {
            let mut table = write_txn
                .open_table(KV_TABLE)
                .context("Failed to open KV table")?;
            remove_if_expired(&mut table, key)?
        };
        write_txn
            .commit()
            .context("Failed to commit expiry transaction")?;

        Ok(removed)
    }

    fn scan_prefix_sync(&self, prefix: &str) -> Result<Vec<String>> {
        let read_txn = self
            .db
            .begin_read()
            .context("Failed to begin read transaction")?;
        let table = read_txn
            .open_table(KV_TABLE)
            .context("Failed to open KV table")?;

        let mut keys = Vec::new();
        for item in table
            .range(prefix..)
            .with_context(|| format!("Failed to scan prefix '{prefix}'"))?
        {
            let (key, value) = item.context("Failed to read KV entry")?;
            let key = key.value();
            if !key.starts_with(prefix) {
                break;
            }
            // Unreadable envelopes are left for the caller to surface on get
            let expired = serde_json::from_slice::<KvEntry>(value.value())
                .ok()
                .map(|entry| entry.is_expired())
                .transpose()?
                .unwrap_or(false);
            if !expired {
                keys.push(key.to_string());
            }
        }

        Ok(keys)
    }

    fn purge_expired_sync(&self) -> Result<usize> {
        let expired = {
            let read_txn = self
                .db
                .begin_read()
                .context("Failed to begin read transaction")?;
            let table = read_txn
                .open_table(KV_TABLE)
                .context("Failed to open KV table")?;

            let mut expired = Vec::new();
            for item in table.iter().context("Failed to iterate KV table")? {
                let (key, value) = item.context("Failed to read KV entry")?;
                if let Ok(entry) = serde_json::from_slice::<KvEntry>(value.value())
                    && entry.is_expired()?
                {
                    expired.push(key.value().to_string());
                }
            }
            expired
        };

        if expired.is_empty() {
            return Ok(0);
        }

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        let mut removed = 0;
        {
            let mut table = write_txn
                .open_table(KV_TABLE)
                .context("Failed to open KV table")?;
            for key in &expired {
                if remove_if_expired(&mut table, key)? {
                    removed += 1;
                }
            }
        }
        write_txn
            .commit()
            .context("Failed to commit purge transaction")?;

        Ok(removed)
    }
}

/// Deletes `key` if its stored envelope has expired. Unreadable envelopes
/// are kept.
fn remove_if_expired(table: &mut Table<'_, &'static str, &'static [u8]>, key: &str) -> Result<bool> {
    let expired = match table
        .get(key)
        .with_context(|| format!("Failed to read key '{key}'"))?
    {
        Some(guard) => serde_json::from_slice::<KvEntry>(guard.value())
            .ok()
            .map(|entry| entry.is_expired())
            .transpose()?
            .unwrap_or(false),
        None => false,
    };

    if expired {
        table
            .remove(key)
            .with_context(|| format!("Failed to remove key '{key}'"))?;
    }
    Ok(expired)
}

#[async_trait]
impl KvBackend for RedbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let backend = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || backend.get_sync(&key))
            .await
            .context("Task join error")?
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let backend = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || backend.put_sync(&key, value, ttl))
            .await
            .context("Task join error")?
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let backend = self.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || backend.delete_sync(&key))
            .await
            .context("Task join error")?
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let backend = self.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || backend.scan_prefix_sync(&prefix))
            .await
            .context("Task join error")?
    }

    async fn purge_expired(&self) -> Result<usize> {
        let backend = self.clone();
        tokio::task::spawn_blocking(move || backend.purge_expired_sync())
            .await
            .context("Task join error")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, RedbBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = RedbBackend::open(dir.path().join("kv.redb")).unwrap();
        (dir, backend)
    }

    #[test]
    fn test_expiry_delete_keeps_rewritten_value() {
        let (_dir, backend) = open_temp();
        backend.put_sync("k", b"old".to_vec(), Some(Duration::ZERO)).unwrap();
        // A fresh write lands between the expired read and the delete
        backend.put_sync("k", b"new".to_vec(), None).unwrap();

        assert!(!backend.delete_expired_sync("k").unwrap());
        assert_eq!(backend.get_sync("k").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_expiry_delete_removes_expired_value() {
        let (_dir, backend) = open_temp();
        backend.put_sync("k", b"old".to_vec(), Some(Duration::ZERO)).unwrap();

        assert!(backend.delete_expired_sync("k").unwrap());
        assert!(!backend.delete_sync("k").unwrap());
    }

    #[test]
    fn test_purge_skips_entries_rewritten_without_ttl() {
        let (_dir, backend) = open_temp();
        backend.put_sync("gone", b"v".to_vec(), Some(Duration::ZERO)).unwrap();
        backend.put_sync("kept", b"v".to_vec(), Some(Duration::ZERO)).unwrap();
        backend.put_sync("kept", b"v2".to_vec(), None).unwrap();

        assert_eq!(backend.purge_expired_sync().unwrap(), 1);
        assert_eq!(backend.get_sync("kept").unwrap(), Some(b"v2".to_vec()));
    }
}
