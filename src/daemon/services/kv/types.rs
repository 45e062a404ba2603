//! Persisted entry envelope for backends without native expiry.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A stored value together with its absolute expiry.
///
/// `expires_at_ms` is milliseconds since the UNIX epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct KvEntry {
    pub(crate) value: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) expires_at_ms: Option<u64>,
}

impl KvEntry {
    pub(crate) fn new(value: Vec<u8>) -> Self {
        Self {
            value,
            expires_at_ms: None,
        }
    }

    pub(crate) fn with_ttl(value: Vec<u8>, ttl: Duration) -> Result<Self> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Ok(Self {
            value,
            expires_at_ms: Some(now_ms()?.saturating_add(ttl_ms)),
        })
    }

    pub(crate) fn is_expired(&self) -> Result<bool> {
        match self.expires_at_ms {
            Some(at) => Ok(now_ms()? >= at),
            None => Ok(false),
        }
    }
}

fn now_ms() -> Result<u64> {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the UNIX epoch")?;
    Ok(u64::try_from(since_epoch.as_millis()).unwrap_or(u64::MAX))
}
