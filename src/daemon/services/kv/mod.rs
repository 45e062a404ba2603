//! Key-value layer backing the transcription store.
//!
//! The transcription store never talks to a concrete database. It is handed a
//! [`KvStore`], which wraps one of the pluggable backends:
//!
//! - **RedbBackend**: persistent, ACID storage on local disk (default for `serve`)
//! - **MemoryBackend**: non-persistent storage for tests and embedding
//!
//! # Example
//!
//! ```ignore
//! use scribe::daemon::services::kv::KvStore;
//! use std::time::Duration;
//!
//! let kv = KvStore::memory();
//! kv.put("transcription:abc", b"{}", Some(Duration::from_secs(60))).await?;
//! let keys = kv.scan_prefix("transcription:").await?;
//! ```
//!
//! Any other store (Redis, etc.) plugs in by implementing [`KvBackend`] and
//! passing it to [`KvStore::custom`].

mod backend;
mod memory;
mod redb;
mod store;
mod types;


pub use backend::KvBackend;
pub use memory::MemoryBackend;
pub use redb::RedbBackend;
pub use store::KvStore;
