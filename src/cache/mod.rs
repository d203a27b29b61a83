//! Key-value stores for serialized feed payloads.
//!
//! The feed service only needs `get` and `put` with a TTL. Two backends
//! ship with the crate:
//!
//! - [`MemoryCache`] - bounded in-process LRU, lost on restart
//! - [`SqliteCache`] - SQLite table shared across restarts and processes
//!
//! Writes always replace the whole value, so concurrent writers for the same
//! key are last-write-wins and need no coordination.

mod memory;
mod sqlite;

pub use memory::MemoryCache;
pub use sqlite::{CacheStats, SqliteCache};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Generic database error
    #[error("Cache database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema setup failed
    #[error("Cache migration failed: {0}")]
    Migration(String),
}

/// A byte-valued store with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the stored value, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;
}
