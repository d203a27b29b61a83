use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::{CacheError, CacheStore};

/// Aggregate numbers about the feed cache table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: i64,
    pub total_size_bytes: i64,
    pub oldest_entry: Option<String>,
    pub newest_entry: Option<String>,
}

/// SQLite-backed [`CacheStore`].
///
/// Each feed URL is one row; writes use `INSERT OR REPLACE`, reads filter on
/// `expires_at`. Expired rows stay on disk until [`SqliteCache::evict_expired`]
/// runs.
#[derive(Clone)]
pub struct SqliteCache {
    pub(crate) pool: SqlitePool,
}

impl SqliteCache {
    /// Open (or create) the cache database at `path` and run migrations.
    ///
    /// `":memory:"` gives a private in-memory database on a single pooled
    /// connection that is never recycled.
    pub async fn open(path: &str) -> Result<Self, CacheError> {
        let in_memory = path == ":memory:";
        let url = format!("sqlite:{}?mode=rwc", path);

        // busy_timeout=5000: wait up to 5 seconds for another writer before SQLITE_BUSY
        let options = SqliteConnectOptions::from_str(&url)?.pragma("busy_timeout", "5000");

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let cache = Self { pool };
        cache
            .migrate()
            .await
            .map_err(|e| CacheError::Migration(e.to_string()))?;
        Ok(cache)
    }

    async fn migrate(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS feed_cache (
                key TEXT PRIMARY KEY,
                body BLOB NOT NULL,
                fetched_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                size_bytes INTEGER NOT NULL
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_feed_cache_expires_at ON feed_cache(expires_at)",
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Delete all expired cache entries.
    ///
    /// Returns the number of entries evicted.
    pub async fn evict_expired(&self) -> Result<u64, CacheError> {
        let result = sqlx::query("DELETE FROM feed_cache WHERE expires_at <= datetime('now')")
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            tracing::debug!(evicted = result.rows_affected(), "Evicted expired feed cache rows");
        }
        Ok(result.rows_affected())
    }

    /// Compute aggregate cache statistics.
    ///
    /// Returns total entry count, total size in bytes, and oldest/newest
    /// `fetched_at` timestamps. Expired rows that have not been evicted yet
    /// are counted.
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let row: (i64, Option<i64>, Option<String>, Option<String>) = sqlx::query_as(
            r#"
            SELECT COUNT(*), SUM(size_bytes), MIN(fetched_at), MAX(fetched_at)
            FROM feed_cache
        "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CacheStats {
            total_entries: row.0,
            total_size_bytes: row.1.unwrap_or(0),
            oldest_entry: row.2,
            newest_entry: row.3,
        })
    }
}

#[async_trait]
impl CacheStore for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as(
            r#"
            SELECT body
            FROM feed_cache
            WHERE key = ? AND expires_at > datetime('now')
        "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(body,)| body))
    }

    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        // SQLite timestamps have whole-second resolution; round partial seconds
        // up so only a zero TTL expires on write, as in MemoryCache
        let ttl_secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
        let ttl_modifier = format!("+{} seconds", ttl_secs);
        let size_bytes = value.len() as i64;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO feed_cache
                (key, body, fetched_at, expires_at, size_bytes)
            VALUES (?, ?, datetime('now'), datetime('now', ?), ?)
        "#,
        )
        .bind(key)
        .bind(value)
        .bind(&ttl_modifier)
        .bind(size_bytes)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
