use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::SqlitePool;

use crate::error::Result;
use crate::CacheBackend;

/// SQLite-backed cache. Values are stored as JSON text with an absolute
/// expiry timestamp; expired rows are invisible to reads and reaped by
/// [`SqliteCache::cleanup`].
pub struct SqliteCache {
    db: SqlitePool,
}

impl SqliteCache {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    fn now_millis() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    /// Delete expired rows. Returns the number removed.
    pub async fn cleanup(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cache WHERE expires_at <= ?")
            .bind(Self::now_millis())
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CacheBackend for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM cache WHERE cache_key = ? AND expires_at > ?")
                .bind(key)
                .bind(Self::now_millis())
                .fetch_optional(&self.db)
                .await?;

        match row {
            Some((data,)) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        let expires_at = Self::now_millis() + ttl.as_millis() as i64;
        sqlx::query("INSERT OR REPLACE INTO cache (cache_key, data, expires_at) VALUES (?, ?, ?)")
            .bind(key)
            .bind(serde_json::to_string(&value)?)
            .bind(expires_at)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn update(&self, key: &str, value: Value) -> Result<()> {
        // Only live rows are touched; expires_at is left as-is.
        sqlx::query("UPDATE cache SET data = ? WHERE cache_key = ? AND expires_at > ?")
            .bind(serde_json::to_string(&value)?)
            .bind(key)
            .bind(Self::now_millis())
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM cache WHERE cache_key = ?")
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        // Escape SQL wildcards in the glob, then translate `*` to `%`.
        let like = pattern
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_")
            .replace('*', "%");
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT cache_key FROM cache WHERE cache_key LIKE ? ESCAPE '\\' AND expires_at > ?",
        )
        .bind(like)
        .bind(Self::now_millis())
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }

    async fn wait_until_ready(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS cache (
                cache_key TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )",
        )
        .execute(&self.db)
        .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_cache_expires_at ON cache (expires_at)")
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
