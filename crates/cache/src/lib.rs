//! Shared key/value cache.
//!
//! The pipeline memoizes upstream responses (catalog metadata, SeaDex
//! lookups) through this cache. Two backends are provided: an in-memory map
//! and a SQLite table; both honor the same contract:
//!
//! - `set` stores a value with a TTL,
//! - `update` replaces a value while **preserving** its remaining TTL
//!   (a no-op when the key is absent or expired),
//! - `keys` lists live keys matching a `*` glob pattern,
//! - `wait_until_ready` blocks until the backend can serve requests.
//!
//! [`CacheService`] layers typed cache-aside access on top, with
//! singleflight semantics: at most one concurrent fetch per key.

mod error;
mod memory;
mod service;
mod sqlite;

pub use error::{CacheError, Result};
pub use memory::MemoryCache;
pub use service::CacheService;
pub use sqlite::SqliteCache;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get a live (non-expired) value.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store a value with a time-to-live.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;

    /// Replace the value for a live key, keeping its remaining TTL.
    async fn update(&self, key: &str, value: Value) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Live keys matching a glob pattern (`*` matches any run of characters).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Block until the backend is usable (creates schema, etc).
    async fn wait_until_ready(&self) -> Result<()>;
}

/// Match a key against a `*` glob pattern.
pub(crate) fn glob_match(pattern: &str, key: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == key;
    }

    let mut rest = key;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(stripped) => rest = stripped,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    // Pattern ended with `*`: anything left over matches.
    true
}

#[cfg(test)]
mod tests {
    use super::glob_match;

    #[test]
    fn glob_matching() {
        assert!(glob_match("*", "anything"));
        assert!(glob_match("metadata:*", "metadata:movie:603"));
        assert!(!glob_match("metadata:*", "seadex:123"));
        assert!(glob_match("*:603", "metadata:movie:603"));
        assert!(glob_match("metadata:*:603", "metadata:movie:603"));
        assert!(!glob_match("metadata:*:604", "metadata:movie:603"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
    }
}
