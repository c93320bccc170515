use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::CacheBackend;

/// Typed cache-aside access over a [`CacheBackend`].
///
/// `get_or_fetch` implements singleflight: concurrent callers for the same
/// key serialize on a per-key gate, and all but the first are served from
/// the cache entry the first one wrote.
pub struct CacheService {
    backend: Arc<dyn CacheBackend>,
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CacheService {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        self.backend
            .set(key, serde_json::to_value(value)?, ttl)
            .await
    }

    pub async fn update<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.backend.update(key, serde_json::to_value(value)?).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.backend.delete(key).await
    }

    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.backend.keys(pattern).await
    }

    pub async fn wait_until_ready(&self) -> Result<()> {
        self.backend.wait_until_ready().await
    }

    /// Get a cached value or build it with `fetcher`, storing the result.
    ///
    /// At most one fetch per key runs at a time; cache write failures are
    /// logged and the freshly fetched value is still returned.
    pub async fn get_or_fetch<T, F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        fetcher: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        if let Ok(Some(cached)) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let gate = {
            let mut inflight = self.inflight.lock();
            Arc::clone(
                inflight
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
            )
        };
        let guard = gate.lock().await;

        // A concurrent caller may have populated the key while we waited.
        if let Ok(Some(cached)) = self.get::<T>(key).await {
            return Ok(cached);
        }

        let data = fetcher().await?;

        if let Err(e) = self.set(key, &data, ttl).await {
            tracing::warn!("failed to cache value for key '{}': {}", key, e);
        }

        drop(guard);
        let mut inflight = self.inflight.lock();
        if inflight
            .get(key)
            .map(|gate| Arc::strong_count(gate) == 1)
            .unwrap_or(false)
        {
            inflight.remove(key);
        }

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCache;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn service() -> Arc<CacheService> {
        Arc::new(CacheService::new(Arc::new(MemoryCache::new())))
    }

    #[tokio::test]
    async fn fetches_on_miss_and_serves_from_cache_after() {
        let service = service();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<u32> = service
                .get_or_fetch("k", Duration::from_secs(60), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7u32)
                })
                .await;
            assert_eq!(value.unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn singleflight_runs_one_fetch_for_concurrent_callers() {
        let service = service();
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    let value: Result<u32> = service
                        .get_or_fetch("shared", Duration::from_secs(60), || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            // Hold the gate long enough for everyone to pile up.
                            tokio::time::sleep(Duration::from_millis(20)).await;
                            Ok(42u32)
                        })
                        .await;
                    value.unwrap()
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fetch_errors_propagate_and_are_not_cached() {
        let service = service();

        let result: std::result::Result<u32, String> = service
            .get_or_fetch("k", Duration::from_secs(60), || async {
                Err("upstream down".to_string())
            })
            .await;
        assert!(result.is_err());

        // The failure was not memoized; the next call fetches again.
        let result: std::result::Result<u32, String> = service
            .get_or_fetch("k", Duration::from_secs(60), || async { Ok(5u32) })
            .await;
        assert_eq!(result.unwrap(), 5);
    }
}
