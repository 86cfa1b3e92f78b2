//! Single-use code redemption under concurrent duplicates.
//!
//! External login callbacks are sometimes delivered twice in quick
//! succession with the same authorization code. The first arrival claims a
//! short-lived marker (`redeem:{sha256(code)}`), performs the redemption and
//! publishes its result. Later arrivals never redeem again: they poll for the
//! published result a bounded number of times and then give up with
//! `Error::Conflict("retry shortly")`.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use searchive_core::{defaults, Error, Result};

/// Short-lived key/value markers with atomic claim.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    /// Set `key` only if absent. Returns true if this caller claimed it.
    async fn claim(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Store `value` under `key`, overwriting.
    async fn publish(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    async fn fetch(&self, key: &str) -> Result<Option<String>>;

    async fn release(&self, key: &str) -> Result<()>;
}

fn redis_err(e: redis::RedisError) -> Error {
    Error::Request(format!("redis: {}", e))
}

/// Redis-backed markers (`SET NX PX`).
#[derive(Clone)]
pub struct RedisMarkerStore {
    conn: ConnectionManager,
}

impl RedisMarkerStore {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl MarkerStore for RedisMarkerStore {
    async fn claim(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.conn.clone();
        let reply = redis::cmd("SET")
            .arg(key)
            .arg("1")
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(redis_err)?;
        Ok(reply.is_some())
    }

    async fn publish(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .await
            .map_err(redis_err)
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key).await.map_err(redis_err)
    }

    async fn release(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(redis_err)
    }
}

/// In-process markers for tests and single-instance deployments.
#[derive(Default)]
pub struct InMemoryMarkerStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Internal("marker store lock poisoned".to_string()))
    }
}

#[async_trait]
impl MarkerStore for InMemoryMarkerStore {
    async fn claim(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        if let Some((_, expires)) = entries.get(key) {
            if *expires > now {
                return Ok(false);
            }
        }
        entries.insert(key.to_string(), ("1".to_string(), now + ttl));
        Ok(true)
    }

    async fn publish(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.lock()?
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>> {
        let entries = self.lock()?;
        Ok(entries
            .get(key)
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(v, _)| v.clone()))
    }

    async fn release(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Guard timings.
#[derive(Debug, Clone, Copy)]
pub struct RedemptionPolicy {
    pub lock_ttl: Duration,
    pub result_ttl: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for RedemptionPolicy {
    fn default() -> Self {
        Self {
            lock_ttl: Duration::from_millis(defaults::REDEMPTION_LOCK_TTL_MS),
            result_ttl: Duration::from_secs(defaults::REDEMPTION_RESULT_TTL_SECS),
            retries: defaults::REDEMPTION_RETRIES,
            retry_delay: Duration::from_millis(defaults::REDEMPTION_RETRY_DELAY_MS),
        }
    }
}

/// Library entry point for the external login callback flow.
///
/// This server never receives the callback itself. The login service embeds
/// a guard, usually via [`RedemptionGuard::redis`] over the same Redis the
/// session store reads, and wraps its code exchange in [`RedemptionGuard::redeem`].
#[derive(Clone)]
pub struct RedemptionGuard {
    store: Arc<dyn MarkerStore>,
    policy: RedemptionPolicy,
}

/// Marker key for `code`. The code itself never reaches the store.
pub fn marker_key(code: &str) -> String {
    format!("redeem:{}", hex::encode(Sha256::digest(code.as_bytes())))
}

impl RedemptionGuard {
    pub fn new(store: Arc<dyn MarkerStore>, policy: RedemptionPolicy) -> Self {
        Self { store, policy }
    }

    /// Guard backed by Redis markers with the default policy.
    pub fn redis(conn: ConnectionManager) -> Self {
        Self::new(
            Arc::new(RedisMarkerStore::new(conn)),
            RedemptionPolicy::default(),
        )
    }

    /// Run `redeem` at most once per `code` within the lock TTL.
    ///
    /// Concurrent callers with the same code receive the first caller's
    /// result, or `Error::Conflict` if it is not ready in time. A failed
    /// redemption releases the marker so the code can be retried.
    pub async fn redeem<T, F, Fut>(&self, code: &str, redeem: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let lock_key = marker_key(code);
        let result_key = format!("{}:result", lock_key);

        if let Some(published) = self.store.fetch(&result_key).await? {
            debug!("Redemption already completed, returning published result");
            return Ok(serde_json::from_str(&published)?);
        }

        if self.store.claim(&lock_key, self.policy.lock_ttl).await? {
            let value = match redeem().await {
                Ok(value) => value,
                Err(e) => {
                    if let Err(release_err) = self.store.release(&lock_key).await {
                        warn!(error = %release_err, "Failed to release redemption marker");
                    }
                    return Err(e);
                }
            };
            let serialized = serde_json::to_string(&value)?;
            self.store
                .publish(&result_key, &serialized, self.policy.result_ttl)
                .await?;
            info!("Code redeemed");
            return Ok(value);
        }

        for attempt in 1..=self.policy.retries {
            tokio::time::sleep(self.policy.retry_delay).await;
            if let Some(published) = self.store.fetch(&result_key).await? {
                debug!(attempt, "Joined concurrent redemption");
                return Ok(serde_json::from_str(&published)?);
            }
        }

        warn!(retries = self.policy.retries, "Concurrent redemption still in flight");
        Err(Error::Conflict("retry shortly".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn guard(retries: u32) -> RedemptionGuard {
        RedemptionGuard::new(
            Arc::new(InMemoryMarkerStore::new()),
            RedemptionPolicy {
                lock_ttl: Duration::from_secs(10),
                result_ttl: Duration::from_secs(60),
                retries,
                retry_delay: Duration::from_millis(20),
            },
        )
    }

    #[test]
    fn test_marker_key_hashes_code() {
        let key = marker_key("abc");
        assert!(key.starts_with("redeem:"));
        assert!(!key.contains("abc"));
        assert_eq!(key.len(), "redeem:".len() + 64);
    }

    #[tokio::test]
    async fn test_single_redemption() {
        let g = guard(3);
        let v: i64 = g.redeem("code", || async { Ok(7) }).await.unwrap();
        assert_eq!(v, 7);
    }

    #[tokio::test]
    async fn test_duplicate_after_completion_joins_result() {
        let g = guard(3);
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let v: i64 = g
                .redeem("code", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(v, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_redeem_once() {
        let g = guard(20);
        let calls = Arc::new(AtomicUsize::new(0));

        let run = |g: RedemptionGuard, calls: Arc<AtomicUsize>| async move {
            g.redeem("code", || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<i64, Error>(42)
            })
            .await
        };

        let (a, b) = futures::join!(
            run(g.clone(), calls.clone()),
            run(g.clone(), calls.clone())
        );
        assert_eq!(a.unwrap(), 42);
        assert_eq!(b.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_first_arrival_yields_conflict() {
        let g = guard(2);
        let slow = g.clone();
        let first = tokio::spawn(async move {
            slow.redeem("code", || async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<i64, Error>(1)
            })
            .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        let err = g
            .redeem("code", || async { Ok::<i64, Error>(2) })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(ref m) if m == "retry shortly"));
        assert_eq!(first.await.unwrap().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_redemption_releases_marker() {
        let g = guard(1);
        let err = g
            .redeem("code", || async {
                Err::<i64, Error>(Error::Request("provider down".into()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Request(_)));

        let v: i64 = g.redeem("code", || async { Ok(5) }).await.unwrap();
        assert_eq!(v, 5);
    }

    #[tokio::test]
    #[ignore = "requires Redis"]
    async fn test_redis_guard_redeems_concurrent_duplicates_once() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
        let conn = crate::startup::redis_connection(&url).await.unwrap();
        let g = RedemptionGuard::redis(conn);
        let code = format!("code-{}", uuid::Uuid::new_v4());
        let calls = Arc::new(AtomicUsize::new(0));

        let run = |g: RedemptionGuard, calls: Arc<AtomicUsize>| {
            let code = code.clone();
            async move {
                g.redeem(&code, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<String, Error>("session-token".to_string())
                })
                .await
            }
        };

        let (a, b) = futures::join!(
            run(g.clone(), calls.clone()),
            run(g.clone(), calls.clone())
        );
        assert_eq!(a.unwrap(), "session-token");
        assert_eq!(b.unwrap(), "session-token");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
