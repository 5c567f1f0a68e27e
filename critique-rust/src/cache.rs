//! Content-addressed result cache with expiry and per-key single flight.

use crate::{request::NormalizedInput, Category, Mode};
use futures::future::BoxFuture;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::{
    collections::HashMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use thiserror::Error;
use tokio::{sync::OnceCell, time::Instant};

/// Default time-to-live of an entry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// A key-value backend holding serialized results.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store `value` under `key`, expiring after `ttl`.
    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;
}

/// In-process store. Expiry follows the tokio clock.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, (String, Instant)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of stored entries. Expired entries count until the next write
    /// or a read of their key prunes them.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = self.entries();
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut entries = self.entries();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value, now + ttl));
        Ok(())
    }
}

type Connect = Box<dyn Fn() -> BoxFuture<'static, Result<Arc<dyn CacheStore>, CacheError>> + Send + Sync>;

/// A store whose backend connection is opened on first use and then reused.
/// A failed connect leaves it unopened so the next request tries again.
pub struct LazyCacheStore {
    connect: Connect,
    handle: OnceCell<Arc<dyn CacheStore>>,
}

impl LazyCacheStore {
    pub fn new<F, Fut>(connect: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn CacheStore>, CacheError>> + Send + 'static,
    {
        Self {
            connect: Box::new(move || Box::pin(connect())),
            handle: OnceCell::new(),
        }
    }

    async fn handle(&self) -> Result<&Arc<dyn CacheStore>, CacheError> {
        self.handle
            .get_or_try_init(|| {
                tracing::info!("opening cache backend");
                (self.connect)()
            })
            .await
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handle.initialized()
    }
}

#[async_trait::async_trait]
impl CacheStore for LazyCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.handle().await?.get(key).await
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.handle().await?.set_ex(key, value, ttl).await
    }
}

/// Deterministic digest of request content plus its category and mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    mode: Mode,
    digest: String,
}

impl Fingerprint {
    #[must_use]
    pub fn compute(input: &NormalizedInput, category: Category, mode: Mode) -> Self {
        let mut hasher = Sha256::new();
        update_field(&mut hasher, input.text.as_bytes());
        update_field(&mut hasher, input.goal.as_str().as_bytes());
        update_optional(&mut hasher, input.audience.as_deref());
        update_optional(&mut hasher, input.platform.as_deref());
        update_field(&mut hasher, category.as_str().as_bytes());
        hasher.update((input.images.len() as u64).to_le_bytes());
        for image in &input.images {
            update_field(&mut hasher, image.media_type.as_bytes());
            update_field(&mut hasher, image.data.as_bytes());
        }

        Self {
            mode,
            digest: hex::encode(hasher.finalize()),
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// `workflow:<mode>:<hex digest>`
    #[must_use]
    pub fn key(&self) -> String {
        format!("workflow:{}:{}", self.mode.as_str(), self.digest)
    }
}

fn update_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

fn update_optional(hasher: &mut Sha256, value: Option<&str>) {
    match value {
        Some(value) => {
            hasher.update([1u8]);
            update_field(hasher, value.as_bytes());
        }
        None => hasher.update([0u8]),
    }
}

/// A value and whether it came from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    pub hit: bool,
}

/// Best-effort cache in front of an expensive computation.
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    in_flight: Mutex<HashMap<String, Weak<tokio::sync::Mutex<()>>>>,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value for `fingerprint`, or run `compute` and cache
    /// its success. At most one computation per key runs at a time; callers
    /// that waited re-check the store first. Chat fingerprints are never
    /// cached. Store failures only cost the cache, never the request.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        fingerprint: &Fingerprint,
        compute: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if fingerprint.mode() == Mode::Chat {
            return compute().await.map(|value| Cached { value, hit: false });
        }

        let key = fingerprint.key();
        if let Some(value) = self.read(&key).await {
            return Ok(Cached { value, hit: true });
        }

        let in_flight = self.acquire(&key);
        let _guard = in_flight.lock().await;
        match self.read(&key).await {
            Some(value) => Ok(Cached { value, hit: true }),
            None => {
                let result = compute().await;
                if let Ok(value) = &result {
                    self.write(&key, value).await;
                }
                result.map(|value| Cached { value, hit: false })
            }
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    tracing::debug!(key, "cache hit");
                    Some(value)
                }
                Err(error) => {
                    tracing::warn!(key, %error, "discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                tracing::warn!(key, %error, "cache read failed, computing directly");
                None
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(key, %error, "could not serialize result for cache");
                return;
            }
        };
        if let Err(error) = self.store.set_ex(key, raw, self.ttl).await {
            tracing::warn!(key, %error, "cache write failed, result not cached");
        }
    }

    fn in_flight(&self) -> MutexGuard<'_, HashMap<String, Weak<tokio::sync::Mutex<()>>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire<'a>(&'a self, key: &'a str) -> InFlight<'a> {
        let mut in_flight = self.in_flight();
        let lock = match in_flight.get(key).and_then(Weak::upgrade) {
            Some(lock) => lock,
            None => {
                let lock = Arc::new(tokio::sync::Mutex::new(()));
                in_flight.insert(key.to_string(), Arc::downgrade(&lock));
                lock
            }
        };
        InFlight {
            cache: self,
            key,
            lock,
        }
    }

    /// Forget `key` when the caller dropping its handle is the last holder.
    /// Handles are only cloned under the map lock, so the count is stable here.
    fn release(&self, key: &str) {
        let mut in_flight = self.in_flight();
        if in_flight
            .get(key)
            .is_none_or(|lock| lock.strong_count() <= 1)
        {
            in_flight.remove(key);
        }
    }
}

/// A handle on the per-key lock. Dropping it, including when the caller's
/// future is cancelled, removes the key once nobody else holds the lock.
struct InFlight<'a> {
    cache: &'a ResultCache,
    key: &'a str,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl InFlight<'_> {
    async fn lock(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.lock.lock().await
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.cache.release(self.key);
    }
}
