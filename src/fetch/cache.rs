//! Upstream cache layer for computed variants.
//!
//! The orchestrator never caches or locks anything itself. It is handed to a
//! [`CacheLayer`] as a [`Compute`], and the layer decides when to call it:
//! only on a miss, and only once at a time per key no matter how many
//! requests for that key race.
//!
//! [`VariantCache`] is the in-process implementation: an LRU bounded by the
//! total size of cached bytes, with singleflight over in-flight misses.
//! Failed computations are handed to every coalesced caller but never
//! cached, so the next request retries from scratch.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use crate::error::FetchError;

use super::key::CacheKey;

/// Default cache capacity: 64MB
pub const DEFAULT_VARIANT_CACHE_CAPACITY: usize = 64 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 10_000;

// =============================================================================
// Contracts
// =============================================================================

/// Produces the bytes for a key on a cache miss.
#[async_trait]
pub trait Compute: Send + Sync {
    async fn compute(&self, key: &CacheKey) -> Result<Bytes, FetchError>;
}

/// Resolves keys to bytes, calling back into a [`Compute`] only on a miss.
///
/// Implementations must coalesce concurrent misses: while a computation for
/// a key is running, other callers for an equal key wait for its result
/// instead of starting their own.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    async fn resolve(&self, key: &CacheKey, compute: &dyn Compute) -> Result<Lookup, FetchError>;
}

/// Result of a cache layer lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// The variant's encoded bytes
    pub data: Bytes,

    /// Whether the bytes came from the cache rather than this call's compute
    pub cache_hit: bool,
}

// =============================================================================
// Variant Cache
// =============================================================================

type InFlight = Arc<OnceCell<Result<Bytes, FetchError>>>;

/// Size-bounded LRU of computed variants with request coalescing.
///
/// # Thread Safety
///
/// The cache is thread-safe and can be shared across async tasks via `Arc`.
pub struct VariantCache {
    /// The underlying LRU cache
    cache: RwLock<LruCache<CacheKey, Bytes>>,

    /// Maximum total size in bytes
    max_size: usize,

    /// Current total size in bytes
    current_size: RwLock<usize>,

    /// Computations currently running, one cell per key. Only locked for
    /// map updates, never across an await.
    in_flight: StdMutex<HashMap<CacheKey, InFlight>>,
}

impl VariantCache {
    /// Create a new variant cache with default capacity (64MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_VARIANT_CACHE_CAPACITY)
    }

    /// Create a new variant cache with the specified capacity in bytes.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a new variant cache with specified capacity and maximum entries.
    ///
    /// A zero `max_entries` is treated as one.
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        Self {
            cache: RwLock::new(LruCache::new(
                NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN),
            )),
            max_size,
            current_size: RwLock::new(0),
            in_flight: StdMutex::new(HashMap::new()),
        }
    }

    /// Get a variant from the cache, marking it as recently used.
    pub async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        let mut cache = self.cache.write().await;
        cache.get(key).cloned()
    }

    /// Check if a variant is cached without updating LRU order.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        let cache = self.cache.read().await;
        cache.contains(key)
    }

    /// Store a variant, evicting least-recently-used entries over capacity.
    pub async fn put(&self, key: CacheKey, data: Bytes) {
        let data_size = data.len();
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        if let Some(old_data) = cache.peek(&key) {
            *current_size = current_size.saturating_sub(old_data.len());
        }

        // The entry cap can push out an entry on its own
        if let Some((_, evicted)) = cache.push(key, data) {
            *current_size = current_size.saturating_sub(evicted.len());
        }
        *current_size += data_size;

        while *current_size > self.max_size {
            if let Some((_, evicted_data)) = cache.pop_lru() {
                *current_size = current_size.saturating_sub(evicted_data.len());
            } else {
                break;
            }
        }
    }

    /// Remove all entries.
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;
        cache.clear();
        *current_size = 0;
    }

    /// Get the current number of cached variants.
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.len()
    }

    /// Check if the cache is empty.
    pub async fn is_empty(&self) -> bool {
        let cache = self.cache.read().await;
        cache.is_empty()
    }

    /// Get the current total size of cached variants in bytes.
    pub async fn size(&self) -> usize {
        *self.current_size.read().await
    }

    /// Get the maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }

    /// Number of keys with a computation in progress.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for VariantCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Deregisters a finished in-flight cell when its holder goes away.
///
/// Every caller that joined a cell holds one of these, so the entry is
/// removed even if the caller that ran the computation is cancelled before
/// it could clean up. Unfinished cells stay registered: a remaining or later
/// caller takes over the computation.
struct InFlightGuard<'a> {
    in_flight: &'a StdMutex<HashMap<CacheKey, InFlight>>,
    key: &'a CacheKey,
    cell: InFlight,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.cell.initialized() {
            return;
        }
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight
            .get(self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.cell))
        {
            in_flight.remove(self.key);
        }
    }
}

#[async_trait]
impl CacheLayer for VariantCache {
    async fn resolve(&self, key: &CacheKey, compute: &dyn Compute) -> Result<Lookup, FetchError> {
        // Fast path: cached
        if let Some(data) = self.get(key).await {
            return Ok(Lookup {
                data,
                cache_hit: true,
            });
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            in_flight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        let _guard = InFlightGuard {
            in_flight: &self.in_flight,
            key,
            cell: Arc::clone(&cell),
        };

        let computed = AtomicBool::new(false);
        let computed_ref = &computed;
        let result = cell
            .get_or_init(|| async move {
                // A previous leader may have finished between the fast path
                // and registering this cell
                if let Some(data) = self.get(key).await {
                    return Ok(data);
                }

                computed_ref.store(true, Ordering::SeqCst);
                debug!(key = %key, "Variant cache miss, computing");
                let result = compute.compute(key).await;
                if let Ok(ref data) = result {
                    self.put(key.clone(), data.clone()).await;
                }
                result
            })
            .await
            .clone();

        result.map(|data| Lookup {
            data,
            cache_hit: !computed.load(Ordering::SeqCst),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
