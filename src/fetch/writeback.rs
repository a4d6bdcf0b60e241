//! Background persistence of computed variants.
//!
//! Writing a variant back to the store is a side effect of serving it, never
//! part of the response. [`WriteBack::submit`] returns immediately; the write
//! runs as a detached task that may outlive the request, and its outcome only
//! reaches the log and the counters in [`WriteBackStats`].
//!
//! Concurrent writes are bounded by a semaphore. When every permit is taken
//! the write is skipped: a missing variant only costs a recompute on the next
//! cache miss, which is the same outcome as a failed write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Semaphore;
use tracing::{debug, warn, Instrument};

use crate::store::ImageStore;

use super::key::CacheKey;

/// Default number of concurrent background writes.
pub const DEFAULT_WRITE_BACK_CONCURRENCY: usize = 8;

/// Counters for background writes.
#[derive(Debug, Default)]
pub struct WriteBackStats {
    /// Writes accepted and started
    pub submitted: AtomicU64,
    /// Writes that reached the store
    pub completed: AtomicU64,
    /// Writes the store rejected
    pub failed: AtomicU64,
    /// Writes dropped because every permit was taken
    pub skipped: AtomicU64,
}

impl WriteBackStats {
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Writes submitted but not yet finished.
    pub fn pending(&self) -> u64 {
        self.submitted()
            .saturating_sub(self.completed() + self.failed())
    }
}

/// Fire-and-forget writer of variants to the store.
pub struct WriteBack<S: ImageStore> {
    store: Arc<S>,
    permits: Arc<Semaphore>,
    stats: Arc<WriteBackStats>,
}

impl<S: ImageStore + 'static> WriteBack<S> {
    /// Create a writer allowing at most `max_concurrent` writes at once.
    ///
    /// A zero limit is treated as one.
    pub fn new(store: Arc<S>, max_concurrent: usize) -> Self {
        Self {
            store,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            stats: Arc::new(WriteBackStats::default()),
        }
    }

    /// Persist `data` as the variant for `key` in the background.
    ///
    /// Must be called from within a tokio runtime. Never blocks and never
    /// fails; the outcome is logged.
    pub fn submit(&self, key: CacheKey, data: Bytes) {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                self.stats.skipped.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, "Write-back skipped: too many writes in progress");
                return;
            }
        };

        self.stats.submitted.fetch_add(1, Ordering::Relaxed);

        let store = Arc::clone(&self.store);
        let stats = Arc::clone(&self.stats);
        let span = tracing::debug_span!("write_back", key = %key);

        tokio::spawn(
            async move {
                let size = data.len();
                match store.write_modified(&key, data).await {
                    Ok(()) => {
                        stats.completed.fetch_add(1, Ordering::Relaxed);
                        debug!(size, "Stored modified image");
                    }
                    Err(e) => {
                        stats.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(error = %e, "Write-back failed");
                    }
                }
                drop(permit);
            }
            .instrument(span),
        );
    }

    pub fn stats(&self) -> &Arc<WriteBackStats> {
        &self.stats
    }

    /// Permits currently free.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}
