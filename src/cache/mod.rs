//! Fetch memoization for resolution sessions.
//!
//! # Architecture Overview
//!
//! - [`MetadataCache`]: single-flight metadata memoization owned by one
//!   resolution session
//! - [`FileCache`]: artifact file lists, fetched at most once per coordinates
//!   for as long as the cache lives
//! - [`ArtifactLock`]: file-based lock serializing downloads of the same
//!   artifact across processes
//!
//! # Single-flight fetching
//!
//! Concurrent requests for the same coordinates coordinate through a
//! [`DashMap`] entry and a `tokio::sync::Notify`:
//!
//! 1. The first caller reserves the slot with `Pending(notify)` and fetches
//! 2. Later callers register on the notifier and wait
//! 3. The fetching caller stores `Ready(result)` and wakes every waiter
//!
//! If the fetching caller is dropped midway (cancelled run, timeout), the
//! pending entry is removed and waiters retry from the top, so nothing from an
//! abandoned run stays visible to others.
//!
//! Transient failures are retried with exponential backoff. A transient
//! failure that survives every retry is returned but not memoized; every
//! other outcome, `NotFound` included, is memoized for the session.

pub mod files;
pub mod lock;

pub use files::FileCache;
pub use lock::ArtifactLock;

use crate::constants::{
    DEFAULT_FETCH_RETRIES, MAX_BACKOFF_DELAY_MS, PENDING_STATE_TIMEOUT, STARTING_BACKOFF_DELAY_MS,
};
use crate::metadata::{ArtifactMetadata, FetchError, MetadataFetcher};
use crate::models::Coordinates;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;
use tracing::{debug, warn};

/// Outcome of one metadata fetch, shared between every caller that asked.
pub type FetchResult = Arc<Result<ArtifactMetadata, FetchError>>;

/// Retry parameters for transient fetch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub retries: usize,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_FETCH_RETRIES,
            base_delay_ms: STARTING_BACKOFF_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    fn strategy(self) -> impl Iterator<Item = Duration> {
        ExponentialBackoff::from_millis(self.base_delay_ms.max(1))
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS))
            .take(self.retries)
    }
}

#[derive(Debug, Clone)]
enum FetchState {
    Pending(Arc<Notify>),
    Ready(FetchResult),
}

/// Single-flight metadata memoization over a [`MetadataFetcher`].
pub struct MetadataCache {
    fetcher: Arc<dyn MetadataFetcher>,
    entries: DashMap<Coordinates, FetchState>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("entries", &self.entries.len())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Removes a pending reservation and wakes its waiters unless disarmed.
struct PendingGuard<'a> {
    entries: &'a DashMap<Coordinates, FetchState>,
    coordinates: &'a Coordinates,
    notify: Arc<Notify>,
    armed: bool,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.entries.remove(self.coordinates);
            self.notify.notify_waiters();
        }
    }
}

impl MetadataCache {
    #[must_use]
    pub fn new(fetcher: Arc<dyn MetadataFetcher>, retry: RetryPolicy) -> Self {
        Self {
            fetcher,
            entries: DashMap::new(),
            retry,
        }
    }

    #[must_use]
    pub fn fetcher(&self) -> &Arc<dyn MetadataFetcher> {
        &self.fetcher
    }

    /// Memoized result for `coordinates`, if a fetch completed.
    #[must_use]
    pub fn cached(&self, coordinates: &Coordinates) -> Option<FetchResult> {
        match self.entries.get(coordinates)?.value() {
            FetchState::Ready(result) => Some(result.clone()),
            FetchState::Pending(_) => None,
        }
    }

    /// Number of memoized or in-flight coordinates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fetches metadata, joining an in-flight fetch of the same coordinates.
    pub async fn get(&self, coordinates: &Coordinates) -> FetchResult {
        let notify = Arc::new(Notify::new());

        loop {
            match self.entries.entry(coordinates.clone()) {
                Entry::Occupied(entry) => match entry.get() {
                    FetchState::Ready(result) => return result.clone(),
                    FetchState::Pending(existing) => {
                        let existing = existing.clone();
                        // Register before releasing the shard lock so a
                        // completion in between still wakes us.
                        let notified = existing.notified();
                        tokio::pin!(notified);
                        notified.as_mut().enable();
                        drop(entry);

                        debug!(target: "cache", %coordinates, "waiting for in-flight fetch");
                        tokio::select! {
                            () = &mut notified => continue,
                            () = tokio::time::sleep(PENDING_STATE_TIMEOUT) => {
                                warn!(
                                    target: "cache",
                                    %coordinates,
                                    "timed out waiting for in-flight fetch, fetching independently"
                                );
                                return Arc::new(self.fetch_with_retry(coordinates).await);
                            }
                        }
                    }
                },
                Entry::Vacant(entry) => {
                    entry.insert(FetchState::Pending(notify.clone()));
                    break;
                }
            }
        }

        let mut guard = PendingGuard {
            entries: &self.entries,
            coordinates,
            notify: notify.clone(),
            armed: true,
        };

        let result = Arc::new(self.fetch_with_retry(coordinates).await);
        if matches!(&*result, Err(e) if e.is_transient()) {
            // Guard drop clears the reservation so a later caller retries.
            return result;
        }

        self.entries
            .insert(coordinates.clone(), FetchState::Ready(result.clone()));
        guard.armed = false;
        notify.notify_waiters();
        result
    }

    async fn fetch_with_retry(&self, coordinates: &Coordinates) -> Result<ArtifactMetadata, FetchError> {
        debug!(target: "fetch", %coordinates, "fetching metadata");
        RetryIf::start(
            self.retry.strategy(),
            || self.fetcher.fetch_metadata(coordinates),
            |e: &FetchError| {
                let retry = e.is_transient();
                if retry {
                    debug!(target: "fetch", %coordinates, "transient failure, will retry: {e}");
                }
                retry
            },
        )
        .await
    }
}
