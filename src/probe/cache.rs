// Single-slot TTL cache owned by one probe.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::models::ProbeResult;

/// A cached outcome and the instant its source read started.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: ProbeResult<T>,
    pub captured_at: Instant,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.captured_at) < ttl
    }
}

/// Holds at most one entry. Failures are cached like successes.
///
/// Writes are ordered by `captured_at`: an entry older than the one already
/// stored is dropped, so a slow read that started first can never replace
/// the result of a read that started after it.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: Duration,
    slot: Mutex<Option<CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The cached value if it is still within the TTL at `now`.
    pub fn get(&self, now: Instant) -> Option<ProbeResult<T>> {
        self.lock()
            .as_ref()
            .filter(|e| e.is_fresh(now, self.ttl))
            .map(|e| e.value.clone())
    }

    /// Stores `entry` unless a newer one is already cached, and returns whichever
    /// value the cache holds afterwards.
    pub fn store(&self, entry: CacheEntry<T>) -> ProbeResult<T> {
        let mut slot = self.lock();
        if let Some(existing) = slot.as_ref()
            && existing.captured_at > entry.captured_at
        {
            tracing::debug!("discarding stale read; cache already holds a newer one");
            return existing.value.clone();
        }
        let value = entry.value.clone();
        *slot = Some(entry);
        value
    }

    fn lock(&self) -> MutexGuard<'_, Option<CacheEntry<T>>> {
        // entries are replaced wholesale, so a poisoned slot is still consistent
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
