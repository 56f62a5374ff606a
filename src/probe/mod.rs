// Probes: one per metric domain, each with its own source strategy and TTL cache.

pub mod android;
pub mod cache;
pub mod cpu;
pub mod disk;
pub mod network;
pub mod system;

use futures_util::future::BoxFuture;
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

use crate::error::ProbeError;
use crate::models::{Domain, ProbeResult};

pub use cache::{CacheEntry, TtlCache};

/// Where a probe gets its raw data. Implementations parse into the domain type
/// and report every problem as a `ProbeError`.
pub trait Source<T>: Send + Sync {
    fn read(&self) -> BoxFuture<'_, Result<T, ProbeError>>;
}

/// Fetches one domain through its cache.
pub struct Probe<T> {
    domain: Domain,
    timeout: Duration,
    source: Box<dyn Source<T>>,
    cache: TtlCache<T>,
}

impl<T: Clone + Send + Sync + 'static> Probe<T> {
    pub fn new(
        domain: Domain,
        source: impl Source<T> + 'static,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self::boxed(domain, Box::new(source), ttl, timeout)
    }

    pub fn boxed(
        domain: Domain,
        source: Box<dyn Source<T>>,
        ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            domain,
            timeout,
            source,
            cache: TtlCache::new(ttl),
        }
    }

    /// Cached result while fresh, otherwise one bounded source read whose outcome
    /// (success or failure) is cached. Never panics or returns an error.
    #[instrument(skip(self), fields(probe = %self.domain))]
    pub async fn fetch(&self) -> ProbeResult<T> {
        let started = Instant::now();
        if let Some(hit) = self.cache.get(started) {
            tracing::trace!("cache hit");
            return hit;
        }

        let outcome = match tokio::time::timeout(self.timeout, self.source.read()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };
        match &outcome {
            Ok(_) => tracing::debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "source read"
            ),
            Err(e) => tracing::warn!(error = %e, kind = e.kind(), "source read failed"),
        }

        self.cache.store(CacheEntry {
            value: outcome.into(),
            captured_at: started,
        })
    }
}
