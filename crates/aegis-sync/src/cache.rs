//! Single-flight remote cache.
//!
//! [`RemoteCache`] wraps one backend GET. Concurrent callers share one
//! in-flight request; a fresh value is served without a request; a failed
//! load leaves the previous value in place and returns it.
//!
//! Invalidating while a load is in flight does not start a second request.
//! The in-flight result is still stored when it lands, but it is marked
//! stale, so the next [`ensure_loaded`](RemoteCache::ensure_loaded) waits
//! for it and then fetches again. At most one request per cache is ever
//! outstanding.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::SyncError;

/// How long a loaded value stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Fresh until explicitly invalidated.
    OneShot,
    /// Fresh for the given duration after a successful load.
    Ttl(Duration),
}

impl CachePolicy {
    fn is_fresh(self, age: Duration) -> bool {
        match self {
            Self::OneShot => true,
            Self::Ttl(ttl) => age < ttl,
        }
    }
}

type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, SyncError>> + Send + Sync>;
type InFlight<T> = Shared<BoxFuture<'static, Option<T>>>;

struct Slot<T> {
    value: Option<T>,
    fetched_at: Option<Instant>,
    in_flight: Option<InFlight<T>>,
    /// Set by `invalidate` while a load is in flight.
    stale_in_flight: bool,
    requests: u64,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            value: None,
            fetched_at: None,
            in_flight: None,
            stale_in_flight: false,
            requests: 0,
        }
    }
}

struct Inner<T> {
    name: String,
    policy: CachePolicy,
    loader: Loader<T>,
    slot: Mutex<Slot<T>>,
}

/// Cached value of one remote resource. Clones share the same cache.
pub struct RemoteCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for RemoteCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

enum Pending<T> {
    Join(InFlight<T>),
    /// An invalidated load: wait for it, then go round again.
    Drain(InFlight<T>),
}

impl<T> RemoteCache<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cache named `name` (used in logs) around `loader`.
    pub fn new<F, Fut>(name: impl Into<String>, policy: CachePolicy, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, SyncError>> + Send + 'static,
    {
        let loader: Loader<T> = Arc::new(move || loader().boxed());
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                policy,
                loader,
                slot: Mutex::new(Slot::default()),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Return the cached value, loading it if missing, expired, or `force`d.
    ///
    /// Never fails: on a load error the previous value (possibly `None`)
    /// is returned and a warning is logged.
    pub async fn ensure_loaded(&self, force: bool) -> Option<T> {
        loop {
            let pending = {
                let mut slot = self.inner.slot.lock().await;
                if let Some(fut) = slot.in_flight.clone() {
                    if slot.stale_in_flight {
                        Pending::Drain(fut)
                    } else {
                        Pending::Join(fut)
                    }
                } else {
                    if !force && self.is_fresh(&slot) {
                        return slot.value.clone();
                    }
                    let fut = self.start_load();
                    slot.in_flight = Some(fut.clone());
                    slot.requests += 1;
                    debug!(cache = %self.inner.name, "load started");
                    Pending::Join(fut)
                }
            };
            match pending {
                Pending::Join(fut) => return fut.await,
                Pending::Drain(fut) => {
                    fut.await;
                }
            }
        }
    }

    /// Drop the cached value; the next `ensure_loaded` fetches again.
    pub async fn invalidate(&self) {
        let mut slot = self.inner.slot.lock().await;
        slot.value = None;
        slot.fetched_at = None;
        if slot.in_flight.is_some() {
            slot.stale_in_flight = true;
        }
        debug!(cache = %self.inner.name, "invalidated");
    }

    /// Cached value without loading, fresh or not.
    pub async fn peek(&self) -> Option<T> {
        self.inner.slot.lock().await.value.clone()
    }

    /// Overwrite the cached value as if it had just been loaded.
    pub async fn prime(&self, value: T) {
        let mut slot = self.inner.slot.lock().await;
        slot.value = Some(value);
        slot.fetched_at = Some(Instant::now());
    }

    /// Number of loads started over the cache's lifetime.
    pub async fn request_count(&self) -> u64 {
        self.inner.slot.lock().await.requests
    }

    /// Release the value and any in-flight handle.
    pub async fn dispose(&self) {
        let mut slot = self.inner.slot.lock().await;
        *slot = Slot {
            requests: slot.requests,
            ..Slot::default()
        };
    }

    fn is_fresh(&self, slot: &Slot<T>) -> bool {
        slot.value.is_some()
            && slot
                .fetched_at
                .is_some_and(|at| self.inner.policy.is_fresh(at.elapsed()))
    }

    fn start_load(&self) -> InFlight<T> {
        let inner = Arc::clone(&self.inner);
        let fetch = (self.inner.loader)();
        async move {
            let result = fetch.await;
            let mut slot = inner.slot.lock().await;
            let stale = std::mem::take(&mut slot.stale_in_flight);
            slot.in_flight = None;
            match result {
                Ok(value) => {
                    slot.value = Some(value.clone());
                    slot.fetched_at = if stale { None } else { Some(Instant::now()) };
                    debug!(cache = %inner.name, stale, "load complete");
                    Some(value)
                }
                Err(err) => {
                    warn!(cache = %inner.name, error = %err, "load failed, serving previous value");
                    slot.value.clone()
                }
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Loader that counts calls, sleeps, and returns the call number.
    fn counting_cache(
        policy: CachePolicy,
        delay: Duration,
    ) -> (RemoteCache<usize>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = RemoteCache::new("test", policy, move || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(delay).await;
                Ok(n)
            }
        });
        (cache, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_share_one_request() {
        let (cache, calls) = counting_cache(CachePolicy::OneShot, Duration::from_millis(100));
        let results =
            futures::future::join_all((0..10).map(|_| cache.ensure_loaded(false))).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| *r == Some(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_value_served_without_request() {
        let (cache, calls) = counting_cache(CachePolicy::OneShot, Duration::ZERO);
        assert_eq!(cache.ensure_loaded(false).await, Some(1));
        tokio::time::advance(Duration::from_secs(3600)).await;
        assert_eq!(cache.ensure_loaded(false).await, Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_forces_new_request() {
        let (cache, calls) = counting_cache(CachePolicy::Ttl(Duration::from_secs(15)), Duration::ZERO);
        cache.ensure_loaded(false).await;
        cache.invalidate().await;
        assert!(cache.peek().await.is_none());
        assert_eq!(cache.ensure_loaded(false).await, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expiry_refetches() {
        let (cache, calls) = counting_cache(CachePolicy::Ttl(Duration::from_secs(15)), Duration::ZERO);
        cache.ensure_loaded(false).await;
        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.ensure_loaded(false).await, Some(1));
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.ensure_loaded(false).await, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn force_refetches_fresh_value() {
        let (cache, calls) = counting_cache(CachePolicy::OneShot, Duration::ZERO);
        cache.ensure_loaded(false).await;
        assert_eq!(cache.ensure_loaded(true).await, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn force_joins_in_flight_load() {
        let (cache, calls) = counting_cache(CachePolicy::OneShot, Duration::from_millis(50));
        let (a, b) = tokio::join!(cache.ensure_loaded(false), cache.ensure_loaded(true));
        assert_eq!((a, b), (Some(1), Some(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_stale_value() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = RemoteCache::new("flaky", CachePolicy::OneShot, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok("first".to_string())
                } else {
                    Err(SyncError::Server {
                        status: 503,
                        body: "unavailable".into(),
                    })
                }
            }
        });
        assert_eq!(cache.ensure_loaded(false).await.as_deref(), Some("first"));
        assert_eq!(cache.ensure_loaded(true).await.as_deref(), Some("first"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_without_value_returns_none() {
        let cache: RemoteCache<u32> = RemoteCache::new("down", CachePolicy::OneShot, || async {
            Err(SyncError::Backend("nope".into()))
        });
        assert_eq!(cache.ensure_loaded(false).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_during_flight_refetches_after_it_lands() {
        let calls = Arc::new(AtomicUsize::new(0));
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (c, a, p) = (Arc::clone(&calls), Arc::clone(&active), Arc::clone(&peak));
        let cache = RemoteCache::new("racy", CachePolicy::OneShot, move || {
            let (c, a, p) = (Arc::clone(&c), Arc::clone(&a), Arc::clone(&p));
            async move {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                a.fetch_sub(1, Ordering::SeqCst);
                Ok(n)
            }
        });

        let first = tokio::spawn({
            let cache = cache.clone();
            async move { cache.ensure_loaded(false).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.invalidate().await;
        let second = cache.ensure_loaded(false).await;

        assert_eq!(first.await.unwrap(), Some(1));
        assert_eq!(second, Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(cache.request_count().await, 2);
    }

    #[tokio::test]
    async fn prime_and_dispose() {
        let (cache, calls) = counting_cache(CachePolicy::OneShot, Duration::ZERO);
        cache.prime(42).await;
        assert_eq!(cache.ensure_loaded(false).await, Some(42));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        cache.dispose().await;
        assert_eq!(cache.peek().await, None);
    }
}
