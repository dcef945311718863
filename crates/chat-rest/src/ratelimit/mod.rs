//! Rate-limit bookkeeping
//!
//! Tracks one lock per bucket, the server-learned mapping from default bucket
//! keys to bucket hashes, and the global throttle gate. Uses `DashMap` so any
//! number of concurrent requests can look up their bucket without a global lock.

mod gate;
pub mod headers;

pub use gate::GlobalGate;
pub use headers::RateLimitHeaders;

use crate::route::Route;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock serializing requests within one bucket
pub type BucketLock = Arc<Mutex<()>>;

/// Shared rate-limit state for every request issued by a client
#[derive(Debug, Default)]
pub struct RateLimiter {
    /// Bucket key (default key or server hash) to its lock; entries are never removed
    locks: DashMap<String, BucketLock>,

    /// Default bucket key to the server-assigned bucket hash
    buckets: DashMap<String, String>,

    global: GlobalGate,
}

impl RateLimiter {
    /// Create an empty rate limiter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new rate limiter wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The process-wide throttle gate
    pub fn global(&self) -> &GlobalGate {
        &self.global
    }

    /// The bucket a route currently maps to
    ///
    /// A learned server hash wins over the route's default key.
    pub fn resolve_bucket(&self, route: &Route) -> String {
        let key = route.bucket_key();
        self.learned_bucket(&key).unwrap_or(key)
    }

    /// The server hash learned for a default bucket key, if any
    pub fn learned_bucket(&self, default_key: &str) -> Option<String> {
        self.buckets.get(default_key).map(|hash| hash.value().clone())
    }

    /// Get the lock for a bucket, creating it on first use
    pub fn lock_for(&self, bucket: &str) -> BucketLock {
        self.locks
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Check whether a lock exists under the given key
    pub fn has_lock(&self, bucket: &str) -> bool {
        self.locks.contains_key(bucket)
    }

    /// Number of bucket locks created so far
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    /// Wait for the bucket lock, holding it until the returned guard is released
    pub async fn acquire(&self, bucket: &str) -> BucketGuard {
        BucketGuard::acquire(bucket, self.lock_for(bucket)).await
    }

    /// Record a server-assigned bucket hash and register the held lock under it
    ///
    /// The default key keeps pointing at the same lock, so requests that
    /// captured it earlier still queue behind this one. The held lock replaces
    /// whatever was registered under `hash` before: a deferred release on this
    /// guard has to block the next caller resolving to `hash`.
    pub fn learn_bucket(&self, default_key: &str, guard: &mut BucketGuard, hash: &str) {
        if guard.bucket == hash {
            return;
        }

        self.buckets.insert(default_key.to_string(), hash.to_string());
        let replaced = self
            .locks
            .insert(hash.to_string(), guard.lock.clone())
            .is_some_and(|previous| !Arc::ptr_eq(&previous, &guard.lock));

        tracing::debug!(
            default_key = %default_key,
            previous = %guard.bucket,
            bucket = %hash,
            replaced,
            "Learned bucket hash"
        );

        guard.bucket = hash.to_string();
    }
}

/// Exclusive hold on one bucket
///
/// Dropping the guard releases the bucket immediately; [`BucketGuard::release_after`]
/// keeps it held until the server's reset window has passed.
#[derive(Debug)]
pub struct BucketGuard {
    lock: BucketLock,
    guard: OwnedMutexGuard<()>,
    bucket: String,
}

impl BucketGuard {
    /// Wait on a lock obtained earlier from [`RateLimiter::lock_for`]
    pub async fn acquire(bucket: &str, lock: BucketLock) -> Self {
        let guard = lock.clone().lock_owned().await;

        tracing::trace!(bucket = %bucket, "Bucket lock acquired");

        Self {
            lock,
            guard,
            bucket: bucket.to_string(),
        }
    }

    /// The bucket key this guard is registered under
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Keep the bucket locked for `delay`, then release it in the background
    pub fn release_after(self, delay: Duration) {
        let Self { guard, bucket, .. } = self;

        tracing::debug!(
            bucket = %bucket,
            delay_ms = delay.as_millis() as u64,
            "Bucket exhausted, deferring release"
        );

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            drop(guard);
            tracing::trace!(bucket = %bucket, "Deferred bucket release");
        });
    }
}
