//! Content-addressed result cache with expiry and single-flight coalescing.
//!
//! Each fingerprint maps to one slot: either a completed entry or a
//! pending flight. The first caller that misses installs the pending slot and
//! spawns the computation on its own task; every later caller for the same
//! key subscribes to that flight's `watch` channel instead of computing again.
//! When the flight finishes, the slot is promoted to an entry (success) or
//! removed (failure) *before* waiters are woken, so the next miss after a
//! failure starts a fresh attempt.
//!
//! Slots live in a `DashMap`, so contention is per shard rather than global,
//! and no shard lock is ever held across an `.await`.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::assessment::SharedAssessment;
use crate::error::{Error, Result};
use crate::fingerprint::ImageFingerprint;

/// Default time-to-live for completed entries (1 hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Applied uniformly to every entry
    pub ttl: Duration,
    /// Bound on completed entries; least-recently-used entries are evicted past it
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: None,
        }
    }
}

/// A completed assessment and its freshness window.
#[derive(Debug, Clone)]
struct CacheEntry {
    assessment: SharedAssessment,
    created_at: Instant,
    expires_at: Instant,
    last_access: Instant,
}

/// How a [`ResultCache::resolve`] call was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheOutcome {
    /// A fresh entry was already present
    Hit,
    /// Attached to a flight another caller started
    Joined,
    /// This caller started the flight
    Computed,
}

impl CacheOutcome {
    /// True when this caller did not trigger a computation of its own.
    pub fn is_cached(self) -> bool {
        !matches!(self, Self::Computed)
    }
}

impl CacheEntry {
    fn new(assessment: SharedAssessment, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            assessment,
            created_at: now,
            expires_at: now + ttl,
            last_access: now,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

type FlightOutcome = Option<Result<SharedAssessment>>;

enum Slot {
    Ready(CacheEntry),
    Pending {
        flight: u64,
        rx: watch::Receiver<FlightOutcome>,
    },
}

impl Slot {
    fn is_pending_flight(&self, id: u64) -> bool {
        matches!(self, Slot::Pending { flight, .. } if *flight == id)
    }

    fn is_expired(&self, now: Instant) -> bool {
        matches!(self, Slot::Ready(entry) if !entry.is_fresh(now))
    }
}

/// Counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Callers that attached to a flight already in progress
    pub joins: u64,
    pub expirations: u64,
    pub evictions: u64,
    /// Flights that ended in an error
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    joins: AtomicU64,
    expirations: AtomicU64,
    evictions: AtomicU64,
    failures: AtomicU64,
}

fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

struct Inner {
    slots: DashMap<ImageFingerprint, Slot>,
    config: CacheConfig,
    next_flight: AtomicU64,
    counters: Counters,
}

enum Claim {
    Hit(SharedAssessment),
    Join(watch::Receiver<FlightOutcome>),
    Lead {
        flight: u64,
        tx: watch::Sender<FlightOutcome>,
        rx: watch::Receiver<FlightOutcome>,
    },
}

/// Cloneable handle to one cache instance.
#[derive(Clone)]
pub struct ResultCache {
    inner: Arc<Inner>,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: DashMap::new(),
                config,
                next_flight: AtomicU64::new(1),
                counters: Counters::default(),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Fresh entry for `key`, if any. A stale entry is evicted and reported as absent.
    pub fn get(&self, key: &ImageFingerprint) -> Option<SharedAssessment> {
        let now = Instant::now();
        let mut stale = false;

        if let Some(mut slot) = self.inner.slots.get_mut(key) {
            if let Slot::Ready(entry) = slot.value_mut() {
                if entry.is_fresh(now) {
                    entry.last_access = now;
                    bump(&self.inner.counters.hits);
                    debug!(fingerprint = %key.short(), "Cache hit");
                    return Some(Arc::clone(&entry.assessment));
                }
                stale = true;
            }
        }

        if stale && self.inner.slots.remove_if(key, |_, s| s.is_expired(now)).is_some() {
            bump(&self.inner.counters.expirations);
            debug!(fingerprint = %key.short(), "Cache entry expired");
        }

        bump(&self.inner.counters.misses);
        None
    }

    /// Single-flight lookup.
    ///
    /// Returns the fresh entry if there is one. Otherwise either joins the
    /// flight already running for `key` or starts one by calling `compute`
    /// exactly once. The flight runs on a spawned task: dropping the returned
    /// future stops this caller from waiting but does not cancel the work.
    /// A failed flight delivers the same error to every waiter and is not cached.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: ImageFingerprint,
        compute: F,
    ) -> Result<SharedAssessment>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SharedAssessment>> + Send + 'static,
    {
        self.resolve(key, compute).await.1
    }

    /// [`get_or_compute`](Self::get_or_compute), also reporting how the call
    /// was served. The outcome is known even when the flight fails.
    pub async fn resolve<F, Fut>(
        &self,
        key: ImageFingerprint,
        compute: F,
    ) -> (CacheOutcome, Result<SharedAssessment>)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SharedAssessment>> + Send + 'static,
    {
        let (outcome, rx) = match self.claim(key) {
            Claim::Hit(assessment) => return (CacheOutcome::Hit, Ok(assessment)),
            Claim::Join(rx) => {
                debug!(fingerprint = %key.short(), "Joined in-flight computation");
                (CacheOutcome::Joined, rx)
            }
            Claim::Lead { flight, tx, rx } => {
                debug!(fingerprint = %key.short(), flight, "Starting computation");
                self.spawn_flight(key, flight, tx, compute());
                (CacheOutcome::Computed, rx)
            }
        };

        (outcome, wait_for(rx).await)
    }

    /// Remove a completed entry regardless of its age. In-flight work is untouched.
    pub fn invalidate(&self, key: &ImageFingerprint) -> bool {
        let removed = self
            .inner
            .slots
            .remove_if(key, |_, s| matches!(s, Slot::Ready(_)))
            .is_some();
        if removed {
            debug!(fingerprint = %key.short(), "Cache entry invalidated");
        }
        removed
    }

    /// Drop every completed entry. In-flight work is untouched.
    pub fn clear(&self) {
        self.inner
            .slots
            .retain(|_, slot| matches!(slot, Slot::Pending { .. }));
    }

    /// Explicit sweep of stale entries. Lookups never depend on it.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut removed = 0;
        self.inner.slots.retain(|_, slot| {
            let expired = slot.is_expired(now);
            if expired {
                removed += 1;
            }
            !expired
        });
        if removed > 0 {
            self.inner
                .counters
                .expirations
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "Purged expired cache entries");
        }
        removed
    }

    /// Number of completed entries, fresh or not yet swept.
    pub fn len(&self) -> usize {
        self.inner
            .slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn in_flight(&self) -> usize {
        self.inner
            .slots
            .iter()
            .filter(|slot| matches!(slot.value(), Slot::Pending { .. }))
            .count()
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.inner.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            misses: c.misses.load(Ordering::Relaxed),
            joins: c.joins.load(Ordering::Relaxed),
            expirations: c.expirations.load(Ordering::Relaxed),
            evictions: c.evictions.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
        }
    }

    /// Decide hit/join/lead under the key's shard lock. Synchronous so the
    /// guard can never live across an await point.
    fn claim(&self, key: ImageFingerprint) -> Claim {
        let now = Instant::now();
        let counters = &self.inner.counters;

        match self.inner.slots.entry(key) {
            Entry::Occupied(mut occupied) => {
                match occupied.get_mut() {
                    Slot::Ready(entry) if entry.is_fresh(now) => {
                        entry.last_access = now;
                        bump(&counters.hits);
                        return Claim::Hit(Arc::clone(&entry.assessment));
                    }
                    Slot::Pending { rx, .. } => {
                        bump(&counters.joins);
                        return Claim::Join(rx.clone());
                    }
                    Slot::Ready(_) => bump(&counters.expirations),
                }
                let (flight, tx, rx) = self.new_flight();
                occupied.insert(Slot::Pending {
                    flight,
                    rx: rx.clone(),
                });
                bump(&counters.misses);
                Claim::Lead { flight, tx, rx }
            }
            Entry::Vacant(vacant) => {
                let (flight, tx, rx) = self.new_flight();
                vacant.insert(Slot::Pending {
                    flight,
                    rx: rx.clone(),
                });
                bump(&counters.misses);
                Claim::Lead { flight, tx, rx }
            }
        }
    }

    fn new_flight(
        &self,
    ) -> (
        u64,
        watch::Sender<FlightOutcome>,
        watch::Receiver<FlightOutcome>,
    ) {
        let flight = self.inner.next_flight.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = watch::channel(None);
        (flight, tx, rx)
    }

    fn spawn_flight<Fut>(
        &self,
        key: ImageFingerprint,
        flight: u64,
        tx: watch::Sender<FlightOutcome>,
        work: Fut,
    ) where
        Fut: Future<Output = Result<SharedAssessment>> + Send + 'static,
    {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut guard = FlightGuard {
                cache: cache.clone(),
                key,
                flight,
                armed: true,
            };

            let outcome = work.await;
            guard.armed = false;

            cache.settle(key, flight, &outcome);
            // Waiters may all have gone away; the slot is already settled.
            let _ = tx.send(Some(outcome));
        });
    }

    /// Promote or remove the flight's slot. Runs before waiters are woken.
    fn settle(&self, key: ImageFingerprint, flight: u64, outcome: &Result<SharedAssessment>) {
        match outcome {
            Ok(assessment) => {
                let entry = CacheEntry::new(Arc::clone(assessment), self.inner.config.ttl);
                if let Entry::Occupied(mut occupied) = self.inner.slots.entry(key) {
                    if occupied.get().is_pending_flight(flight) {
                        occupied.insert(Slot::Ready(entry));
                    }
                }
                self.evict_over_capacity();
            }
            Err(e) => {
                bump(&self.inner.counters.failures);
                self.inner
                    .slots
                    .remove_if(&key, |_, slot| slot.is_pending_flight(flight));
                warn!(fingerprint = %key.short(), error = %e, "Computation failed, not cached");
            }
        }
    }

    fn evict_over_capacity(&self) {
        let Some(max) = self.inner.config.max_entries else {
            return;
        };

        let now = Instant::now();
        while self.len() > max {
            if self.purge_expired() > 0 {
                continue;
            }

            let oldest = self
                .inner
                .slots
                .iter()
                .filter_map(|slot| match slot.value() {
                    Slot::Ready(entry) => Some((*slot.key(), entry.last_access)),
                    Slot::Pending { .. } => None,
                })
                .min_by_key(|(_, last_access)| *last_access);

            let Some((key, last_access)) = oldest else {
                return;
            };

            let removed = self.inner.slots.remove_if(&key, |_, slot| {
                matches!(slot, Slot::Ready(entry) if entry.last_access == last_access)
            });
            if let Some((_, Slot::Ready(entry))) = removed {
                bump(&self.inner.counters.evictions);
                debug!(
                    fingerprint = %key.short(),
                    idle_ms = now.saturating_duration_since(last_access).as_millis() as u64,
                    age_ms = now.saturating_duration_since(entry.created_at).as_millis() as u64,
                    "Evicted least recently used entry"
                );
            }
        }
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.len())
            .field("in_flight", &self.in_flight())
            .field("ttl", &self.inner.config.ttl)
            .finish()
    }
}

/// Removes the pending slot if the flight task unwinds before settling.
struct FlightGuard {
    cache: ResultCache,
    key: ImageFingerprint,
    flight: u64,
    armed: bool,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if self.armed {
            error!(fingerprint = %self.key.short(), flight = self.flight, "Computation task ended without a result");
            bump(&self.cache.inner.counters.failures);
            self.cache
                .inner
                .slots
                .remove_if(&self.key, |_, slot| slot.is_pending_flight(self.flight));
        }
    }
}

async fn wait_for(mut rx: watch::Receiver<FlightOutcome>) -> Result<SharedAssessment> {
    loop {
        if let Some(outcome) = rx.borrow_and_update().clone() {
            return outcome;
        }
        if rx.changed().await.is_err() {
            let last = rx.borrow().clone();
            return last.unwrap_or_else(|| {
                Err(Error::CacheInternal(
                    "computation ended without publishing a result".into(),
                ))
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use chrono::Utc;

    use super::*;
    use crate::assessment::{
        AssessmentStatus, RiskAssessment, RiskLabel, SceneContext, SummarySource, AGENT_VERSION,
    };
    use crate::error::Stage;

    fn assessment(key: ImageFingerprint, score: u8) -> SharedAssessment {
        Arc::new(RiskAssessment {
            fingerprint: key,
            score,
            label: RiskLabel::Low,
            factors: Vec::new(),
            summary: "Risk level LOW".into(),
            summary_source: SummarySource::Generated,
            detections: Vec::new(),
            scene: SceneContext::default(),
            status: AssessmentStatus::Complete,
            assessed_at: Utc::now(),
            agent_version: AGENT_VERSION.to_string(),
        })
    }

    fn key(n: u8) -> ImageFingerprint {
        ImageFingerprint::of(&[n])
    }

    #[tokio::test]
    async fn test_get_on_empty_cache_misses() {
        let cache = ResultCache::new(CacheConfig::default());
        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_compute_then_get_hits() {
        let cache = ResultCache::new(CacheConfig::default());
        let k = key(1);
        let computed = cache
            .get_or_compute(k, move || async move { Ok(assessment(k, 12)) })
            .await
            .unwrap();

        let cached = cache.get(&k).unwrap();
        assert!(Arc::ptr_eq(&computed, &cached));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_resolve_reports_how_each_call_was_served() {
        let cache = ResultCache::new(CacheConfig::default());
        let k = key(2);

        let leader = {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache
                    .resolve(k, move || async move {
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        Ok(assessment(k, 20))
                    })
                    .await
            })
        };
        while cache.in_flight() == 0 {
            tokio::task::yield_now().await;
        }

        let (joined, result) = cache
            .resolve(k, move || async move { Ok(assessment(k, 0)) })
            .await;
        assert_eq!(joined, CacheOutcome::Joined);
        assert_eq!(result.unwrap().score, 20);

        let (led, result) = leader.await.unwrap();
        assert_eq!(led, CacheOutcome::Computed);
        assert!(!led.is_cached());
        assert_eq!(result.unwrap().score, 20);

        let (hit, result) = cache
            .resolve(k, move || async move { Ok(assessment(k, 0)) })
            .await;
        assert_eq!(hit, CacheOutcome::Hit);
        assert!(hit.is_cached());
        assert_eq!(result.unwrap().score, 20);
    }

    #[tokio::test]
    async fn test_failed_flight_still_reports_outcome() {
        let cache = ResultCache::new(CacheConfig::default());
        let k = key(6);
        let (outcome, result) = cache
            .resolve(k, || async {
                Err(Error::adapter(Stage::Perception, "upstream 500"))
            })
            .await;
        assert_eq!(outcome, CacheOutcome::Computed);
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_not_returned_after_ttl() {
        let cache = ResultCache::new(CacheConfig {
            ttl: Duration::from_secs(60),
            max_entries: None,
        });
        let k = key(1);
        cache
            .get_or_compute(k, move || async move { Ok(assessment(k, 1)) })
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get(&k).is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&k).is_none());
        // Stale entry was evicted by the lookup
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_is_recomputed() {
        let cache = ResultCache::new(CacheConfig {
            ttl: Duration::from_secs(10),
            max_entries: None,
        });
        let k = key(1);
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let calls = Arc::clone(&calls);
            cache
                .get_or_compute(k, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(assessment(k, 1))
                })
                .await
                .unwrap();
            tokio::time::advance(Duration::from_secs(11)).await;
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_computation() {
        let cache = ResultCache::new(CacheConfig::default());
        let k = key(7);
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(k, move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok(assessment(k, 33))
                    })
                    .await
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
        assert_eq!(cache.stats().misses, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failure_reaches_every_waiter_and_is_not_cached() {
        let cache = ResultCache::new(CacheConfig::default());
        let k = key(3);

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute(k, || async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Err(Error::adapter(Stage::Perception, "upstream 500"))
                    })
                    .await
            }));
        }

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert_eq!(err, Error::adapter(Stage::Perception, "upstream 500"));
        }

        assert!(cache.get(&k).is_none());
        assert_eq!(cache.in_flight(), 0);
        assert_eq!(cache.stats().failures, 1);

        // Next call retries instead of replaying the failure
        let retried = cache
            .get_or_compute(k, move || async move { Ok(assessment(k, 5)) })
            .await
            .unwrap();
        assert_eq!(retried.score, 5);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry_immediately() {
        let cache = ResultCache::new(CacheConfig::default());
        let k = key(1);
        cache
            .get_or_compute(k, move || async move { Ok(assessment(k, 1)) })
            .await
            .unwrap();

        assert!(cache.invalidate(&k));
        assert!(cache.get(&k).is_none());
        assert!(!cache.invalidate(&k));
    }

    #[tokio::test]
    async fn test_dropped_leader_does_not_cancel_flight() {
        let cache = ResultCache::new(CacheConfig::default());
        let k = key(9);
        let calls = Arc::new(AtomicUsize::new(0));

        let leader_calls = Arc::clone(&calls);
        let leader = cache.get_or_compute(k, move || async move {
            leader_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(assessment(k, 77))
        });
        // Leader gives up almost immediately
        let timed_out = tokio::time::timeout(Duration::from_millis(10), leader).await;
        assert!(timed_out.is_err());

        let follower_calls = Arc::clone(&calls);
        let joined = cache
            .get_or_compute(k, move || async move {
                follower_calls.fetch_add(1, Ordering::SeqCst);
                Ok(assessment(k, 0))
            })
            .await
            .unwrap();

        assert_eq!(joined.score, 77);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_panicking_flight_surfaces_internal_error_and_frees_slot() {
        let cache = ResultCache::new(CacheConfig::default());
        let k = key(4);

        let err = cache
            .get_or_compute(k, move || async move {
                let explode = true;
                if explode {
                    panic!("scorer exploded");
                }
                Ok(assessment(k, 0))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CacheInternal(_)));
        assert_eq!(cache.in_flight(), 0);

        let ok = cache
            .get_or_compute(k, move || async move { Ok(assessment(k, 2)) })
            .await
            .unwrap();
        assert_eq!(ok.score, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lru_eviction_when_bounded() {
        let cache = ResultCache::new(CacheConfig {
            ttl: DEFAULT_TTL,
            max_entries: Some(2),
        });

        for n in 1..=2 {
            let k = key(n);
            cache
                .get_or_compute(k, move || async move { Ok(assessment(k, n)) })
                .await
                .unwrap();
            tokio::time::advance(Duration::from_secs(1)).await;
        }

        // Touch key 1 so key 2 becomes least recently used
        assert!(cache.get(&key(1)).is_some());
        tokio::time::advance(Duration::from_secs(1)).await;

        let k3 = key(3);
        cache
            .get_or_compute(k3, move || async move { Ok(assessment(k3, 3)) })
            .await
            .unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(1)).is_some());
        assert!(cache.get(&key(2)).is_none());
        assert!(cache.get(&k3).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired_and_clear() {
        let cache = ResultCache::new(CacheConfig {
            ttl: Duration::from_secs(5),
            max_entries: None,
        });
        for n in 1..=3 {
            let k = key(n);
            cache
                .get_or_compute(k, move || async move { Ok(assessment(k, n)) })
                .await
                .unwrap();
        }
        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(cache.purge_expired(), 3);
        assert!(cache.is_empty());

        let k = key(10);
        cache
            .get_or_compute(k, move || async move { Ok(assessment(k, 10)) })
            .await
            .unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
