// ABOUTME: Header counter synchronizer for cart, favorites and unread notification badges
// ABOUTME: Throttled and cached network refresh plus optimistic local mutations with broadcast
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Counter Synchronizer
//!
//! [`CounterSynchronizer`] owns the authoritative in-memory copy of the three
//! header counters and fans every change out to its subscribers.
//!
//! A non-forced [`CounterSynchronizer::fetch_counters`] goes through three gates
//! in order: the throttle window since the last successful network fetch, the
//! TTL cache, and the in-flight registry. A forced refresh skips the first two.
//! Failures zero the counters and surface an error string; subscribers only
//! ever see well-formed snapshots.
//!
//! Optimistic mutations apply and broadcast before returning. The cache write
//! runs on a spawned task; writes are serialized and always persist the latest
//! state, and none lands once [`CounterSynchronizer::reset`] has run.

use crate::api::MarketplaceApi;
use crate::cache::memory::InMemoryCache;
use crate::cache::{CacheKey, CacheProvider};
use crate::config::CounterSyncConfig;
use crate::events::{Broadcaster, Subscription};
use crate::inflight::InflightRegistry;
use crate::models::{CounterKind, HeaderCounters};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What a counter subscriber receives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Current counters
    pub counters: HeaderCounters,
    /// A network fetch is running
    pub loading: bool,
    /// Last fetch failure, cleared by the next success
    pub error: Option<String>,
}

/// Typed change notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterEvent {
    /// Counters were replaced or mutated
    CountersChanged(HeaderCounters),
    /// A network fetch started or finished
    Loading(bool),
    /// A network fetch failed
    Error(String),
}

#[derive(Debug, Default)]
struct CounterState {
    counters: HeaderCounters,
    loading: bool,
    error: Option<String>,
    last_fetch: Option<Instant>,
}

struct Inner<C> {
    api: Arc<dyn MarketplaceApi>,
    cache: C,
    config: CounterSyncConfig,
    state: Mutex<CounterState>,
    snapshots: Broadcaster<CounterSnapshot>,
    events: Broadcaster<CounterEvent>,
    inflight: InflightRegistry<CacheKey, ()>,
    // Bumped on reset under the state lock; older fetches and writes are discarded
    generation: AtomicU64,
    // Serializes cache writes so the last one carries the latest counters
    write_lock: tokio::sync::Mutex<()>,
}

/// Owner of the header counters
pub struct CounterSynchronizer<C: CacheProvider = InMemoryCache> {
    inner: Arc<Inner<C>>,
}

impl<C: CacheProvider> Clone for CounterSynchronizer<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: CacheProvider> CounterSynchronizer<C> {
    /// Create a synchronizer with zeroed counters
    #[must_use]
    pub fn new(api: Arc<dyn MarketplaceApi>, cache: C, config: CounterSyncConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                cache,
                config,
                state: Mutex::new(CounterState::default()),
                snapshots: Broadcaster::new(),
                events: Broadcaster::new(),
                inflight: InflightRegistry::new(),
                generation: AtomicU64::new(0),
                write_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Register a snapshot listener; it is invoked once right away with the current state
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&CounterSnapshot) + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let listener = Arc::clone(&callback);
        let subscription = self.inner.snapshots.subscribe(move |s| listener(s));
        callback(&self.snapshot());
        subscription
    }

    /// Register a listener for typed events
    pub fn subscribe_events<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&CounterEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(callback)
    }

    /// Current state
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        self.inner.snapshot()
    }

    /// Current counters
    #[must_use]
    pub fn counters(&self) -> HeaderCounters {
        self.inner.lock_state().counters
    }

    /// Refresh the counters.
    ///
    /// Without `force_refresh` the call is a no-op inside the throttle window and
    /// adopts a fresh cache entry without I/O. Concurrent calls share one request.
    pub async fn fetch_counters(&self, force_refresh: bool) {
        if !force_refresh {
            if self.inner.within_throttle_window() {
                debug!("Header counters fetched recently, skipping refresh");
                return;
            }
            if self.inner.adopt_cached().await {
                return;
            }
        }

        let inner = Arc::clone(&self.inner);
        self.inner
            .inflight
            .join_or_start(CacheKey::HeaderCounters, move || async move {
                inner.load_from_network().await;
            })
            .await;
    }

    /// Adopt a fresh cached value without network I/O; returns whether one was found
    pub async fn hydrate_from_cache(&self) -> bool {
        self.inner.adopt_cached().await
    }

    /// Optimistically set one counter.
    ///
    /// Subscribers are notified before this returns. The returned handle
    /// resolves once the cache holds the new value; awaiting it is optional.
    /// Must be called from within a tokio runtime.
    pub fn update_counter(&self, kind: CounterKind, value: u32) -> JoinHandle<()> {
        self.inner.mutate(|c| c.set(kind, value))
    }

    /// Optimistically add one
    pub fn increment(&self, kind: CounterKind) -> JoinHandle<()> {
        self.inner.mutate(|c| c.adjust(kind, 1))
    }

    /// Optimistically subtract one, never below zero
    pub fn decrement(&self, kind: CounterKind) -> JoinHandle<()> {
        self.inner.mutate(|c| c.adjust(kind, -1))
    }

    /// Item added to the cart
    pub fn increment_cart(&self) -> JoinHandle<()> {
        self.increment(CounterKind::Cart)
    }

    /// Item removed from the cart
    pub fn decrement_cart(&self) -> JoinHandle<()> {
        self.decrement(CounterKind::Cart)
    }

    /// Product favorited
    pub fn increment_favorites(&self) -> JoinHandle<()> {
        self.increment(CounterKind::Favorites)
    }

    /// Product unfavorited
    pub fn decrement_favorites(&self) -> JoinHandle<()> {
        self.decrement(CounterKind::Favorites)
    }

    /// Mirror the notification store's unread count into the bell badge
    pub fn set_notification_count(&self, count: u64) -> JoinHandle<()> {
        let value = u32::try_from(count).unwrap_or(u32::MAX);
        self.update_counter(CounterKind::Notifications, value)
    }

    /// Drop the cached counters and the throttle so the next fetch hits the network
    pub async fn invalidate_cache(&self) {
        if let Err(e) = self.inner.cache.invalidate(&CacheKey::HeaderCounters).await {
            warn!(error = %e, "Failed to invalidate cached header counters");
        }
        self.inner.lock_state().last_fetch = None;
    }

    /// Return to the logged-out state: zero counters, no throttle, no error
    pub async fn reset(&self) {
        self.inner.inflight.clear();
        {
            let mut state = self.inner.lock_state();
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
            *state = CounterState::default();
        }
        if let Err(e) = self.inner.cache.invalidate(&CacheKey::HeaderCounters).await {
            warn!(error = %e, "Failed to drop cached header counters on reset");
        }
        info!("Header counters reset");
        self.inner.emit_counters(HeaderCounters::default());
    }

    /// Drop every subscriber
    pub fn dispose(&self) {
        self.inner.snapshots.clear();
        self.inner.events.clear();
        self.inner.inflight.clear();
    }
}

impl<C: CacheProvider> Inner<C> {
    fn lock_state(&self) -> MutexGuard<'_, CounterState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Header counter state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn snapshot(&self) -> CounterSnapshot {
        let state = self.lock_state();
        CounterSnapshot {
            counters: state.counters,
            loading: state.loading,
            error: state.error.clone(),
        }
    }

    fn publish(&self, event: &CounterEvent) {
        self.events.emit(event);
        self.snapshots.emit(&self.snapshot());
    }

    fn emit_counters(&self, counters: HeaderCounters) {
        self.publish(&CounterEvent::CountersChanged(counters));
    }

    fn within_throttle_window(&self) -> bool {
        self.lock_state()
            .last_fetch
            .is_some_and(|at| at.elapsed() < self.config.min_fetch_interval)
    }

    async fn adopt_cached(&self) -> bool {
        match self.cache.get::<HeaderCounters>(&CacheKey::HeaderCounters).await {
            Ok(Some(counters)) => {
                debug!(?counters, "Adopting cached header counters");
                self.lock_state().counters = counters;
                self.emit_counters(counters);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Cached header counters unreadable, ignoring");
                false
            }
        }
    }

    /// Cache `counters` unless a reset happened since `generation`; returns whether it stuck
    async fn write_through(&self, counters: &HeaderCounters, generation: u64) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }
        if let Err(e) = self
            .cache
            .set(&CacheKey::HeaderCounters, counters, self.config.cache_ttl)
            .await
        {
            warn!(error = %e, "Failed to cache header counters");
        }
        if self.generation.load(Ordering::SeqCst) == generation {
            return true;
        }
        debug!("Header counters reset during cache write, dropping the entry");
        if let Err(e) = self.cache.invalidate(&CacheKey::HeaderCounters).await {
            warn!(error = %e, "Failed to drop header counters written across a reset");
        }
        false
    }

    fn mutate(self: &Arc<Self>, apply: impl FnOnce(&mut HeaderCounters)) -> JoinHandle<()> {
        let (counters, generation) = {
            let mut state = self.lock_state();
            apply(&mut state.counters);
            (state.counters, self.generation.load(Ordering::SeqCst))
        };
        self.emit_counters(counters);

        let inner = Arc::clone(self);
        tokio::spawn(async move { inner.persist_latest(generation).await })
    }

    async fn persist_latest(&self, generation: u64) {
        let _write = self.write_lock.lock().await;
        let latest = self.lock_state().counters;
        self.write_through(&latest, generation).await;
    }

    fn set_loading(&self, loading: bool) {
        self.lock_state().loading = loading;
        self.publish(&CounterEvent::Loading(loading));
    }

    async fn load_from_network(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        self.set_loading(true);

        let result = self.api.fetch_counters().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding header counters fetched before reset");
            return;
        }

        match result {
            Ok(response) => {
                let counters = HeaderCounters::from(response);
                let write = self.write_lock.lock().await;
                if !self.write_through(&counters, generation).await {
                    debug!("Discarding header counters fetched before reset");
                    return;
                }
                {
                    let mut state = self.lock_state();
                    if self.generation.load(Ordering::SeqCst) != generation {
                        return;
                    }
                    state.counters = counters;
                    state.last_fetch = Some(Instant::now());
                    state.loading = false;
                    state.error = None;
                }
                drop(write);
                debug!(?counters, "Fetched header counters");
                self.events.emit(&CounterEvent::Loading(false));
                self.emit_counters(counters);
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch header counters");
                let message = e.to_string();
                {
                    let mut state = self.lock_state();
                    state.counters = HeaderCounters::default();
                    state.loading = false;
                    state.error = Some(message.clone());
                }
                self.events
                    .emit(&CounterEvent::CountersChanged(HeaderCounters::default()));
                self.events.emit(&CounterEvent::Loading(false));
                self.publish(&CounterEvent::Error(message));
            }
        }
    }
}
