// ABOUTME: Per-resource in-flight request registry for request coalescing
// ABOUTME: Concurrent callers for the same resource share one future and one network call
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Request Coalescing
//!
//! [`InflightRegistry`] maps a resource key to the shared future currently
//! fetching it. The first caller starts the fetch; every caller arriving while
//! it is pending receives a clone of the same [`Shared`] future and therefore the
//! same output.
//!
//! The shared future is also driven by a spawned task, so a fetch runs to
//! completion even when every waiter stops waiting.
//!
//! Each entry carries a ticket. A completing future removes its entry only if the
//! ticket still matches, so a fetch started after [`InflightRegistry::clear`]
//! (session reset) is never evicted by a stale one finishing late.
//!
//! Callers joining through [`InflightRegistry::join_tracked`] may later
//! [`Waiter::withdraw`]. Once every caller of a fetch has withdrawn, its
//! abandonment token fires, the entry is dropped so the next caller starts a
//! new request, and the fetch can skip applying its result.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Future handed to every caller interested in one resource
pub type SharedFetch<T> = Shared<BoxFuture<'static, T>>;

struct InflightEntry<T: Clone> {
    ticket: u64,
    future: SharedFetch<T>,
    interest: Arc<Interest>,
}

impl<T: Clone> InflightEntry<T> {
    fn clone_entry(&self) -> Self {
        Self {
            ticket: self.ticket,
            future: self.future.clone(),
            interest: Arc::clone(&self.interest),
        }
    }
}

/// Callers still waiting on one pending fetch
struct Interest {
    waiting: Mutex<usize>,
    abandoned: CancellationToken,
}

impl Interest {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            waiting: Mutex::new(1),
            abandoned: CancellationToken::new(),
        })
    }

    fn lock_waiting(&self) -> std::sync::MutexGuard<'_, usize> {
        self.waiting.lock().unwrap_or_else(|poisoned| {
            warn!("In-flight interest lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Count one more caller; `false` once the fetch was abandoned
    fn join(&self) -> bool {
        let mut waiting = self.lock_waiting();
        if self.abandoned.is_cancelled() {
            return false;
        }
        *waiting += 1;
        true
    }

    /// Drop one caller; returns whether it was the last
    fn withdraw(&self) -> bool {
        let mut waiting = self.lock_waiting();
        *waiting = waiting.saturating_sub(1);
        if *waiting == 0 && !self.abandoned.is_cancelled() {
            self.abandoned.cancel();
            return true;
        }
        false
    }
}

/// One caller's handle on a pending fetch
pub struct Waiter<K, T: Clone> {
    key: K,
    ticket: u64,
    future: SharedFetch<T>,
    interest: Arc<Interest>,
    registry: Weak<Pending<K, T>>,
}

impl<K, T> Waiter<K, T>
where
    K: Eq + Hash + Debug,
    T: Clone,
{
    /// The shared fetch this caller joined
    #[must_use]
    pub fn future(&self) -> SharedFetch<T> {
        self.future.clone()
    }

    /// Stop waiting. The last caller to withdraw abandons the fetch.
    pub fn withdraw(&self) {
        if !self.interest.withdraw() {
            return;
        }
        debug!(resource = ?self.key, "Every caller withdrew, abandoning request");
        if let Some(pending) = self.registry.upgrade() {
            pending.remove_if(&self.key, |_, entry| entry.ticket == self.ticket);
        }
    }
}

type Pending<K, T> = DashMap<K, InflightEntry<T>>;

/// Registry of in-flight fetches keyed by resource
pub struct InflightRegistry<K, T: Clone> {
    pending: Arc<Pending<K, T>>,
    next_ticket: Arc<AtomicU64>,
}

impl<K, T: Clone> Clone for InflightRegistry<K, T> {
    fn clone(&self) -> Self {
        Self {
            pending: Arc::clone(&self.pending),
            next_ticket: Arc::clone(&self.next_ticket),
        }
    }
}

impl<K, T> Default for InflightRegistry<K, T>
where
    K: Eq + Hash,
    T: Clone,
{
    fn default() -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            next_ticket: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl<K, T> InflightRegistry<K, T>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the pending fetch for `key`, or start one with `start`.
    ///
    /// `start` is only invoked when nothing is pending. Must be called from
    /// within a tokio runtime.
    pub fn join_or_start<F, Fut>(&self, key: K, start: F) -> SharedFetch<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.join_tracked(key, |_| start()).future
    }

    /// Like [`Self::join_or_start`], but the caller may withdraw.
    ///
    /// `start` receives the token that fires once every caller has withdrawn.
    /// An abandoned fetch is never joined; a new one is started instead.
    pub fn join_tracked<F, Fut>(&self, key: K, start: F) -> Waiter<K, T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let entry = match self.pending.entry(key.clone()) {
            Entry::Occupied(mut existing) => {
                if existing.get().interest.join() {
                    debug!(resource = ?key, "Joining in-flight request");
                    existing.get().clone_entry()
                } else {
                    let fresh = self.launch(&key, start);
                    existing.insert(fresh.clone_entry());
                    fresh
                }
            }
            Entry::Vacant(slot) => {
                let fresh = self.launch(&key, start);
                slot.insert(fresh.clone_entry());
                fresh
            }
        };

        Waiter {
            key,
            ticket: entry.ticket,
            future: entry.future,
            interest: entry.interest,
            registry: Arc::downgrade(&self.pending),
        }
    }

    fn launch<F, Fut>(&self, key: &K, start: F) -> InflightEntry<T>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let interest = Interest::new();
        let registry: Weak<Pending<K, T>> = Arc::downgrade(&self.pending);
        let fetch = start(interest.abandoned.clone());
        let key = key.clone();

        let future = async move {
            let output = fetch.await;
            if let Some(pending) = registry.upgrade() {
                pending.remove_if(&key, |_, entry| entry.ticket == ticket);
            }
            output
        }
        .boxed()
        .shared();

        tokio::spawn(future.clone());
        InflightEntry {
            ticket,
            future,
            interest,
        }
    }

    /// Whether a fetch for `key` is pending
    #[must_use]
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    /// Number of pending fetches
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Forget every pending fetch; callers already holding a handle keep it
    pub fn clear(&self) {
        self.pending.clear();
    }
}
