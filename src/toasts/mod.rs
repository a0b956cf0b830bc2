// ABOUTME: Toast orchestration driven by deltas in the unread notification count
// ABOUTME: Baseline suppression, single visible toast, self-expiry and background count refresh
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Toast Orchestrator
//!
//! Toasts are derived purely from the unread count published by the
//! [`NotificationStore`]. The first count known after start or reset is only a
//! baseline. Every later increase shows one summary toast, unless a toast is
//! already visible. Toasts expire on their own, and entering the inbox route
//! clears them.
//!
//! The only network activity of its own is a low-frequency background refresh of
//! the count, which skips a tick while the previous refresh is still running.

use crate::cache::memory::InMemoryCache;
use crate::cache::CacheProvider;
use crate::config::ToastConfig;
use crate::events::{Broadcaster, Subscription};
use crate::notifications::{NotificationEvent, NotificationStore};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Floor for the background refresh cadence
const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// One summary popup
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    /// Identifier, unique per orchestrator
    pub id: u64,
    /// Text shown to the user
    pub message: String,
    /// Unread total that triggered the toast
    pub unread_count: u64,
    /// When it became visible
    pub created_at: Instant,
    /// How long it stays visible
    pub duration: Duration,
}

impl Toast {
    /// Time left before it expires
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.created_at.elapsed())
    }

    /// Fraction of the visible time left, from 1.0 down to 0.0
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.remaining().as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }
}

/// Summary text for `count` unread notifications
#[must_use]
pub fn toast_message(count: u64) -> String {
    if count == 1 {
        "You have 1 unread notification".to_owned()
    } else {
        format!("You have {count} unread notifications")
    }
}

/// Toast lifecycle notifications for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum ToastEvent {
    /// A toast became visible
    Shown(Toast),
    /// The user closed a toast
    Dismissed(u64),
    /// A toast ran out of time
    Expired(u64),
    /// Every visible toast was removed at once
    Cleared,
}

#[derive(Default)]
struct ToastState {
    baseline: Option<u64>,
    visible: Vec<Toast>,
    timers: HashMap<u64, JoinHandle<()>>,
    refresh_task: Option<JoinHandle<()>>,
    next_id: u64,
}

impl ToastState {
    /// Remove every toast and abort its timer; returns whether anything was visible
    fn clear_toasts(&mut self) -> bool {
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }
        let had_toasts = !self.visible.is_empty();
        self.visible.clear();
        had_toasts
    }
}

struct Inner<C: CacheProvider> {
    store: NotificationStore<C>,
    config: ToastConfig,
    state: Mutex<ToastState>,
    events: Broadcaster<ToastEvent>,
    refreshing: Arc<AtomicBool>,
    store_subscription: Mutex<Option<Subscription>>,
}

/// Turns unread-count increases into toasts
pub struct ToastOrchestrator<C: CacheProvider = InMemoryCache> {
    inner: Arc<Inner<C>>,
}

impl<C: CacheProvider> Clone for ToastOrchestrator<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: CacheProvider> ToastOrchestrator<C> {
    /// Start following `store`; a count it already knows becomes the baseline
    #[must_use]
    pub fn new(store: NotificationStore<C>, config: ToastConfig) -> Self {
        let inner = Arc::new(Inner {
            store,
            config,
            state: Mutex::new(ToastState::default()),
            events: Broadcaster::new(),
            refreshing: Arc::new(AtomicBool::new(false)),
            store_subscription: Mutex::new(None),
        });

        let weak: Weak<Inner<C>> = Arc::downgrade(&inner);
        let subscription = inner.store.subscribe(move |event| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match event {
                NotificationEvent::UnreadCountChanged(count) => inner.on_unread_count(*count),
                NotificationEvent::Reset => inner.forget(),
                _ => {}
            }
        });
        *inner.lock_subscription() = Some(subscription);

        Self { inner }
    }

    /// Register a listener for toast lifecycle events
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ToastEvent) + Send + Sync + 'static,
    {
        self.inner.events.subscribe(callback)
    }

    /// Toasts currently on screen
    #[must_use]
    pub fn visible(&self) -> Vec<Toast> {
        self.inner.lock_state().visible.clone()
    }

    /// The count increases are measured against, `None` before the first known count
    #[must_use]
    pub fn baseline(&self) -> Option<u64> {
        self.inner.lock_state().baseline
    }

    /// Close a toast early; returns whether it was visible
    pub fn dismiss(&self, id: u64) -> bool {
        let removed = {
            let mut state = self.inner.lock_state();
            if let Some(timer) = state.timers.remove(&id) {
                timer.abort();
            }
            let before = state.visible.len();
            state.visible.retain(|toast| toast.id != id);
            state.visible.len() != before
        };
        if removed {
            self.inner.events.emit(&ToastEvent::Dismissed(id));
        }
        removed
    }

    /// Entering the inbox makes summaries redundant, so every toast is cleared
    pub fn on_route_change(&self, path: &str) {
        let inbox = self.inner.config.inbox_route.trim_end_matches('/');
        let entering_inbox = path
            .strip_prefix(inbox)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?', '#']));
        if !entering_inbox {
            return;
        }

        let cleared = self.inner.lock_state().clear_toasts();
        if cleared {
            debug!(path, "Inbox opened, clearing toasts");
            self.inner.events.emit(&ToastEvent::Cleared);
        }
    }

    /// Spawn the periodic unread-count refresh; a second call while running is a no-op
    pub fn start_background_refresh(&self) {
        let mut state = self.inner.lock_state();
        if state
            .refresh_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
        {
            return;
        }

        let period = self.inner.config.refresh_interval.max(MIN_REFRESH_INTERVAL);
        // No immediate tick; the session already fetched on login
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let weak = Arc::downgrade(&self.inner);
        state.refresh_task = Some(tokio::spawn(async move {
            loop {
                interval.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.spawn_refresh();
            }
        }));
        drop(state);
        info!(
            interval_secs = period.as_secs_f64(),
            "Background unread refresh started"
        );
    }

    /// Authentication lost: stop every timer and the refresh task, forget the baseline
    pub fn reset(&self) {
        let cleared = {
            let mut state = self.inner.lock_state();
            if let Some(task) = state.refresh_task.take() {
                task.abort();
            }
            state.baseline = None;
            state.clear_toasts()
        };
        self.inner.refreshing.store(false, Ordering::SeqCst);
        info!("Toast orchestrator reset");
        if cleared {
            self.inner.events.emit(&ToastEvent::Cleared);
        }
    }

    /// Reset, stop following the store and drop every listener
    pub fn dispose(&self) {
        self.reset();
        self.inner.lock_subscription().take();
        self.inner.events.clear();
    }
}

impl<C: CacheProvider> Inner<C> {
    fn lock_state(&self) -> MutexGuard<'_, ToastState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Toast state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_subscription(&self) -> MutexGuard<'_, Option<Subscription>> {
        self.store_subscription.lock().unwrap_or_else(|poisoned| {
            warn!("Toast store subscription lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn on_unread_count(self: &Arc<Self>, count: u64) {
        let shown = {
            let mut state = self.lock_state();
            let previous = state.baseline.replace(count);
            match previous {
                None => {
                    debug!(count, "Unread baseline established");
                    None
                }
                Some(previous) if count > previous && !state.visible.is_empty() => {
                    debug!(count, previous, "Toast already visible, suppressing");
                    None
                }
                Some(previous) if count > previous => Some(self.show(&mut state, count)),
                Some(_) => None,
            }
        };

        if let Some(toast) = shown {
            self.events.emit(&ToastEvent::Shown(toast));
        }
    }

    fn show(self: &Arc<Self>, state: &mut ToastState, count: u64) -> Toast {
        state.next_id += 1;
        let toast = Toast {
            id: state.next_id,
            message: toast_message(count),
            unread_count: count,
            created_at: Instant::now(),
            duration: self.config.visible_duration,
        };

        let weak = Arc::downgrade(self);
        let (id, deadline) = (toast.id, toast.created_at + toast.duration);
        let timer = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(inner) = weak.upgrade() {
                inner.expire(id);
            }
        });
        state.timers.insert(id, timer);
        state.visible.push(toast.clone());
        debug!(id, count, "Showing notification toast");
        toast
    }

    fn expire(&self, id: u64) {
        let expired = {
            let mut state = self.lock_state();
            state.timers.remove(&id);
            let before = state.visible.len();
            state.visible.retain(|toast| toast.id != id);
            state.visible.len() != before
        };
        if expired {
            self.events.emit(&ToastEvent::Expired(id));
        }
    }

    /// Store reset: the next known count is a fresh baseline
    fn forget(&self) {
        let cleared = {
            let mut state = self.lock_state();
            state.baseline = None;
            state.clear_toasts()
        };
        if cleared {
            self.events.emit(&ToastEvent::Cleared);
        }
    }

    fn spawn_refresh(&self) {
        if self.refreshing.swap(true, Ordering::SeqCst) {
            debug!("Previous unread refresh still running, skipping tick");
            return;
        }
        let store = self.store.clone();
        let refreshing = Arc::clone(&self.refreshing);
        tokio::spawn(async move {
            store.refresh_unread_count().await;
            refreshing.store(false, Ordering::SeqCst);
        });
    }
}
