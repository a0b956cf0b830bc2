// ABOUTME: Lifecycle wiring of cache, counters, notification store and toasts for one client
// ABOUTME: Follows the authentication signal and bridges the unread count into the header badge
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Sync Session
//!
//! [`SyncSession`] is the explicitly constructed replacement for process-wide
//! singletons. It owns one instance of every component, all sharing one cache,
//! and a watcher task that follows the [`AuthSignal`]:
//!
//! - **login**: hydrate from cache, start the background refresh, fetch counters
//!   and the first notification page
//! - **logout**: abort any login still loading, then reset toasts, store and
//!   counters (which also clears the cache)
//!
//! Login work runs on its own task so a logout is handled immediately, even
//! while the login requests are still in flight. The store's unread count is
//! mirrored into the header notification counter by the same watcher, which
//! discards counts still queued when the user signs out.

use crate::api::MarketplaceApi;
use crate::auth::AuthSignal;
use crate::cache::memory::InMemoryCache;
use crate::cache::CacheProvider;
use crate::config::SyncConfig;
use crate::counters::CounterSynchronizer;
use crate::errors::AppResult;
use crate::events::Subscription;
use crate::notifications::{NotificationEvent, NotificationStore};
use crate::toasts::ToastOrchestrator;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

#[derive(Default)]
struct Background {
    watcher: Option<JoinHandle<()>>,
    bridge: Option<Subscription>,
}

/// Every synchronization component for one client, wired to the auth signal
pub struct SyncSession<C: CacheProvider = InMemoryCache> {
    cache: C,
    counters: CounterSynchronizer<C>,
    store: NotificationStore<C>,
    toasts: ToastOrchestrator<C>,
    auth: AuthSignal,
    background: Mutex<Background>,
}

impl SyncSession<InMemoryCache> {
    /// Create a session backed by an in-memory TTL cache
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be created
    pub async fn create(
        api: Arc<dyn MarketplaceApi>,
        config: SyncConfig,
        auth: AuthSignal,
    ) -> AppResult<Self> {
        let cache = InMemoryCache::new(config.cache.clone()).await?;
        Ok(Self::with_cache(api, cache, config, auth))
    }
}

impl<C: CacheProvider> SyncSession<C> {
    /// Create a session over an existing cache and start following `auth`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn with_cache(
        api: Arc<dyn MarketplaceApi>,
        cache: C,
        config: SyncConfig,
        auth: AuthSignal,
    ) -> Self {
        let counters = CounterSynchronizer::new(Arc::clone(&api), cache.clone(), config.counters);
        let store = NotificationStore::new(api, cache.clone(), config.notifications);
        let toasts = ToastOrchestrator::new(store.clone(), config.toasts);

        let (tx, rx) = mpsc::unbounded_channel::<u64>();
        let bridge = store.subscribe(move |event| {
            if let NotificationEvent::UnreadCountChanged(count) = event {
                if tx.send(*count).is_err() {
                    debug!("Unread count bridge closed");
                }
            }
        });

        let watcher = tokio::spawn(Self::watch_auth(
            auth.subscribe(),
            rx,
            counters.clone(),
            store.clone(),
            toasts.clone(),
        ));

        Self {
            cache,
            counters,
            store,
            toasts,
            auth,
            background: Mutex::new(Background {
                watcher: Some(watcher),
                bridge: Some(bridge),
            }),
        }
    }

    /// Header counters
    #[must_use]
    pub const fn counters(&self) -> &CounterSynchronizer<C> {
        &self.counters
    }

    /// Notification store
    #[must_use]
    pub const fn store(&self) -> &NotificationStore<C> {
        &self.store
    }

    /// Toast orchestrator
    #[must_use]
    pub const fn toasts(&self) -> &ToastOrchestrator<C> {
        &self.toasts
    }

    /// Shared TTL cache
    #[must_use]
    pub const fn cache(&self) -> &C {
        &self.cache
    }

    /// Whether the followed signal currently reports a signed-in user
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Forward client navigation; entering the inbox clears toasts
    pub fn on_route_change(&self, path: &str) {
        self.toasts.on_route_change(path);
    }

    /// Stop following the auth signal and tear every component down
    pub fn dispose(&self) {
        self.stop_background();
        self.toasts.dispose();
        self.store.dispose();
        self.counters.dispose();
        info!("Sync session disposed");
    }

    fn lock_background(&self) -> MutexGuard<'_, Background> {
        self.background.lock().unwrap_or_else(|poisoned| {
            warn!("Sync session task lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn stop_background(&self) {
        let background = std::mem::take(&mut *self.lock_background());
        if let Some(watcher) = background.watcher {
            watcher.abort();
        }
        drop(background.bridge);
    }

    async fn watch_auth(
        mut auth: watch::Receiver<bool>,
        mut unread: mpsc::UnboundedReceiver<u64>,
        counters: CounterSynchronizer<C>,
        store: NotificationStore<C>,
        toasts: ToastOrchestrator<C>,
    ) {
        // Dropped with the watcher, which aborts whatever login is still running
        let mut logins = JoinSet::new();
        let mut authenticated = *auth.borrow_and_update();
        if authenticated {
            Self::start_login(&mut logins, &counters, &store, &toasts);
        }

        loop {
            tokio::select! {
                changed = auth.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let now = *auth.borrow_and_update();
                    if now == authenticated {
                        continue;
                    }
                    authenticated = now;
                    if now {
                        Self::start_login(&mut logins, &counters, &store, &toasts);
                    } else {
                        Self::cancel_logins(&mut logins).await;
                        Self::on_logout(&counters, &store, &toasts).await;
                        let mut stale = 0_usize;
                        while unread.try_recv().is_ok() {
                            stale += 1;
                        }
                        if stale > 0 {
                            debug!(stale, "Dropped unread counts queued before logout");
                        }
                    }
                }
                Some(count) = unread.recv() => {
                    // Detached write; the synchronizer serializes its cache writes
                    drop(counters.set_notification_count(count));
                }
                Some(finished) = logins.join_next(), if !logins.is_empty() => {
                    if let Err(e) = finished {
                        if e.is_panic() {
                            warn!(error = %e, "Login sync task panicked");
                        }
                    }
                }
            }
        }
        debug!("Auth signal dropped, session watcher exiting");
    }

    fn start_login(
        logins: &mut JoinSet<()>,
        counters: &CounterSynchronizer<C>,
        store: &NotificationStore<C>,
        toasts: &ToastOrchestrator<C>,
    ) {
        let (counters, store, toasts) = (counters.clone(), store.clone(), toasts.clone());
        logins.spawn(async move { Self::on_login(&counters, &store, &toasts).await });
    }

    /// Abort running logins and wait until none of them can touch state again
    async fn cancel_logins(logins: &mut JoinSet<()>) {
        if logins.is_empty() {
            return;
        }
        logins.abort_all();
        while logins.join_next().await.is_some() {}
        debug!("Login sync aborted by logout");
    }

    async fn on_login(
        counters: &CounterSynchronizer<C>,
        store: &NotificationStore<C>,
        toasts: &ToastOrchestrator<C>,
    ) {
        info!("Authenticated, starting notification sync");
        store.hydrate_from_cache().await;
        counters.hydrate_from_cache().await;
        toasts.start_background_refresh();
        tokio::join!(
            counters.fetch_counters(false),
            store.fetch_notifications(1, false)
        );
    }

    async fn on_logout(
        counters: &CounterSynchronizer<C>,
        store: &NotificationStore<C>,
        toasts: &ToastOrchestrator<C>,
    ) {
        info!("Authentication lost, resetting notification sync");
        toasts.reset();
        store.reset().await;
        counters.reset().await;
    }
}

impl<C: CacheProvider> Drop for SyncSession<C> {
    fn drop(&mut self) {
        self.stop_background();
    }
}
