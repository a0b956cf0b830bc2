// ABOUTME: Authoritative paginated notification list and unread count for the signed-in user
// ABOUTME: Cache-first, coalesced fetches plus read/delete mutations that reconcile the cache
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::routes;
use super::sections::{self, Section};
use crate::api::{
    ListQuery, MarketplaceApi, MutationResponse, NotificationListResponse, UnreadCountResponse,
};
use crate::cache::memory::InMemoryCache;
use crate::cache::{CacheKey, CacheProvider};
use crate::config::NotificationStoreConfig;
use crate::errors::{AppError, AppResult};
use crate::events::{Broadcaster, Subscription};
use crate::inflight::{InflightRegistry, Waiter};
use crate::models::Notification;
use chrono::Utc;
use serde::de::DeserializeOwned;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Where the store is in the authentication lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// Never hydrated; fetches are ignored
    #[default]
    Uninitialized,
    /// Authenticated, nothing loading
    Idle,
    /// Authenticated, a list fetch is running
    Fetching,
    /// Authentication was lost; requires re-hydration
    Reset,
}

impl SessionPhase {
    const fn is_active(self) -> bool {
        matches!(self, Self::Idle | Self::Fetching)
    }
}

/// Observable state of the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationState {
    /// Loaded notifications, newest first, across every fetched page
    pub items: Vec<Notification>,
    /// Highest page applied
    pub current_page: u32,
    /// More pages exist server-side
    pub has_more: bool,
    /// Server-side total for the current filter
    pub total_count: u64,
    /// Server-side unread total; independent of `items.len()`
    pub unread_count: u64,
    /// Whether `unread_count` came from the cache or the server yet
    pub unread_known: bool,
    /// A list fetch is running
    pub loading: bool,
    /// Last failure, cleared by the next successful load
    pub error: Option<String>,
    /// Lifecycle phase
    pub phase: SessionPhase,
}

/// Typed change notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// Items, paging or read flags changed
    ListChanged,
    /// The known unread total changed
    UnreadCountChanged(u64),
    /// A list fetch started or finished
    Loading(bool),
    /// A fetch or mutation failed
    Error(String),
    /// Authentication was lost and everything was cleared
    Reset,
}

#[derive(Default)]
struct StoreState {
    view: NotificationState,
    pending_loads: usize,
}

/// Session token cancelled on reset, and a child cancelled when a view navigates away
#[derive(Clone)]
struct FetchScope {
    session: CancellationToken,
    view: CancellationToken,
}

impl FetchScope {
    fn fresh() -> Self {
        let session = CancellationToken::new();
        let view = session.child_token();
        Self { session, view }
    }
}

struct Inner<C> {
    api: Arc<dyn MarketplaceApi>,
    cache: C,
    config: NotificationStoreConfig,
    state: Mutex<StoreState>,
    scope: Mutex<FetchScope>,
    events: Broadcaster<NotificationEvent>,
    list_fetches: InflightRegistry<CacheKey, ()>,
    count_fetches: InflightRegistry<CacheKey, ()>,
}

/// Paginated notification inbox shared by every consumer
pub struct NotificationStore<C: CacheProvider = InMemoryCache> {
    inner: Arc<Inner<C>>,
}

impl<C: CacheProvider> Clone for NotificationStore<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: CacheProvider> NotificationStore<C> {
    /// Create an uninitialized store; call [`Self::hydrate_from_cache`] once authenticated
    #[must_use]
    pub fn new(api: Arc<dyn MarketplaceApi>, cache: C, config: NotificationStoreConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                cache,
                config,
                state: Mutex::new(StoreState::default()),
                scope: Mutex::new(FetchScope::fresh()),
                events: Broadcaster::new(),
                list_fetches: InflightRegistry::new(),
                count_fetches: InflightRegistry::new(),
            }),
        }
    }

    /// Register an event listener; a known unread count is delivered right away
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&NotificationEvent) + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let listener = Arc::clone(&callback);
        let subscription = self.inner.events.subscribe(move |e| listener(e));
        if let Some(count) = self.unread_count() {
            callback(&NotificationEvent::UnreadCountChanged(count));
        }
        subscription
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> NotificationState {
        self.inner.lock_state().view.clone()
    }

    /// Unread total, `None` until known
    #[must_use]
    pub fn unread_count(&self) -> Option<u64> {
        let state = self.inner.lock_state();
        state.view.unread_known.then_some(state.view.unread_count)
    }

    /// Lifecycle phase
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.inner.lock_state().view.phase
    }

    /// Enter the authenticated phase and adopt whatever the cache still holds
    pub async fn hydrate_from_cache(&self) {
        {
            let mut state = self.inner.lock_state();
            if !state.view.phase.is_active() {
                state.view.phase = SessionPhase::Idle;
            }
        }
        info!("Notification store active");

        if let Some(page) = self
            .inner
            .cached::<NotificationListResponse>(&CacheKey::FIRST_NOTIFICATION_PAGE)
            .await
        {
            debug!(items = page.notifications.len(), "Hydrated first page from cache");
            self.inner.apply_page(1, page);
        }
        if let Some(count) = self
            .inner
            .cached::<UnreadCountResponse>(&CacheKey::UnreadCount)
            .await
        {
            self.inner.set_unread(count.unread_count);
        }
    }

    /// Load one page.
    ///
    /// The unfiltered first page is served from the cache when fresh. Concurrent
    /// calls for the same page and filter share one request. Page 1 replaces the
    /// list; later pages append, skipping ids already loaded.
    pub async fn fetch_notifications(&self, page: u32, unread_only: bool) {
        if let Some(waiter) = self.join_list_fetch(page, unread_only).await {
            waiter.future().await;
        }
    }

    /// Like [`Self::fetch_notifications`], but give up once `token` fires.
    ///
    /// Returns `false` when cancelled. A request every caller gave up on still
    /// refreshes the cache but is not applied to the list.
    pub async fn fetch_notifications_cancellable(
        &self,
        page: u32,
        unread_only: bool,
        token: &CancellationToken,
    ) -> bool {
        if token.is_cancelled() {
            return false;
        }
        let Some(waiter) = self.join_list_fetch(page, unread_only).await else {
            return true;
        };
        tokio::select! {
            () = token.cancelled() => {
                debug!(page, "Caller stopped waiting for notifications");
                waiter.withdraw();
                false
            }
            () = waiter.future() => true,
        }
    }

    /// Serve the page from the cache, or join the request loading it
    async fn join_list_fetch(
        &self,
        page: u32,
        unread_only: bool,
    ) -> Option<Waiter<CacheKey, ()>> {
        if !self.inner.is_active() {
            debug!(page, "Not authenticated, skipping notification fetch");
            return None;
        }

        let page = page.max(1);
        let key = CacheKey::NotificationPage { page, unread_only };
        if key == CacheKey::FIRST_NOTIFICATION_PAGE {
            if let Some(cached) = self.inner.cached::<NotificationListResponse>(&key).await {
                debug!("Serving first notification page from cache");
                self.inner.apply_page(page, cached);
                return None;
            }
        }

        let query = ListQuery {
            page,
            limit: self.inner.config.page_size,
            unread_only,
        };
        let scope = self.inner.current_scope();
        let inner = Arc::clone(&self.inner);
        Some(
            self.inner
                .list_fetches
                .join_tracked(key, move |abandoned| async move {
                    inner.load_page(query, scope, abandoned).await;
                }),
        )
    }

    /// Ignore every list response still in flight; they resolve but are not applied
    pub fn cancel_pending_fetches(&self) {
        {
            let mut scope = self.inner.lock_scope();
            scope.view.cancel();
            scope.view = scope.session.child_token();
        }
        self.inner.list_fetches.clear();
        debug!("Pending notification list fetches cancelled");
    }

    /// Mark one notification read.
    ///
    /// The server is asked first; on success the item is flagged read and the
    /// unread total follows the server's count, or drops by one if the item was unread.
    pub async fn mark_as_read(&self, id: u64) -> bool {
        let Some(response) = self.mutation("mark_as_read", self.inner.api.mark_read(id)).await
        else {
            return false;
        };

        let unread = {
            let mut guard = self.inner.lock_state();
            let state = &mut guard.view;
            let was_unread = state
                .items
                .iter_mut()
                .find(|n| n.id == id)
                .is_some_and(|item| {
                    let was_unread = !item.read;
                    item.read = true;
                    if item.read_at.is_none() {
                        item.read_at = Some(Utc::now());
                    }
                    was_unread
                });
            let local = if was_unread {
                state.unread_count.saturating_sub(1)
            } else {
                state.unread_count
            };
            Inner::<C>::reconcile_unread(state, response.unread_count, local)
        };

        self.inner.finish_mutation(unread).await;
        true
    }

    /// Mark every notification read
    pub async fn mark_all_as_read(&self) -> bool {
        let Some(response) = self
            .mutation("mark_all_as_read", self.inner.api.mark_all_read())
            .await
        else {
            return false;
        };

        let unread = {
            let mut guard = self.inner.lock_state();
            let state = &mut guard.view;
            let now = Utc::now();
            for item in state.items.iter_mut().filter(|n| !n.read) {
                item.read = true;
                item.read_at = Some(now);
            }
            Inner::<C>::record_unread(state, response.unread_count.unwrap_or(0))
        };

        self.inner.finish_mutation(unread).await;
        true
    }

    /// Delete one notification
    pub async fn delete_notification(&self, id: u64) -> bool {
        let Some(response) = self
            .mutation("delete_notification", self.inner.api.delete_notification(id))
            .await
        else {
            return false;
        };

        let unread = {
            let mut guard = self.inner.lock_state();
            let state = &mut guard.view;
            let removed = state
                .items
                .iter()
                .position(|n| n.id == id)
                .map(|index| state.items.remove(index));
            if removed.is_some() {
                state.total_count = state.total_count.saturating_sub(1);
            }
            let local = match removed {
                Some(item) if !item.read => state.unread_count.saturating_sub(1),
                _ => state.unread_count,
            };
            Inner::<C>::reconcile_unread(state, response.unread_count, local)
        };

        self.inner.finish_mutation(unread).await;
        true
    }

    /// Cheap cache-first unread count refresh that leaves the list alone
    pub async fn refresh_unread_count(&self) {
        if !self.inner.is_active() {
            return;
        }
        if let Some(cached) = self
            .inner
            .cached::<UnreadCountResponse>(&CacheKey::UnreadCount)
            .await
        {
            self.inner.set_unread(cached.unread_count);
            return;
        }

        let session = self.inner.current_scope().session;
        let inner = Arc::clone(&self.inner);
        self.inner
            .count_fetches
            .join_or_start(CacheKey::UnreadCount, move || async move {
                inner.load_unread_count(session).await;
            })
            .await;
    }

    /// Retry affordance: bypass the cache and reload the first page
    pub async fn refetch(&self) {
        self.inner
            .invalidate(&[CacheKey::FIRST_NOTIFICATION_PAGE, CacheKey::UnreadCount])
            .await;
        self.fetch_notifications(1, false).await;
    }

    /// Client route for a notification, `None` when it has no destination
    #[must_use]
    pub fn get_notification_url(&self, notification: &Notification) -> Option<String> {
        routes::notification_url(notification)
    }

    /// Unread notifications per section among the loaded items
    #[must_use]
    pub fn unread_by_section(&self) -> HashMap<Section, u64> {
        let state = self.inner.lock_state();
        sections::unread_by_section(&state.view.items)
    }

    /// Authentication lost: drop list, counts and cache; ignore in-flight responses
    pub async fn reset(&self) {
        {
            let mut scope = self.inner.lock_scope();
            scope.session.cancel();
            *scope = FetchScope::fresh();
        }
        self.inner.list_fetches.clear();
        self.inner.count_fetches.clear();
        {
            let mut state = self.inner.lock_state();
            *state = StoreState {
                view: NotificationState {
                    phase: SessionPhase::Reset,
                    ..NotificationState::default()
                },
                pending_loads: 0,
            };
        }
        if let Err(e) = self.inner.cache.clear_all().await {
            warn!(error = %e, "Failed to clear notification cache on reset");
        }
        info!("Notification store reset");
        self.inner.events.emit(&NotificationEvent::Reset);
    }

    /// Drop every subscriber and abandon in-flight work
    pub fn dispose(&self) {
        self.inner.lock_scope().session.cancel();
        self.inner.events.clear();
        self.inner.list_fetches.clear();
        self.inner.count_fetches.clear();
    }

    /// Run a server mutation; `None` when inactive, failed, or reset while waiting
    async fn mutation<F>(&self, action: &'static str, call: F) -> Option<MutationResponse>
    where
        F: std::future::Future<Output = AppResult<MutationResponse>> + Send,
    {
        if !self.inner.is_active() {
            debug!(action, "Not authenticated, ignoring notification mutation");
            return None;
        }
        let session = self.inner.current_scope().session;
        match call.await {
            Ok(_) if session.is_cancelled() => {
                debug!(action, "Session reset during mutation, not applying");
                None
            }
            Ok(response) => Some(response),
            Err(e) => {
                self.inner.record_error(action, &e);
                None
            }
        }
    }
}

impl<C: CacheProvider> Inner<C> {
    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Notification state lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_scope(&self) -> MutexGuard<'_, FetchScope> {
        self.scope.lock().unwrap_or_else(|poisoned| {
            warn!("Notification fetch scope lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn current_scope(&self) -> FetchScope {
        self.lock_scope().clone()
    }

    fn is_active(&self) -> bool {
        self.lock_state().view.phase.is_active()
    }

    async fn cached<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "Cached notification data unreadable, ignoring");
                None
            }
        }
    }

    async fn store<T: serde::Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: std::time::Duration,
    ) {
        if let Err(e) = self.cache.set(key, value, ttl).await {
            warn!(%key, error = %e, "Failed to cache notification data");
        }
    }

    async fn invalidate(&self, keys: &[CacheKey]) {
        for key in keys {
            if let Err(e) = self.cache.invalidate(key).await {
                warn!(%key, error = %e, "Failed to invalidate notification cache entry");
            }
        }
    }

    /// Adopt `count` as the unread total; returns it when subscribers must hear about it
    fn record_unread(state: &mut NotificationState, count: u64) -> Option<u64> {
        let changed = !state.unread_known || state.unread_count != count;
        state.unread_count = count;
        state.unread_known = true;
        changed.then_some(count)
    }

    /// Server count wins over the local estimate; an unknown count stays unknown
    fn reconcile_unread(
        state: &mut NotificationState,
        server: Option<u64>,
        local: u64,
    ) -> Option<u64> {
        match server {
            Some(count) => Self::record_unread(state, count),
            None if state.unread_known => Self::record_unread(state, local),
            None => None,
        }
    }

    fn set_unread(&self, count: u64) {
        let changed = Self::record_unread(&mut self.lock_state().view, count);
        if let Some(count) = changed {
            self.events
                .emit(&NotificationEvent::UnreadCountChanged(count));
        }
    }

    fn apply_page(&self, page: u32, response: NotificationListResponse) {
        let page_size = u64::from(self.config.page_size);
        let unread = {
            let mut guard = self.lock_state();
            let state = &mut guard.view;
            if page <= 1 {
                state.items = response.notifications;
            } else {
                let loaded: HashSet<u64> = state.items.iter().map(|n| n.id).collect();
                state.items.extend(
                    response
                        .notifications
                        .into_iter()
                        .filter(|n| !loaded.contains(&n.id)),
                );
            }
            state.current_page = page;
            state.total_count = response.total;
            state.has_more = u64::from(page) * page_size < response.total;
            state.error = None;
            Self::record_unread(state, response.unread_count)
        };

        self.events.emit(&NotificationEvent::ListChanged);
        if let Some(count) = unread {
            self.events
                .emit(&NotificationEvent::UnreadCountChanged(count));
        }
    }

    fn fail_page(&self, page: u32, error: &AppError) {
        warn!(page, error = %error, "Failed to fetch notifications");
        let message = error.to_string();
        {
            let mut guard = self.lock_state();
            let state = &mut guard.view;
            state.error = Some(message.clone());
            if page <= 1 {
                state.items.clear();
                state.has_more = false;
                state.total_count = 0;
            }
        }
        if page <= 1 {
            self.events.emit(&NotificationEvent::ListChanged);
        }
        self.events.emit(&NotificationEvent::Error(message));
    }

    fn record_error(&self, action: &str, error: &AppError) {
        warn!(action, error = %error, "Notification request failed");
        let message = error.to_string();
        self.lock_state().view.error = Some(message.clone());
        self.events.emit(&NotificationEvent::Error(message));
    }

    /// Count one running load; `false` when the session it belongs to was reset
    fn begin_load(&self, session: &CancellationToken) -> bool {
        let started = {
            let mut state = self.lock_state();
            if session.is_cancelled() {
                return false;
            }
            state.pending_loads += 1;
            let started = !state.view.loading;
            state.view.loading = true;
            if state.view.phase == SessionPhase::Idle {
                state.view.phase = SessionPhase::Fetching;
            }
            started
        };
        if started {
            self.events.emit(&NotificationEvent::Loading(true));
        }
        true
    }

    fn end_load(&self) {
        let finished = {
            let mut state = self.lock_state();
            state.pending_loads = state.pending_loads.saturating_sub(1);
            let finished = state.pending_loads == 0 && state.view.loading;
            if state.pending_loads == 0 {
                state.view.loading = false;
                if state.view.phase == SessionPhase::Fetching {
                    state.view.phase = SessionPhase::Idle;
                }
            }
            finished
        };
        if finished {
            self.events.emit(&NotificationEvent::Loading(false));
        }
    }

    async fn load_page(&self, query: ListQuery, scope: FetchScope, abandoned: CancellationToken) {
        if !self.begin_load(&scope.session) {
            return;
        }
        let result = self.api.list_notifications(query).await;

        if scope.session.is_cancelled() {
            debug!(page = query.page, "Discarding notifications fetched before reset");
            return;
        }
        let view_cancelled = scope.view.is_cancelled() || abandoned.is_cancelled();

        match result {
            Ok(response) => {
                if query.page == 1 && !query.unread_only {
                    self.store(
                        &CacheKey::FIRST_NOTIFICATION_PAGE,
                        &response,
                        self.config.list_cache_ttl,
                    )
                    .await;
                }
                self.store(
                    &CacheKey::UnreadCount,
                    &UnreadCountResponse {
                        unread_count: response.unread_count,
                    },
                    self.config.unread_cache_ttl,
                )
                .await;

                if view_cancelled {
                    debug!(page = query.page, "View left, not applying notifications");
                } else {
                    debug!(
                        page = query.page,
                        items = response.notifications.len(),
                        "Fetched notifications"
                    );
                    self.apply_page(query.page, response);
                }
            }
            Err(e) if !view_cancelled => self.fail_page(query.page, &e),
            Err(e) => debug!(error = %e, "Ignoring failure of a cancelled notification fetch"),
        }
        self.end_load();
    }

    async fn load_unread_count(&self, session: CancellationToken) {
        let result = self.api.unread_count().await;
        if session.is_cancelled() {
            return;
        }
        match result {
            Ok(response) => {
                self.store(&CacheKey::UnreadCount, &response, self.config.unread_cache_ttl)
                    .await;
                self.set_unread(response.unread_count);
            }
            Err(e) => self.record_error("refresh_unread_count", &e),
        }
    }

    async fn finish_mutation(&self, unread: Option<u64>) {
        self.events.emit(&NotificationEvent::ListChanged);
        if let Some(count) = unread {
            self.events
                .emit(&NotificationEvent::UnreadCountChanged(count));
        }
        self.invalidate(&[CacheKey::FIRST_NOTIFICATION_PAGE, CacheKey::UnreadCount])
            .await;
    }
}
