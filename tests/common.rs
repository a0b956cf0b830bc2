// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides a scriptable marketplace API mock, fixtures and quiet logging
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::unwrap_used,
    clippy::panic
)]
//! Shared test utilities for `marketplace_sync`
//!
//! [`MockMarketplaceApi`] answers from scripted responses, counts calls per
//! endpoint and can hold every request in flight until released.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use marketplace_sync::api::{
    CountersResponse, ListQuery, MarketplaceApi, MutationResponse, NotificationListResponse,
    UnreadCountResponse,
};
use marketplace_sync::cache::memory::InMemoryCache;
use marketplace_sync::cache::{CacheConfig, CacheKey, CacheProvider};
use marketplace_sync::errors::{AppError, AppResult};
use marketplace_sync::models::Notification;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::sync::Semaphore;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Cache without the background sweep, as every component test uses
pub async fn create_test_cache() -> InMemoryCache {
    InMemoryCache::new(CacheConfig {
        max_entries: 64,
        cleanup_interval: Duration::from_secs(300),
        enable_background_cleanup: false,
    })
    .await
    .unwrap()
}

/// Notification fixture with a fixed creation time
pub fn notification(id: u64, kind: &str, read: bool) -> Notification {
    Notification {
        id,
        user_id: 1,
        notification_type: kind.to_owned(),
        title: format!("Notification {id}"),
        message: "Something happened".to_owned(),
        data: json!({ "order_id": id }),
        read,
        read_at: None,
        created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
    }
}

/// One page of unread `order_shipped` notifications with the given ids
pub fn page_of(ids: &[u64], total: u64, unread_count: u64) -> NotificationListResponse {
    NotificationListResponse {
        notifications: ids
            .iter()
            .map(|id| notification(*id, "order_shipped", false))
            .collect(),
        unread_count,
        total,
    }
}

/// Per-endpoint call counters
#[derive(Debug, Default)]
pub struct CallCounts {
    pub counters: AtomicUsize,
    pub list: AtomicUsize,
    pub unread: AtomicUsize,
    pub mark_read: AtomicUsize,
    pub mark_all_read: AtomicUsize,
    pub delete: AtomicUsize,
}

/// Scriptable in-process marketplace API
pub struct MockMarketplaceApi {
    pub calls: CallCounts,
    counters: Mutex<CountersResponse>,
    pages: Mutex<HashMap<(u32, bool), NotificationListResponse>>,
    unread: Mutex<u64>,
    mutation_unread: Mutex<Option<u64>>,
    fail: AtomicBool,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockMarketplaceApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: CallCounts::default(),
            counters: Mutex::new(counters(0, 0, 0)),
            pages: Mutex::new(HashMap::new()),
            unread: Mutex::new(0),
            mutation_unread: Mutex::new(None),
            fail: AtomicBool::new(false),
            gate: Mutex::new(None),
        })
    }

    pub fn set_counters(&self, response: CountersResponse) {
        *self.counters.lock().unwrap() = response;
    }

    pub fn set_page(&self, page: u32, unread_only: bool, response: NotificationListResponse) {
        self.pages
            .lock()
            .unwrap()
            .insert((page, unread_only), response);
    }

    pub fn set_unread(&self, count: u64) {
        *self.unread.lock().unwrap() = count;
    }

    /// Unread total the read/delete mutations report back, `None` for an empty body
    pub fn set_mutation_unread(&self, count: Option<u64>) {
        *self.mutation_unread.lock().unwrap() = count;
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Park every subsequent request until [`Self::release_requests`]
    pub fn hold_requests(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_requests(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.close();
        }
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn enter(&self, counter: &AtomicUsize) -> AppResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            // Closing the semaphore releases every parked request
            let _ = gate.acquire().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::unavailable("marketplace API is down"));
        }
        Ok(())
    }

    fn mutation_response(&self) -> MutationResponse {
        MutationResponse {
            unread_count: *self.mutation_unread.lock().unwrap(),
        }
    }
}

pub const fn counters(cart: u32, favorites: u32, notifications: u32) -> CountersResponse {
    CountersResponse {
        cart_count: cart,
        favorites_count: favorites,
        notifications_count: notifications,
    }
}

#[async_trait]
impl MarketplaceApi for MockMarketplaceApi {
    async fn fetch_counters(&self) -> AppResult<CountersResponse> {
        self.enter(&self.calls.counters).await?;
        Ok(*self.counters.lock().unwrap())
    }

    async fn list_notifications(&self, query: ListQuery) -> AppResult<NotificationListResponse> {
        self.enter(&self.calls.list).await?;
        let scripted = self
            .pages
            .lock()
            .unwrap()
            .get(&(query.page, query.unread_only))
            .cloned();
        Ok(scripted.unwrap_or_else(|| NotificationListResponse {
            notifications: Vec::new(),
            unread_count: *self.unread.lock().unwrap(),
            total: 0,
        }))
    }

    async fn unread_count(&self) -> AppResult<UnreadCountResponse> {
        self.enter(&self.calls.unread).await?;
        Ok(UnreadCountResponse {
            unread_count: *self.unread.lock().unwrap(),
        })
    }

    async fn mark_read(&self, _id: u64) -> AppResult<MutationResponse> {
        self.enter(&self.calls.mark_read).await?;
        Ok(self.mutation_response())
    }

    async fn mark_all_read(&self) -> AppResult<MutationResponse> {
        self.enter(&self.calls.mark_all_read).await?;
        Ok(self.mutation_response())
    }

    async fn delete_notification(&self, _id: u64) -> AppResult<MutationResponse> {
        self.enter(&self.calls.delete).await?;
        Ok(self.mutation_response())
    }
}

/// In-memory cache whose writes can be parked to widen race windows
#[derive(Clone)]
pub struct StallingCache {
    inner: InMemoryCache,
    gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
    parked: Arc<AtomicUsize>,
}

impl StallingCache {
    /// Park every subsequent `set` until [`Self::resume_writes`]
    pub fn stall_writes(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn resume_writes(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.close();
        }
    }

    pub fn parked_writes(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CacheProvider for StallingCache {
    async fn new(config: CacheConfig) -> AppResult<Self> {
        Ok(Self {
            inner: InMemoryCache::new(config).await?,
            gate: Arc::new(Mutex::new(None)),
            parked: Arc::new(AtomicUsize::new(0)),
        })
    }

    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()> {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            self.parked.fetch_add(1, Ordering::SeqCst);
            let _ = gate.acquire().await;
        }
        self.inner.set(key, value, ttl).await
    }

    async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        self.inner.get(key).await
    }

    async fn invalidate(&self, key: &CacheKey) -> AppResult<()> {
        self.inner.invalidate(key).await
    }

    async fn exists(&self, key: &CacheKey) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn ttl(&self, key: &CacheKey) -> AppResult<Option<Duration>> {
        self.inner.ttl(key).await
    }

    async fn clear_all(&self) -> AppResult<()> {
        self.inner.clear_all().await
    }
}

pub async fn create_stalling_cache() -> StallingCache {
    StallingCache::new(CacheConfig {
        max_entries: 64,
        cleanup_interval: Duration::from_secs(300),
        enable_background_cleanup: false,
    })
    .await
    .unwrap()
}

/// Let spawned tasks run until `condition` holds
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached in time");
}

/// Let already-spawned tasks make progress without moving the clock
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
