// ABOUTME: TTL cache abstraction shared by the counter synchronizer and notification store
// ABOUTME: Structured cache keys and a pluggable backend trait with an in-memory implementation
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// In-memory cache implementation
pub mod memory;

use crate::errors::AppResult;
use marketplace_core::constants::cache::{DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CLEANUP_INTERVAL_SECS};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::time::Duration;

/// Cache provider trait for pluggable backend implementations.
///
/// A read at or after an entry's expiry is a miss and discards the entry.
/// Callers cannot tell "never stored" from "expired"; both are `Ok(None)`.
/// A backend that persists entries must still honor the TTL on read.
///
/// # Examples
///
/// ```rust,no_run
/// use marketplace_sync::cache::{CacheConfig, CacheKey, CacheProvider};
/// use marketplace_sync::cache::memory::InMemoryCache;
/// use marketplace_sync::models::HeaderCounters;
/// use std::time::Duration;
/// # async fn example() -> Result<(), marketplace_sync::errors::AppError> {
///
/// let cache = InMemoryCache::new(CacheConfig {
///     enable_background_cleanup: false,
///     ..Default::default()
/// })
/// .await?;
///
/// let counters = HeaderCounters { cart_item_count: 2, ..Default::default() };
/// cache.set(&CacheKey::HeaderCounters, &counters, Duration::from_secs(120)).await?;
///
/// let cached: Option<HeaderCounters> = cache.get(&CacheKey::HeaderCounters).await?;
/// assert_eq!(cached, Some(counters));
///
/// cache.invalidate(&CacheKey::HeaderCounters).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait CacheProvider: Send + Sync + Clone + 'static {
    /// Create new cache instance with configuration
    ///
    /// # Errors
    ///
    /// Returns an error if cache initialization fails
    async fn new(config: CacheConfig) -> AppResult<Self>
    where
        Self: Sized;

    /// Store value with `expires_at = now + ttl`, replacing any existing entry
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or storage fails
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &CacheKey,
        value: &T,
        ttl: Duration,
    ) -> AppResult<()>;

    /// Retrieve a fresh value, `None` when absent or expired
    ///
    /// # Errors
    ///
    /// Returns an error if the stored payload cannot be deserialized as `T`
    async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>>;

    /// Remove single cache entry; absent keys are not an error
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails
    async fn invalidate(&self, key: &CacheKey) -> AppResult<()>;

    /// Check if a fresh entry exists
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails
    async fn exists(&self, key: &CacheKey) -> AppResult<bool>;

    /// Remaining TTL for key
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails
    async fn ttl(&self, key: &CacheKey) -> AppResult<Option<Duration>>;

    /// Clear all cache entries (session reset)
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails
    async fn clear_all(&self) -> AppResult<()>;
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries before LRU eviction
    pub max_entries: usize,
    /// Cleanup interval for expired entries
    pub cleanup_interval: Duration,
    /// Enable background cleanup task (should be false in tests to avoid runtime conflicts)
    pub enable_background_cleanup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
            enable_background_cleanup: true,
        }
    }
}

/// Structured cache key: the cached resource plus its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Cart, favorites and unread badges
    HeaderCounters,
    /// One page of the notification list
    NotificationPage {
        /// 1-based page number
        page: u32,
        /// Whether the list was filtered to unread items
        unread_only: bool,
    },
    /// Unread notification count
    UnreadCount,
}

impl CacheKey {
    /// The unfiltered first page, the only list page the store caches
    pub const FIRST_NOTIFICATION_PAGE: Self = Self::NotificationPage {
        page: 1,
        unread_only: false,
    };
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderCounters => write!(f, "header_counters"),
            Self::NotificationPage { page, unread_only } => {
                write!(f, "notifications:page:{page}:unread_only:{unread_only}")
            }
            Self::UnreadCount => write!(f, "notifications:unread_count"),
        }
    }
}
