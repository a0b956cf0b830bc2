// ABOUTME: Tuning for the counter synchronizer, notification store and toast orchestrator
// ABOUTME: TTLs and throttle windows trade brief staleness for fewer requests
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{env_or, env_secs};
use marketplace_core::constants::{cache, routes, toasts};
use std::time::Duration;

/// Header counter caching and throttling
#[derive(Debug, Clone)]
pub struct CounterSyncConfig {
    /// How long fetched counters stay fresh in the TTL cache
    pub cache_ttl: Duration,
    /// Minimum spacing between two non-forced network fetches
    pub min_fetch_interval: Duration,
}

impl Default for CounterSyncConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(cache::TTL_HEADER_COUNTERS_SECS),
            min_fetch_interval: Duration::from_secs(cache::COUNTERS_MIN_FETCH_INTERVAL_SECS),
        }
    }
}

impl CounterSyncConfig {
    /// Load from `COUNTERS_CACHE_TTL_SECS` and `COUNTERS_MIN_FETCH_INTERVAL_SECS`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            cache_ttl: env_secs("COUNTERS_CACHE_TTL_SECS", cache::TTL_HEADER_COUNTERS_SECS),
            min_fetch_interval: env_secs(
                "COUNTERS_MIN_FETCH_INTERVAL_SECS",
                cache::COUNTERS_MIN_FETCH_INTERVAL_SECS,
            ),
        }
    }
}

/// Notification list paging and caching
#[derive(Debug, Clone)]
pub struct NotificationStoreConfig {
    /// Items requested per page
    pub page_size: u32,
    /// TTL of the cached unfiltered first page
    pub list_cache_ttl: Duration,
    /// TTL of the cached unread count
    pub unread_cache_ttl: Duration,
}

impl Default for NotificationStoreConfig {
    fn default() -> Self {
        Self {
            page_size: cache::NOTIFICATIONS_PAGE_SIZE,
            list_cache_ttl: Duration::from_secs(cache::TTL_NOTIFICATION_PAGE_SECS),
            unread_cache_ttl: Duration::from_secs(cache::TTL_UNREAD_COUNT_SECS),
        }
    }
}

impl NotificationStoreConfig {
    /// Load from `NOTIFICATIONS_PAGE_SIZE`, `NOTIFICATIONS_CACHE_TTL_SECS`
    /// and `UNREAD_COUNT_CACHE_TTL_SECS`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            page_size: env_or("NOTIFICATIONS_PAGE_SIZE", cache::NOTIFICATIONS_PAGE_SIZE).max(1),
            list_cache_ttl: env_secs(
                "NOTIFICATIONS_CACHE_TTL_SECS",
                cache::TTL_NOTIFICATION_PAGE_SECS,
            ),
            unread_cache_ttl: env_secs("UNREAD_COUNT_CACHE_TTL_SECS", cache::TTL_UNREAD_COUNT_SECS),
        }
    }
}

/// Toast timing and background unread refresh
#[derive(Debug, Clone)]
pub struct ToastConfig {
    /// How long a toast stays visible
    pub visible_duration: Duration,
    /// Cadence of the background unread-count refresh
    pub refresh_interval: Duration,
    /// Route of the notification inbox; entering it clears toasts
    pub inbox_route: String,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            visible_duration: Duration::from_secs(toasts::TOAST_VISIBLE_SECS),
            refresh_interval: Duration::from_secs(toasts::UNREAD_REFRESH_INTERVAL_SECS),
            inbox_route: routes::NOTIFICATIONS_INBOX.to_owned(),
        }
    }
}

impl ToastConfig {
    /// Load from `TOAST_DURATION_SECS`, `UNREAD_REFRESH_INTERVAL_SECS`
    /// and `NOTIFICATIONS_INBOX_ROUTE`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            visible_duration: env_secs("TOAST_DURATION_SECS", toasts::TOAST_VISIBLE_SECS),
            refresh_interval: env_secs(
                "UNREAD_REFRESH_INTERVAL_SECS",
                toasts::UNREAD_REFRESH_INTERVAL_SECS,
            ),
            inbox_route: std::env::var("NOTIFICATIONS_INBOX_ROUTE")
                .unwrap_or_else(|_| routes::NOTIFICATIONS_INBOX.to_owned()),
        }
    }
}
