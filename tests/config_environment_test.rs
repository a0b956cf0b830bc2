// ABOUTME: Unit tests for environment-driven configuration
// ABOUTME: Validates defaults, overrides and fallback on invalid values
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use marketplace_sync::config::cache::cache_config_from_env;
use marketplace_sync::config::{
    ApiConfig, CounterSyncConfig, NotificationStoreConfig, SyncConfig, ToastConfig,
};
use serial_test::serial;
use std::env;
use std::time::Duration;

const VARS: &[&str] = &[
    "MARKETPLACE_API_URL",
    "MARKETPLACE_API_TOKEN",
    "API_TIMEOUT_SECS",
    "API_CONNECT_TIMEOUT_SECS",
    "CACHE_MAX_ENTRIES",
    "CACHE_CLEANUP_INTERVAL_SECS",
    "CACHE_BACKGROUND_CLEANUP",
    "COUNTERS_CACHE_TTL_SECS",
    "COUNTERS_MIN_FETCH_INTERVAL_SECS",
    "NOTIFICATIONS_PAGE_SIZE",
    "NOTIFICATIONS_CACHE_TTL_SECS",
    "UNREAD_COUNT_CACHE_TTL_SECS",
    "TOAST_DURATION_SECS",
    "UNREAD_REFRESH_INTERVAL_SECS",
    "NOTIFICATIONS_INBOX_ROUTE",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();

    let config = SyncConfig::from_env();

    assert_eq!(config.api.base_url, "http://localhost:3000");
    assert_eq!(config.api.access_token, None);
    assert_eq!(config.api.request_timeout_secs, 30);
    assert_eq!(config.cache.max_entries, 256);
    assert!(config.cache.enable_background_cleanup);
    assert_eq!(config.counters.cache_ttl, Duration::from_secs(120));
    assert_eq!(config.counters.min_fetch_interval, Duration::from_secs(30));
    assert_eq!(config.notifications.page_size, 20);
    assert_eq!(config.notifications.unread_cache_ttl, Duration::from_secs(30));
    assert_eq!(config.toasts.visible_duration, Duration::from_secs(5));
    assert_eq!(config.toasts.refresh_interval, Duration::from_secs(60));
    assert_eq!(config.toasts.inbox_route, "/notifications");
}

#[test]
#[serial]
fn test_api_config_overrides() {
    clear_env();
    env::set_var("MARKETPLACE_API_URL", "https://shop.example.com");
    env::set_var("MARKETPLACE_API_TOKEN", "abc123");
    env::set_var("API_TIMEOUT_SECS", "5");
    env::set_var("API_CONNECT_TIMEOUT_SECS", "2");

    let config = ApiConfig::from_env();

    assert_eq!(config.base_url, "https://shop.example.com");
    assert_eq!(config.access_token.as_deref(), Some("abc123"));
    assert_eq!(config.request_timeout_secs, 5);
    assert_eq!(config.connect_timeout_secs, 2);
    clear_env();
}

#[test]
#[serial]
fn test_empty_token_counts_as_absent() {
    clear_env();
    env::set_var("MARKETPLACE_API_TOKEN", "");

    assert_eq!(ApiConfig::from_env().access_token, None);
    clear_env();
}

#[test]
#[serial]
fn test_sync_tuning_overrides() {
    clear_env();
    env::set_var("COUNTERS_CACHE_TTL_SECS", "10");
    env::set_var("COUNTERS_MIN_FETCH_INTERVAL_SECS", "3");
    env::set_var("NOTIFICATIONS_PAGE_SIZE", "50");
    env::set_var("NOTIFICATIONS_CACHE_TTL_SECS", "90");
    env::set_var("UNREAD_COUNT_CACHE_TTL_SECS", "15");
    env::set_var("TOAST_DURATION_SECS", "8");
    env::set_var("UNREAD_REFRESH_INTERVAL_SECS", "120");
    env::set_var("NOTIFICATIONS_INBOX_ROUTE", "/inbox");

    let counters = CounterSyncConfig::from_env();
    let notifications = NotificationStoreConfig::from_env();
    let toasts = ToastConfig::from_env();

    assert_eq!(counters.cache_ttl, Duration::from_secs(10));
    assert_eq!(counters.min_fetch_interval, Duration::from_secs(3));
    assert_eq!(notifications.page_size, 50);
    assert_eq!(notifications.list_cache_ttl, Duration::from_secs(90));
    assert_eq!(notifications.unread_cache_ttl, Duration::from_secs(15));
    assert_eq!(toasts.visible_duration, Duration::from_secs(8));
    assert_eq!(toasts.refresh_interval, Duration::from_secs(120));
    assert_eq!(toasts.inbox_route, "/inbox");
    clear_env();
}

#[test]
#[serial]
fn test_invalid_values_fall_back_to_defaults() {
    clear_env();
    env::set_var("COUNTERS_CACHE_TTL_SECS", "two minutes");
    env::set_var("NOTIFICATIONS_PAGE_SIZE", "-4");
    env::set_var("CACHE_MAX_ENTRIES", "lots");

    assert_eq!(
        CounterSyncConfig::from_env().cache_ttl,
        Duration::from_secs(120)
    );
    assert_eq!(NotificationStoreConfig::from_env().page_size, 20);
    assert_eq!(cache_config_from_env().max_entries, 256);
    clear_env();
}

#[test]
#[serial]
fn test_zero_page_size_is_raised_to_one() {
    clear_env();
    env::set_var("NOTIFICATIONS_PAGE_SIZE", "0");

    assert_eq!(NotificationStoreConfig::from_env().page_size, 1);
    clear_env();
}

#[test]
#[serial]
fn test_cache_config_from_env() {
    clear_env();
    env::set_var("CACHE_MAX_ENTRIES", "32");
    env::set_var("CACHE_CLEANUP_INTERVAL_SECS", "10");
    env::set_var("CACHE_BACKGROUND_CLEANUP", "false");

    let config = cache_config_from_env();

    assert_eq!(config.max_entries, 32);
    assert_eq!(config.cleanup_interval, Duration::from_secs(10));
    assert!(!config.enable_background_cleanup);

    env::set_var("CACHE_BACKGROUND_CLEANUP", "1");
    assert!(cache_config_from_env().enable_background_cleanup);
    clear_env();
}
