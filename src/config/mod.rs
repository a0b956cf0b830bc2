// ABOUTME: Configuration module for the synchronization layer
// ABOUTME: Environment-only configuration with constant-backed defaults
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Configuration module
//!
//! Every component takes an explicit config struct so tests can build isolated
//! instances; [`SyncConfig::from_env`] assembles the production settings.
//!
//! - **network**: marketplace API base URL and timeouts
//! - **cache**: capacity and cleanup cadence of the TTL cache
//! - **sync**: TTLs, throttle windows, page size, toast timing

/// TTL cache sizing from environment
pub mod cache;
/// Marketplace API connection settings
pub mod network;
/// Counter, notification store and toast tuning
pub mod sync;

pub use network::ApiConfig;
pub use sync::{CounterSyncConfig, NotificationStoreConfig, ToastConfig};

use crate::cache::CacheConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Complete configuration for a [`crate::session::SyncSession`]
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Marketplace API connection
    pub api: ApiConfig,
    /// TTL cache sizing
    pub cache: CacheConfig,
    /// Header counter throttling and caching
    pub counters: CounterSyncConfig,
    /// Notification list paging and caching
    pub notifications: NotificationStoreConfig,
    /// Toast timing and background refresh
    pub toasts: ToastConfig,
}

impl SyncConfig {
    /// Load every section from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let config = Self {
            api: ApiConfig::from_env(),
            cache: cache::cache_config_from_env(),
            counters: CounterSyncConfig::from_env(),
            notifications: NotificationStoreConfig::from_env(),
            toasts: ToastConfig::from_env(),
        };
        tracing::debug!(
            api_base_url = %config.api.base_url,
            counters_ttl_secs = config.counters.cache_ttl.as_secs(),
            page_size = config.notifications.page_size,
            "Loaded sync configuration from environment"
        );
        config
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid
pub(crate) fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a duration given in whole seconds
pub(crate) fn env_secs(name: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_or(name, default_secs))
}
