// ABOUTME: TTL cache sizing and cleanup configuration
// ABOUTME: Reads capacity and sweep interval from the environment
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{env_or, env_secs};
use crate::cache::CacheConfig;
use marketplace_core::constants::cache;

/// Load cache configuration from environment
///
/// - `CACHE_MAX_ENTRIES`: LRU capacity
/// - `CACHE_CLEANUP_INTERVAL_SECS`: background sweep cadence
/// - `CACHE_BACKGROUND_CLEANUP`: set to `false` or `0` to disable the sweep task
#[must_use]
pub fn cache_config_from_env() -> CacheConfig {
    CacheConfig {
        max_entries: env_or("CACHE_MAX_ENTRIES", cache::DEFAULT_CACHE_MAX_ENTRIES),
        cleanup_interval: env_secs(
            "CACHE_CLEANUP_INTERVAL_SECS",
            cache::DEFAULT_CLEANUP_INTERVAL_SECS,
        ),
        enable_background_cleanup: std::env::var("CACHE_BACKGROUND_CLEANUP")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true),
    }
}
