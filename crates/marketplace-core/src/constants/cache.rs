// ABOUTME: Cache-related constants for TTL, capacity, throttle windows and cleanup intervals
// ABOUTME: Defaults trade brief staleness for fewer requests from the many badge consumers
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

/// Default maximum cache entries for in-memory cache
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 256;

/// Default cleanup interval in seconds for expired entries
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300; // 5 minutes

/// Header counters cache TTL (2 minutes)
pub const TTL_HEADER_COUNTERS_SECS: u64 = 120;

/// Minimum spacing between two non-forced counter fetches (30 seconds)
pub const COUNTERS_MIN_FETCH_INTERVAL_SECS: u64 = 30;

/// First notification page cache TTL (2 minutes)
pub const TTL_NOTIFICATION_PAGE_SECS: u64 = 120;

/// Unread count cache TTL (30 seconds) - polled far more often than the list
pub const TTL_UNREAD_COUNT_SECS: u64 = 30;

/// Notifications requested per page
pub const NOTIFICATIONS_PAGE_SIZE: u32 = 20;
