// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for caching, polling, toasts and the marketplace API
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single large file.

/// Cache-related constants (TTL, sizes, throttle windows)
pub mod cache;

/// Marketplace API endpoint paths
pub mod endpoints {
    /// Unified header counters (cart, favorites, unread notifications)
    pub const HEADER_COUNTERS: &str = "/api/header/counters";
    /// Paginated notification list
    pub const NOTIFICATIONS: &str = "/api/notifications";
    /// Unread count only
    pub const UNREAD_COUNT: &str = "/api/notifications/unread-count";
    /// Mark every notification read
    pub const MARK_ALL_READ: &str = "/api/notifications/read-all";
}

/// Client-side routes used for click-through navigation
pub mod routes {
    /// Notification inbox
    pub const NOTIFICATIONS_INBOX: &str = "/notifications";
    /// Buyer/seller chat
    pub const CHAT: &str = "/chat";
    /// Buyer orders
    pub const ORDERS: &str = "/orders";
    /// Product detail pages
    pub const PRODUCTS: &str = "/products";
    /// Seller order management
    pub const SELLER_ORDERS: &str = "/seller/orders";
    /// Seller product management
    pub const SELLER_PRODUCTS: &str = "/seller/products";
    /// Seller inventory overview
    pub const SELLER_INVENTORY: &str = "/seller/inventory";
    /// Seller review overview
    pub const SELLER_REVIEWS: &str = "/seller/reviews";
    /// Seller payouts
    pub const SELLER_PAYOUTS: &str = "/seller/payouts";
    /// Admin seller management
    pub const ADMIN_SELLERS: &str = "/admin/sellers";
}

/// Toast presentation and background polling
pub mod toasts {
    /// How long a toast stays visible
    pub const TOAST_VISIBLE_SECS: u64 = 5;
    /// Background unread-count refresh cadence
    pub const UNREAD_REFRESH_INTERVAL_SECS: u64 = 60;
}

/// HTTP client settings
pub mod http {
    /// Request timeout for marketplace API calls
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Connect timeout for marketplace API calls
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Default API base URL for local development
    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
}

/// Service identifiers used in structured logs
pub mod service_names {
    /// This library
    pub const MARKETPLACE_SYNC: &str = "marketplace-sync";
}
