// ABOUTME: Main library entry point for the marketplace notification and counter sync layer
// ABOUTME: Wires the TTL cache, header counters, notification store and toast orchestrator
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![deny(unsafe_code)]

//! # Marketplace Sync
//!
//! Client-side synchronization for a marketplace storefront. Header badges,
//! toast popups, the notification inbox and the seller/admin section badges all
//! read from one source of truth while redundant network calls are kept to a
//! minimum.
//!
//! ## Architecture
//!
//! - **Cache**: TTL key-value cache shared by every component
//! - **Counters**: throttled, cached header counters with optimistic mutations
//! - **Notifications**: paginated inbox with coalesced fetches and unread tracking
//! - **Toasts**: baseline-aware "new notifications" popups and background refresh
//! - **Session**: reacts to the authentication signal and wires the above together
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use marketplace_sync::auth::AuthSignal;
//! use marketplace_sync::api::http::HttpMarketplaceApi;
//! use marketplace_sync::config::SyncConfig;
//! use marketplace_sync::session::SyncSession;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     marketplace_sync::logging::init_from_env()?;
//!
//!     let config = SyncConfig::from_env();
//!     let api = Arc::new(HttpMarketplaceApi::new(&config.api)?);
//!     let auth = AuthSignal::new(false);
//!
//!     let session = SyncSession::create(api, config, auth.clone()).await?;
//!     let _badge = session.counters().subscribe(|snapshot| {
//!         println!("cart: {}", snapshot.counters.cart_item_count);
//!     });
//!
//!     auth.set_authenticated(true);
//!     session.on_route_change("/notifications");
//!     session.dispose();
//!     Ok(())
//! }
//! ```

/// Marketplace API boundary and its HTTP implementation
pub mod api;

/// Authentication signal consumed by every component
pub mod auth;

/// Cache abstraction layer with an in-memory TTL backend
pub mod cache;

/// Environment-driven configuration
pub mod config;

/// Header counter synchronizer
pub mod counters;

/// Typed publish/subscribe broadcaster
pub mod events;

/// Request coalescing registry
pub mod inflight;

/// Structured logging setup
pub mod logging;

/// Notification store, routing and section badges
pub mod notifications;

/// Lifecycle wiring of all components for one client session
pub mod session;

/// Toast orchestration and background unread refresh
pub mod toasts;

/// Shared HTTP client utilities
pub mod utils;

pub use marketplace_core::{constants, errors, models};
