// ABOUTME: Marketplace API boundary consumed by the synchronization layer
// ABOUTME: Object-safe async trait with one pinned response schema per endpoint
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Marketplace API Boundary
//!
//! The synchronization components never talk HTTP directly; they call a
//! [`MarketplaceApi`]. [`http::HttpMarketplaceApi`] is the production
//! implementation; tests substitute scripted implementations.
//!
//! Each endpoint has exactly one accepted response shape. A payload that does
//! not match fails with `ErrorCode::SerializationError` instead of being guessed at.

/// reqwest-backed implementation
pub mod http;

use crate::errors::AppResult;
use crate::models::{HeaderCounters, Notification};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// `GET` header counters response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountersResponse {
    /// Items in the cart
    pub cart_count: u32,
    /// Favorited products
    pub favorites_count: u32,
    /// Unread notifications
    pub notifications_count: u32,
}

impl From<CountersResponse> for HeaderCounters {
    fn from(response: CountersResponse) -> Self {
        Self {
            cart_item_count: response.cart_count,
            favorite_count: response.favorites_count,
            notification_count: response.notifications_count,
        }
    }
}

/// `GET` notification list response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationListResponse {
    /// The requested page, newest first
    pub notifications: Vec<Notification>,
    /// Server-side unread total across all pages
    pub unread_count: u64,
    /// Server-side total matching the filter
    pub total: u64,
}

/// `GET` unread count response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCountResponse {
    /// Server-side unread total
    pub unread_count: u64,
}

/// Response of the read / read-all / delete mutations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Authoritative unread total after the mutation, when the server reports it
    #[serde(default)]
    pub unread_count: Option<u64>,
}

/// Query parameters for the notification list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListQuery {
    /// 1-based page
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Only unread notifications
    pub unread_only: bool,
}

/// Network operations the synchronization layer depends on
#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    /// Fetch cart, favorites and unread counters in one call
    ///
    /// # Errors
    ///
    /// Transport failure, non-success status or schema mismatch
    async fn fetch_counters(&self) -> AppResult<CountersResponse>;

    /// Fetch one page of notifications
    ///
    /// # Errors
    ///
    /// Transport failure, non-success status or schema mismatch
    async fn list_notifications(&self, query: ListQuery) -> AppResult<NotificationListResponse>;

    /// Fetch the unread total only
    ///
    /// # Errors
    ///
    /// Transport failure, non-success status or schema mismatch
    async fn unread_count(&self) -> AppResult<UnreadCountResponse>;

    /// Mark one notification read
    ///
    /// # Errors
    ///
    /// Transport failure, non-success status or schema mismatch
    async fn mark_read(&self, id: u64) -> AppResult<MutationResponse>;

    /// Mark every notification read
    ///
    /// # Errors
    ///
    /// Transport failure, non-success status or schema mismatch
    async fn mark_all_read(&self) -> AppResult<MutationResponse>;

    /// Delete one notification
    ///
    /// # Errors
    ///
    /// Transport failure, non-success status or schema mismatch
    async fn delete_notification(&self, id: u64) -> AppResult<MutationResponse>;
}
