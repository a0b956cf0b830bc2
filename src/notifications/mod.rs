// ABOUTME: Notification inbox module: store, click-through routing and section badges
// ABOUTME: The store is the single source of truth for the list and the unread total
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Notifications
//!
//! [`NotificationStore`] keeps the paginated inbox and the server-side unread
//! total. The count is tracked separately from the loaded items because the list
//! may only be partially paged in.
//!
//! Every consumer (bell badge, inbox page, section badges, toasts) subscribes to
//! [`NotificationEvent`]s; none of them mutate state except through the store's
//! operations.

/// Type and payload to client route mapping
pub mod routes;
/// Seller/admin section classification
pub mod sections;
/// The notification store
pub mod store;

pub use sections::Section;
pub use store::{NotificationEvent, NotificationState, NotificationStore, SessionPhase};
