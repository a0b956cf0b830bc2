// ABOUTME: Core data models for the synchronization layer
// ABOUTME: Re-exports header counter and notification types
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # Data Models
//!
//! - `HeaderCounters`: cart, favorites and unread notification badges
//! - `Notification`: a single server-side notification mirrored on the client
//! - `NotificationType`: the closed set of categories the client knows how to route

mod counters;
mod notification;

pub use counters::{CounterKind, HeaderCounters};
pub use notification::{Notification, NotificationType};
