// ABOUTME: Header counter snapshot shown in the storefront badges
// ABOUTME: Unsigned counters with saturating optimistic mutations
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use serde::{Deserialize, Serialize};
use std::fmt;

/// Denormalized projection of the server-side cart, favorites and unread aggregates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderCounters {
    /// Items currently in the cart
    pub cart_item_count: u32,
    /// Products marked as favorite
    pub favorite_count: u32,
    /// Unread notifications
    pub notification_count: u32,
}

/// Names one of the three header counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    /// Cart badge
    Cart,
    /// Favorites badge
    Favorites,
    /// Notification bell badge
    Notifications,
}

impl HeaderCounters {
    /// Read one counter
    #[must_use]
    pub const fn get(&self, kind: CounterKind) -> u32 {
        match kind {
            CounterKind::Cart => self.cart_item_count,
            CounterKind::Favorites => self.favorite_count,
            CounterKind::Notifications => self.notification_count,
        }
    }

    /// Overwrite one counter
    pub fn set(&mut self, kind: CounterKind, value: u32) {
        match kind {
            CounterKind::Cart => self.cart_item_count = value,
            CounterKind::Favorites => self.favorite_count = value,
            CounterKind::Notifications => self.notification_count = value,
        }
    }

    /// Add `delta` to one counter, clamping to `0..=u32::MAX`
    pub fn adjust(&mut self, kind: CounterKind, delta: i64) {
        let current = i64::from(self.get(kind));
        let next = current.saturating_add(delta).clamp(0, i64::from(u32::MAX));
        self.set(kind, next as u32);
    }
}

impl fmt::Display for CounterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cart => write!(f, "cart"),
            Self::Favorites => write!(f, "favorites"),
            Self::Notifications => write!(f, "notifications"),
        }
    }
}
