// ABOUTME: Section classification for seller and admin badge consumers
// ABOUTME: Groups notification types into the navigation sections that show unread badges
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::models::{Notification, NotificationType};
use std::collections::HashMap;
use std::fmt;

/// Navigation area a notification belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Chat
    Messages,
    /// Buyer orders
    Orders,
    /// Seller dashboard (orders received, products, reviews, payouts)
    Seller,
    /// Admin console
    Admin,
}

impl Section {
    /// Section for a known notification type; platform notices have none
    #[must_use]
    pub const fn of(kind: NotificationType) -> Option<Self> {
        match kind {
            NotificationType::NewMessage => Some(Self::Messages),
            NotificationType::OrderCreated
            | NotificationType::OrderStatusChanged
            | NotificationType::OrderShipped
            | NotificationType::OrderDelivered
            | NotificationType::OrderCancelled => Some(Self::Orders),
            NotificationType::NewOrder
            | NotificationType::NewReview
            | NotificationType::ProductApproved
            | NotificationType::ProductRejected
            | NotificationType::LowStock
            | NotificationType::PayoutProcessed => Some(Self::Seller),
            NotificationType::SellerApplication => Some(Self::Admin),
            NotificationType::System => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Messages => write!(f, "messages"),
            Self::Orders => write!(f, "orders"),
            Self::Seller => write!(f, "seller"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Count unread notifications per section over a loaded list
pub(crate) fn unread_by_section<'a>(
    items: impl IntoIterator<Item = &'a Notification>,
) -> HashMap<Section, u64> {
    let mut counts = HashMap::new();
    for section in items
        .into_iter()
        .filter(|n| !n.read)
        .filter_map(|n| n.kind().and_then(Section::of))
    {
        *counts.entry(section).or_insert(0) += 1;
    }
    counts
}
