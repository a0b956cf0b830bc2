// ABOUTME: Notification record mirrored from the marketplace API
// ABOUTME: Keeps the raw wire type string and classifies it into known categories
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A notification created server-side and fetched by the client.
///
/// The client only ever mutates `read` / `read_at` and removes records; the
/// canonical copy lives server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Server identifier
    pub id: u64,
    /// Recipient
    pub user_id: u64,
    /// Category as sent on the wire; see [`Notification::kind`]
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Short headline
    pub title: String,
    /// Body text
    pub message: String,
    /// Type-specific payload (`chat_id`, `order_id`, ...)
    #[serde(default)]
    pub data: Value,
    /// Whether the user has seen it
    pub read: bool,
    /// When it was marked read
    #[serde(default)]
    pub read_at: Option<DateTime<Utc>>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Known category, `None` for types this client does not recognize
    #[must_use]
    pub fn kind(&self) -> Option<NotificationType> {
        NotificationType::from_wire(&self.notification_type)
    }

    /// Look up a payload field as an identifier, accepting numbers or strings
    #[must_use]
    pub fn data_id(&self, field: &str) -> Option<String> {
        match self.data.get(field)? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
            _ => None,
        }
    }

    /// Look up a payload field as a string
    #[must_use]
    pub fn data_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// Notification categories the client knows how to route and badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationType {
    /// New chat message
    NewMessage,
    /// Buyer placed an order
    OrderCreated,
    /// Order moved to a new status
    OrderStatusChanged,
    /// Order handed to the carrier
    OrderShipped,
    /// Order delivered
    OrderDelivered,
    /// Order cancelled
    OrderCancelled,
    /// Seller received an order
    NewOrder,
    /// A product received a review
    NewReview,
    /// Moderation approved a product
    ProductApproved,
    /// Moderation rejected a product
    ProductRejected,
    /// Inventory is running low
    LowStock,
    /// Someone applied to become a seller (admin)
    SellerApplication,
    /// A seller payout was processed
    PayoutProcessed,
    /// Platform announcement
    System,
}

impl NotificationType {
    /// Parse the wire representation
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        let kind = match value {
            "new_message" | "chat_message" => Self::NewMessage,
            "order_created" => Self::OrderCreated,
            "order_status_changed" => Self::OrderStatusChanged,
            "order_shipped" => Self::OrderShipped,
            "order_delivered" => Self::OrderDelivered,
            "order_cancelled" => Self::OrderCancelled,
            "new_order" => Self::NewOrder,
            "new_review" => Self::NewReview,
            "product_approved" => Self::ProductApproved,
            "product_rejected" => Self::ProductRejected,
            "low_stock" => Self::LowStock,
            "seller_application" => Self::SellerApplication,
            "payout_processed" => Self::PayoutProcessed,
            "system" => Self::System,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical wire representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::OrderCreated => "order_created",
            Self::OrderStatusChanged => "order_status_changed",
            Self::OrderShipped => "order_shipped",
            Self::OrderDelivered => "order_delivered",
            Self::OrderCancelled => "order_cancelled",
            Self::NewOrder => "new_order",
            Self::NewReview => "new_review",
            Self::ProductApproved => "product_approved",
            Self::ProductRejected => "product_rejected",
            Self::LowStock => "low_stock",
            Self::SellerApplication => "seller_application",
            Self::PayoutProcessed => "payout_processed",
            Self::System => "system",
        }
    }
}
