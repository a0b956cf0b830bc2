// ABOUTME: Click-through routing for notifications
// ABOUTME: Maps a notification type and payload to a client-side route, or none
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use crate::constants::routes;
use crate::models::{Notification, NotificationType};

/// Route to open when the user clicks `notification`.
///
/// Each type consults a fixed payload field and falls back to its section
/// overview. Unknown types, and system notices without an in-app path, have
/// no destination.
#[must_use]
pub fn notification_url(notification: &Notification) -> Option<String> {
    let kind = notification.kind()?;
    let url = match kind {
        NotificationType::NewMessage => detail_or(notification, "chat_id", routes::CHAT, ""),
        NotificationType::OrderCreated
        | NotificationType::OrderStatusChanged
        | NotificationType::OrderShipped
        | NotificationType::OrderDelivered
        | NotificationType::OrderCancelled => {
            detail_or(notification, "order_id", routes::ORDERS, "")
        }
        NotificationType::NewOrder => {
            detail_or(notification, "order_id", routes::SELLER_ORDERS, "")
        }
        NotificationType::NewReview => match notification.data_id("product_id") {
            Some(id) => format!("{}/{id}#reviews", routes::PRODUCTS),
            None => routes::SELLER_REVIEWS.to_owned(),
        },
        NotificationType::ProductApproved | NotificationType::ProductRejected => {
            detail_or(notification, "product_id", routes::SELLER_PRODUCTS, "")
        }
        NotificationType::LowStock => match notification.data_id("product_id") {
            Some(id) => format!("{}/{id}", routes::SELLER_PRODUCTS),
            None => routes::SELLER_INVENTORY.to_owned(),
        },
        NotificationType::SellerApplication => detail_or(
            notification,
            "application_id",
            routes::ADMIN_SELLERS,
            "/applications",
        ),
        NotificationType::PayoutProcessed => {
            detail_or(notification, "payout_id", routes::SELLER_PAYOUTS, "")
        }
        NotificationType::System => {
            return notification
                .data_str("url")
                .filter(|url| url.starts_with('/') && !url.starts_with("//"))
                .map(str::to_owned);
        }
    };
    Some(url)
}

/// `{base}{detail_segment}/{id}` when the payload carries `field`, else `base`
fn detail_or(notification: &Notification, field: &str, base: &str, detail_segment: &str) -> String {
    notification.data_id(field).map_or_else(
        || base.to_owned(),
        |id| format!("{base}{detail_segment}/{id}"),
    )
}
