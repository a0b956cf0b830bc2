// ABOUTME: Integration tests for the reqwest marketplace API client against a mock server
// ABOUTME: Covers endpoints, query parameters, bearer auth, status mapping and strict decoding
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use anyhow::Result;
use marketplace_sync::api::http::HttpMarketplaceApi;
use marketplace_sync::api::{ListQuery, MarketplaceApi};
use marketplace_sync::config::ApiConfig;
use marketplace_sync::errors::ErrorCode;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, token: Option<&str>) -> HttpMarketplaceApi {
    let config = ApiConfig {
        base_url: server.uri(),
        access_token: token.map(str::to_owned),
        ..ApiConfig::default()
    };
    HttpMarketplaceApi::new(&config).unwrap()
}

#[tokio::test]
async fn test_fetch_counters_sends_bearer_token() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/header/counters"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cart_count": 2,
            "favorites_count": 5,
            "notifications_count": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, Some("session-token"));
    let counters = api.fetch_counters().await?;

    assert_eq!(counters.cart_count, 2);
    assert_eq!(counters.favorites_count, 5);
    assert_eq!(counters.notifications_count, 1);
    Ok(())
}

#[tokio::test]
async fn test_list_notifications_passes_paging_query() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "20"))
        .and(query_param("unread", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "notifications": [{
                "id": 41,
                "user_id": 7,
                "type": "new_order",
                "title": "New order",
                "message": "Order #41 was placed",
                "data": { "order_id": 41 },
                "read": false,
                "created_at": "2025-03-01T10:00:00Z"
            }],
            "unread_count": 3,
            "total": 21
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, None);
    let page = api
        .list_notifications(ListQuery {
            page: 2,
            limit: 20,
            unread_only: true,
        })
        .await?;

    assert_eq!(page.total, 21);
    assert_eq!(page.unread_count, 3);
    assert_eq!(page.notifications.len(), 1);
    assert_eq!(page.notifications[0].notification_type, "new_order");
    assert_eq!(page.notifications[0].data_id("order_id").as_deref(), Some("41"));
    Ok(())
}

#[tokio::test]
async fn test_mutations_hit_expected_routes() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/notifications/9/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unread_count": 4 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/notifications/read-all"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/notifications/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, None);

    assert_eq!(api.mark_read(9).await?.unread_count, Some(4));
    // Empty body: no authoritative count
    assert_eq!(api.mark_all_read().await?.unread_count, None);
    assert_eq!(api.delete_notification(9).await?.unread_count, None);
    Ok(())
}

#[tokio::test]
async fn test_unread_count_endpoint() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/notifications/unread-count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unread_count": 12 })))
        .mount(&server)
        .await;

    let api = client_for(&server, None);
    assert_eq!(api.unread_count().await?.unread_count, 12);
    Ok(())
}

#[tokio::test]
async fn test_failure_status_maps_to_error_code() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(path("/api/header/counters"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
        .mount(&server)
        .await;
    Mock::given(path("/api/notifications/unread-count"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let api = client_for(&server, Some("stale"));

    let error = api.fetch_counters().await.unwrap_err();
    assert_eq!(error.code, ErrorCode::AuthInvalid);
    assert_eq!(error.context.http_status, Some(401));
    assert_eq!(error.context.resource.as_deref(), Some("/api/header/counters"));

    let error = api.unread_count().await.unwrap_err();
    assert_eq!(error.code, ErrorCode::ExternalServiceUnavailable);
    assert!(error.code.is_transient());
    Ok(())
}

#[tokio::test]
async fn test_unexpected_shape_is_a_serialization_error() -> Result<()> {
    let server = MockServer::start().await;
    // A legacy envelope the client does not guess its way through
    Mock::given(path("/api/header/counters"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "cart_count": 1, "favorites_count": 0, "notifications_count": 0 }
        })))
        .mount(&server)
        .await;

    let api = client_for(&server, None);
    let error = api.fetch_counters().await.unwrap_err();

    assert_eq!(error.code, ErrorCode::SerializationError);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_server_is_unavailable() -> Result<()> {
    // Nothing listens on port 1
    let config = ApiConfig {
        base_url: "http://127.0.0.1:1".to_owned(),
        connect_timeout_secs: 1,
        request_timeout_secs: 2,
        ..ApiConfig::default()
    };
    let api = HttpMarketplaceApi::new(&config)?;
    let error = api.fetch_counters().await.unwrap_err();

    assert_eq!(error.code, ErrorCode::ExternalServiceUnavailable);
    Ok(())
}

#[tokio::test]
async fn test_token_can_be_replaced() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(path("/api/notifications/unread-count"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unread_count": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let api = client_for(&server, Some("old"));
    api.set_access_token(Some("fresh".to_owned())).await;

    assert_eq!(api.unread_count().await?.unread_count, 1);
    Ok(())
}

#[test]
fn test_rejects_non_http_base_url() {
    let config = ApiConfig {
        base_url: "ftp://marketplace.example".to_owned(),
        ..ApiConfig::default()
    };
    let error = HttpMarketplaceApi::new(&config).err().unwrap();
    assert_eq!(error.code, ErrorCode::ConfigError);

    let config = ApiConfig {
        base_url: "not a url".to_owned(),
        ..ApiConfig::default()
    };
    assert!(HttpMarketplaceApi::new(&config).is_err());
}
