// ABOUTME: Integration tests for the sync session lifecycle
// ABOUTME: Login hydration and fetch, unread count bridging, logout reset and disposal
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::{
    counters, create_test_cache, init_test_logging, page_of, settle, wait_until, MockMarketplaceApi,
};
use marketplace_sync::auth::AuthSignal;
use marketplace_sync::cache::{CacheKey, CacheProvider};
use marketplace_sync::config::SyncConfig;
use marketplace_sync::counters::CounterSnapshot;
use marketplace_sync::models::HeaderCounters;
use marketplace_sync::notifications::SessionPhase;
use marketplace_sync::session::SyncSession;
use std::sync::Arc;
use std::time::Duration;

async fn session(api: &Arc<MockMarketplaceApi>, auth: &AuthSignal) -> SyncSession {
    init_test_logging();
    SyncSession::with_cache(
        api.clone(),
        create_test_cache().await,
        SyncConfig::default(),
        auth.clone(),
    )
}

fn scripted_api() -> Arc<MockMarketplaceApi> {
    let api = MockMarketplaceApi::new();
    api.set_counters(counters(1, 2, 5));
    api.set_page(1, false, page_of(&[1, 2, 3, 4, 5], 5, 5));
    api.set_unread(5);
    api
}

fn signed_in(api: &MockMarketplaceApi) -> bool {
    MockMarketplaceApi::count(&api.calls.counters) == 1
        && MockMarketplaceApi::count(&api.calls.list) == 1
}

#[tokio::test]
async fn test_nothing_is_fetched_while_signed_out() -> Result<()> {
    let api = scripted_api();
    let auth = AuthSignal::new(false);
    let session = session(&api, &auth).await;
    settle().await;

    assert!(!session.is_authenticated());
    assert_eq!(MockMarketplaceApi::count(&api.calls.counters), 0);
    assert_eq!(MockMarketplaceApi::count(&api.calls.list), 0);
    assert_eq!(session.store().phase(), SessionPhase::Uninitialized);
    Ok(())
}

#[tokio::test]
async fn test_login_loads_counters_and_first_page() -> Result<()> {
    let api = scripted_api();
    let auth = AuthSignal::new(false);
    let session = session(&api, &auth).await;

    auth.set_authenticated(true);
    wait_until(|| signed_in(&api)).await;
    wait_until(|| session.store().snapshot().items.len() == 5).await;
    wait_until(|| session.counters().counters().cart_item_count == 1).await;

    assert!(session.is_authenticated());
    assert_eq!(session.store().unread_count(), Some(5));
    assert_eq!(
        session.counters().counters(),
        HeaderCounters {
            cart_item_count: 1,
            favorite_count: 2,
            notification_count: 5,
        }
    );
    assert_eq!(session.toasts().baseline(), Some(5));
    Ok(())
}

#[tokio::test]
async fn test_session_created_signed_in_starts_immediately() -> Result<()> {
    let api = scripted_api();
    let auth = AuthSignal::new(true);
    let session = session(&api, &auth).await;

    wait_until(|| signed_in(&api)).await;
    wait_until(|| session.store().unread_count() == Some(5)).await;
    Ok(())
}

#[tokio::test]
async fn test_unread_changes_reach_header_badge_and_toasts() -> Result<()> {
    let api = scripted_api();
    let auth = AuthSignal::new(true);
    let session = session(&api, &auth).await;
    wait_until(|| signed_in(&api)).await;
    wait_until(|| session.toasts().baseline() == Some(5)).await;

    api.set_unread(7);
    session.cache().invalidate(&CacheKey::UnreadCount).await?;
    session.store().refresh_unread_count().await;

    wait_until(|| session.counters().counters().notification_count == 7).await;
    assert_eq!(session.toasts().visible().len(), 1);

    session.on_route_change("/notifications");
    assert!(session.toasts().visible().is_empty());

    assert!(session.store().mark_all_as_read().await);
    wait_until(|| session.counters().counters().notification_count == 0).await;
    Ok(())
}

#[tokio::test]
async fn test_logout_resets_every_component() -> Result<()> {
    let api = scripted_api();
    let auth = AuthSignal::new(true);
    let session = session(&api, &auth).await;
    wait_until(|| signed_in(&api)).await;
    wait_until(|| session.store().snapshot().items.len() == 5).await;
    wait_until(|| session.counters().counters().cart_item_count == 1).await;

    auth.set_authenticated(false);
    wait_until(|| session.store().phase() == SessionPhase::Reset).await;
    wait_until(|| session.counters().counters() == HeaderCounters::default()).await;

    assert!(session.store().snapshot().items.is_empty());
    assert_eq!(session.store().unread_count(), None);
    assert_eq!(session.toasts().baseline(), None);
    assert!(!session.cache().exists(&CacheKey::HeaderCounters).await?);
    assert!(!session.cache().exists(&CacheKey::FIRST_NOTIFICATION_PAGE).await?);

    // Signing in again starts from scratch
    auth.set_authenticated(true);
    wait_until(|| MockMarketplaceApi::count(&api.calls.list) == 2).await;
    wait_until(|| session.store().snapshot().items.len() == 5).await;
    Ok(())
}

#[tokio::test]
async fn test_logout_while_login_requests_are_in_flight() -> Result<()> {
    let api = scripted_api();
    api.hold_requests();
    let auth = AuthSignal::new(false);
    let session = session(&api, &auth).await;

    auth.set_authenticated(true);
    wait_until(|| signed_in(&api)).await;
    assert_eq!(session.store().phase(), SessionPhase::Fetching);

    // Handled right away, not once the parked requests return
    auth.set_authenticated(false);
    wait_until(|| session.store().phase() == SessionPhase::Reset).await;
    assert!(!session.store().snapshot().loading);
    assert_eq!(session.counters().snapshot(), CounterSnapshot::default());
    assert!(session.toasts().visible().is_empty());
    assert_eq!(session.toasts().baseline(), None);

    api.release_requests();
    settle().await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    // The late responses belong to the signed-out user and are discarded
    let state = session.store().snapshot();
    assert_eq!(state.phase, SessionPhase::Reset);
    assert!(state.items.is_empty());
    assert_eq!(session.store().unread_count(), None);
    assert_eq!(session.counters().counters(), HeaderCounters::default());
    assert!(!session.cache().exists(&CacheKey::HeaderCounters).await?);
    assert!(!session.cache().exists(&CacheKey::FIRST_NOTIFICATION_PAGE).await?);
    assert!(!session.cache().exists(&CacheKey::UnreadCount).await?);

    // Signing back in loads from scratch
    auth.set_authenticated(true);
    wait_until(|| MockMarketplaceApi::count(&api.calls.list) == 2).await;
    wait_until(|| session.store().snapshot().items.len() == 5).await;
    wait_until(|| session.counters().counters().cart_item_count == 1).await;
    Ok(())
}

#[tokio::test]
async fn test_disposed_session_ignores_auth_changes() -> Result<()> {
    let api = scripted_api();
    let auth = AuthSignal::new(false);
    let session = session(&api, &auth).await;

    session.dispose();
    auth.set_authenticated(true);
    settle().await;

    assert_eq!(MockMarketplaceApi::count(&api.calls.counters), 0);
    assert_eq!(MockMarketplaceApi::count(&api.calls.list), 0);
    Ok(())
}

#[tokio::test]
async fn test_create_builds_in_memory_session() -> Result<()> {
    init_test_logging();
    let api = scripted_api();
    let auth = AuthSignal::new(false);
    let session = SyncSession::create(api.clone(), SyncConfig::default(), auth).await?;

    session.counters().increment_cart().await?;
    let cached: Option<HeaderCounters> = session.cache().get(&CacheKey::HeaderCounters).await?;
    assert_eq!(cached.map(|c| c.cart_item_count), Some(1));
    Ok(())
}
