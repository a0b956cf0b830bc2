// ABOUTME: reqwest implementation of the marketplace API boundary
// ABOUTME: Bearer-authenticated JSON calls with status classification and strict decoding
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{
    CountersResponse, ListQuery, MarketplaceApi, MutationResponse, NotificationListResponse,
    UnreadCountResponse,
};
use crate::config::ApiConfig;
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::utils::http_client::{create_client_with_timeout, shared_client};
use async_trait::async_trait;
use marketplace_core::constants::{endpoints, http};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

const SERVICE: &str = "marketplace API";

/// Marketplace API over HTTP
pub struct HttpMarketplaceApi {
    client: Client,
    base_url: Url,
    access_token: RwLock<Option<String>>,
}

impl HttpMarketplaceApi {
    /// Build a client for the configured base URL
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `base_url` is not an absolute http(s) URL
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            AppError::config(format!("Invalid marketplace API URL '{}': {e}", config.base_url))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(AppError::config(format!(
                "Marketplace API URL must be http(s), got '{}'",
                base_url.scheme()
            )));
        }

        let uses_default_timeouts = config.request_timeout_secs == http::REQUEST_TIMEOUT_SECS
            && config.connect_timeout_secs == http::CONNECT_TIMEOUT_SECS;
        let client = if uses_default_timeouts {
            shared_client().clone()
        } else {
            create_client_with_timeout(config.request_timeout_secs, config.connect_timeout_secs)
        };

        Ok(Self {
            client,
            base_url,
            access_token: RwLock::new(config.access_token.clone()),
        })
    }

    /// Replace the bearer token (login, refresh, logout)
    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(path));
        match self.access_token.read().await.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and return the body text of a successful response
    async fn execute(&self, builder: RequestBuilder, path: &str) -> AppResult<String> {
        let response = builder.send().await.map_err(|e| {
            warn!(path, error = %e, "Marketplace API request failed to send");
            AppError::unavailable(format!("Failed to reach {SERVICE}: {e}")).with_resource(path)
        })?;

        let status = response.status();
        debug!(path, %status, "Marketplace API response");

        let body = response.text().await.map_err(|e| {
            AppError::external_service(SERVICE, format!("Failed to read response body: {e}"))
                .with_resource(path)
        })?;

        if !status.is_success() {
            return Err(Self::handle_api_error(status, &body, path));
        }
        Ok(body)
    }

    fn handle_api_error(status: reqwest::StatusCode, body: &str, path: &str) -> AppError {
        warn!(
            path,
            %status,
            body_length = body.len(),
            "Marketplace API request failed"
        );
        let code = ErrorCode::from_http_status(status.as_u16());
        AppError::new(code, format!("{SERVICE} returned {status}"))
            .with_resource(path)
            .with_http_status(status.as_u16())
    }

    fn decode<T: DeserializeOwned>(body: &str, path: &str) -> AppResult<T> {
        serde_json::from_str(body).map_err(|e| {
            AppError::serialization(format!("Unexpected {SERVICE} response for {path}: {e}"))
                .with_resource(path)
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let builder = self.request(Method::GET, path).await;
        let body = self.execute(builder, path).await?;
        Self::decode(&body, path)
    }

    /// Mutations may answer with an empty body; that carries no unread count
    async fn mutate(&self, method: Method, path: &str) -> AppResult<MutationResponse> {
        let builder = self.request(method, path).await;
        let body = self.execute(builder, path).await?;
        if body.trim().is_empty() {
            return Ok(MutationResponse::default());
        }
        Self::decode(&body, path)
    }
}

#[async_trait]
impl MarketplaceApi for HttpMarketplaceApi {
    #[instrument(skip(self))]
    async fn fetch_counters(&self) -> AppResult<CountersResponse> {
        self.get_json(endpoints::HEADER_COUNTERS).await
    }

    #[instrument(skip(self))]
    async fn list_notifications(&self, query: ListQuery) -> AppResult<NotificationListResponse> {
        let path = endpoints::NOTIFICATIONS;
        let builder = self.request(Method::GET, path).await.query(&[
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("unread", query.unread_only.to_string()),
        ]);
        let body = self.execute(builder, path).await?;
        Self::decode(&body, path)
    }

    #[instrument(skip(self))]
    async fn unread_count(&self) -> AppResult<UnreadCountResponse> {
        self.get_json(endpoints::UNREAD_COUNT).await
    }

    #[instrument(skip(self))]
    async fn mark_read(&self, id: u64) -> AppResult<MutationResponse> {
        let path = format!("{}/{id}/read", endpoints::NOTIFICATIONS);
        self.mutate(Method::POST, &path).await
    }

    #[instrument(skip(self))]
    async fn mark_all_read(&self) -> AppResult<MutationResponse> {
        self.mutate(Method::POST, endpoints::MARK_ALL_READ).await
    }

    #[instrument(skip(self))]
    async fn delete_notification(&self, id: u64) -> AppResult<MutationResponse> {
        let path = format!("{}/{id}", endpoints::NOTIFICATIONS);
        self.mutate(Method::DELETE, &path).await
    }
}
