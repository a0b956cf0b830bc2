// ABOUTME: Marketplace API connection configuration
// ABOUTME: Base URL, bearer token and HTTP timeouts loaded from the environment
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::env_or;
use marketplace_core::constants::http;
use serde::{Deserialize, Serialize};
use std::env;

/// How to reach the marketplace API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme, host and optional path prefix, e.g. `https://shop.example.com`
    pub base_url: String,
    /// Bearer token for the current session, if already known
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: http::DEFAULT_API_BASE_URL.to_owned(),
            access_token: None,
            request_timeout_secs: http::REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: http::CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Load API configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("MARKETPLACE_API_URL")
                .unwrap_or_else(|_| http::DEFAULT_API_BASE_URL.to_owned()),
            access_token: env::var("MARKETPLACE_API_TOKEN").ok().filter(|t| !t.is_empty()),
            request_timeout_secs: env_or("API_TIMEOUT_SECS", http::REQUEST_TIMEOUT_SECS),
            connect_timeout_secs: env_or("API_CONNECT_TIMEOUT_SECS", http::CONNECT_TIMEOUT_SECS),
        }
    }
}
