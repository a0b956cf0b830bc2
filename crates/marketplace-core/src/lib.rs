// ABOUTME: Core types and constants for the marketplace synchronization layer
// ABOUTME: Foundation crate with error handling, domain models, and tuning constants
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

#![deny(unsafe_code)]

//! # Marketplace Core
//!
//! Foundation crate providing shared types and constants for the marketplace
//! notification and counter synchronization layer. This crate is designed to
//! change infrequently, enabling incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **constants**: TTLs, throttle windows, API paths and route prefixes
//! - **models**: Header counters and notification records

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Core data models (header counters, notifications)
pub mod models;
