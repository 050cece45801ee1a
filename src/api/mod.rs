//
//  bamboo-client
//  api/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # API Client Layer
//!
//! This module provides the HTTP client for Bamboo's two surfaces.
//!
//! ## Surfaces
//!
//! - **REST**: JSON API under `/rest/api/latest`
//! - **Legacy**: HTML pages and form actions relative to the server root,
//!   used only for deployment environment variables
//!
//! ## Architecture
//!
//! - [`client`]: Core HTTP client with authentication and request handling
//! - [`common`]: Shared types (errors, parameters, filters)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bamboo_client::api::BambooClient;
//! use bamboo_client::config::ClientConfig;
//!
//! let config = ClientConfig::new("https://bamboo.example.com")
//!     .with_credentials("ci-bot", "secret");
//! let client = BambooClient::new(&config).expect("Failed to create client");
//! ```
//!
//! ## Error Handling
//!
//! Failures are returned as [`BambooError`] variants:
//!
//! - `Authentication`: 401 Unauthorized
//! - `Get` / `List`: any other non-2xx on a read, with the server's message
//! - `Connection`: the server could not be reached or timed out
//! - `Decode`: the response did not have the expected shape

/// Core HTTP client wrapper for Bamboo.
///
/// Provides the [`BambooClient`] struct which handles:
/// - URL resolution for both surfaces
/// - Basic authentication header injection
/// - Response status mapping
pub mod client;

/// Common types shared by every resource kind.
///
/// Includes:
/// - [`BambooError`]: Error type for all client operations
/// - [`Params`](common::Params): URL template parameters
/// - [`Filter`](common::Filter): client-side list filtering
pub mod common;

/// Re-export of the main Bamboo API client.
pub use client::BambooClient;

/// Re-export of the error type and result alias.
pub use common::{BambooError, Result};
