//
//  bamboo-client
//  api/common/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Common API Types for the Bamboo REST and Form Surfaces
//!
//! This module provides the shared error type and the request parameter and
//! filtering types used by every resource kind.
//!
//! # Overview
//!
//! - [`BambooError`] - Unified error type for all client operations
//! - [`Result`] - Crate-wide result alias
//! - [`Params`] - Named URL template parameters
//! - Filtering types (re-exported from [`filter`] submodule)
//!
//! # Example
//!
//! ```rust
//! use bamboo_client::api::common::BambooError;
//!
//! fn describe(result: Result<(), BambooError>) {
//!     match result {
//!         Ok(()) => println!("Success!"),
//!         Err(BambooError::MissingArgument(names)) => println!("Missing: {:?}", names),
//!         Err(BambooError::Authentication(reason)) => println!("Bad credentials: {}", reason),
//!         Err(e) => println!("Error: {}", e),
//!     }
//! }
//! ```

use std::collections::BTreeMap;

use thiserror::Error;

mod filter;

pub use filter::*;

/// Named parameters used to fill URL templates such as `/result/{plan_key}.json`.
///
/// A `BTreeMap` keeps iteration deterministic, which keeps log lines and
/// missing-argument reports stable.
pub type Params = BTreeMap<String, String>;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BambooError>;

/// Unified error type for all Bamboo client operations.
///
/// The operation variants (`List`, `Get`, `Create`, `Update`, `Delete`,
/// `Cancel`, `Retry`) carry the server's message when a request reached the
/// server but was refused. Transport failures are never retried and surface
/// as [`BambooError::Connection`] or [`BambooError::Http`].
///
/// # Variants
///
/// | Variant | Raised when |
/// |---------|-------------|
/// | `Authentication` | The server answered 401 to a JSON request |
/// | `Connection` | Connect or timeout failure below HTTP |
/// | `List` .. `Retry` | Server refused the named operation |
/// | `MissingArgument` | Required URL parameters were not supplied |
/// | `Decode` | Response body did not have the expected shape |
/// | `AttributeNotFound` | Unknown attribute on a resource |
/// | `Unsupported` | The kind does not support the requested verb or filter |
/// | `Http` | Any other `reqwest` failure |
/// | `Json` | Body was not valid JSON |
/// | `InvalidConfig` | Client configuration could not be used |
/// | `Cancelled` | A poll loop observed its cancel token |
/// | `DeadlineExceeded` | A poll loop ran past its deadline |
#[derive(Error, Debug)]
pub enum BambooError {
    /// The server rejected the supplied credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The server could not be reached (connect failure or request timeout).
    #[error("Connection error: {0}")]
    Connection(#[source] reqwest::Error),

    /// A collection fetch was refused by the server.
    #[error("List failed: {0}")]
    List(String),

    /// A single-resource fetch was refused by the server.
    #[error("Get failed: {0}")]
    Get(String),

    /// A create request was refused by the server.
    #[error("Create failed: {0}")]
    Create(String),

    /// An update request was refused by the server.
    #[error("Update failed: {0}")]
    Update(String),

    /// A delete request was refused by the server.
    #[error("Delete failed: {0}")]
    Delete(String),

    /// A cancel request was refused by the server.
    #[error("Cancel failed: {0}")]
    Cancel(String),

    /// A retry request was refused by the server.
    #[error("Retry failed: {0}")]
    Retry(String),

    /// Required URL parameters were absent. Raised before any request is sent.
    ///
    /// # Parameters
    ///
    /// - `0` - The missing parameter names, in declaration order
    #[error("missing arguments {0:?}")]
    MissingArgument(Vec<String>),

    /// The response body did not have the expected structure.
    #[error("Unexpected response shape: {0}")]
    Decode(String),

    /// The named attribute is neither a child collection, a back reference,
    /// nor a payload field.
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// The resource kind does not support the requested operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Any other HTTP-layer failure.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// The response body was not valid JSON.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The client configuration is unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A poll loop was cancelled through its [`CancelToken`](crate::jobs::CancelToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// A poll loop ran past its configured deadline.
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(std::time::Duration),
}

impl From<reqwest::Error> for BambooError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            Self::Connection(err)
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err)
        }
    }
}

/// Builds a [`Params`] map from borrowed pairs.
///
/// # Example
///
/// ```rust
/// use bamboo_client::api::common::params;
///
/// let p = params(&[("plan_key", "PROJ-PLAN"), ("build_number", "42")]);
/// assert_eq!(p["build_number"], "42");
/// ```
pub fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
