//
//  bamboo-client
//  auth/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Authentication Module
//!
//! Bamboo accepts HTTP Basic authentication on both its REST API and its
//! legacy form endpoints. The header is assembled once when the client is
//! built and attached to every request as a default header.
//!
//! ## Example
//!
//! ```rust
//! use bamboo_client::auth::BasicCredentials;
//!
//! let creds = BasicCredentials::from_parts(Some("admin"), Some("admin")).unwrap();
//! let header = creds.header_value().unwrap();
//! assert!(header.is_sensitive());
//!
//! // Either half missing means no authentication at all
//! assert!(BasicCredentials::from_parts(Some("admin"), None).is_none());
//! ```

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::header::HeaderValue;

use crate::api::common::{BambooError, Result};

/// Username and password for HTTP Basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    /// The Bamboo username.
    pub username: String,
    password: String,
}

impl BasicCredentials {
    /// Creates credentials from explicit values.
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Creates credentials only when both parts are present and non-empty.
    pub fn from_parts(username: Option<&str>, password: Option<&str>) -> Option<Self> {
        match (username, password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some(Self::new(user, pass))
            }
            _ => None,
        }
    }

    /// Builds the `Authorization: Basic ...` header value.
    ///
    /// The value is flagged sensitive so `reqwest` and `http` keep it out of
    /// debug output.
    ///
    /// # Errors
    ///
    /// Returns [`BambooError::InvalidConfig`] if the encoded value is not a
    /// valid header (never the case for base64 output, but the conversion is
    /// fallible).
    pub fn header_value(&self) -> Result<HeaderValue> {
        let encoded = STANDARD.encode(format!("{}:{}", self.username, self.password));
        let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|e| BambooError::InvalidConfig(format!("invalid credentials: {e}")))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
