//
//  bamboo-client
//  config/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Configuration Module
//!
//! Connection settings for a Bamboo server. The crate has no configuration
//! file of its own; [`ClientConfig`] derives `serde` traits so applications
//! can embed it in whatever format they already use, and
//! [`ClientConfig::from_env`] covers the common CI case.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `BAMBOO_URL` | `base_url` | required |
//! | `BAMBOO_USERNAME` | `username` | unset |
//! | `BAMBOO_PASSWORD` | `password` | unset |
//! | `BAMBOO_VERIFY_TLS` | `verify_tls` | `true` |
//! | `BAMBOO_TIMEOUT_SECS` | `timeout_secs` | unset (no timeout) |
//!
//! ## Usage
//!
//! ```rust
//! use bamboo_client::config::ClientConfig;
//!
//! let config = ClientConfig::new("https://bamboo.example.com/")
//!     .with_credentials("ci-bot", "secret")
//!     .with_timeout(30);
//!
//! assert_eq!(config.base_url, "https://bamboo.example.com");
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::common::{BambooError, Result};

/// Path of the JSON REST API below the server root.
pub const REST_PREFIX: &str = "/rest/api/latest";

/// Connection settings for one Bamboo server.
///
/// # Fields
///
/// * `base_url` - Server root URL, without the REST prefix
/// * `username` / `password` - Basic auth credentials; both must be set for
///   authentication to be sent
/// * `verify_tls` - Whether TLS certificates are verified
/// * `timeout_secs` - Per-request timeout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server root URL (e.g. `https://bamboo.example.com`).
    pub base_url: String,

    /// Basic auth username.
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// Verify the server's TLS certificate.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Per-request timeout in seconds. `None` disables the timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// TLS verification is on unless explicitly disabled.
fn default_verify_tls() -> bool {
    true
}

impl ClientConfig {
    /// Creates a configuration for `base_url` with no credentials,
    /// TLS verification on, and no request timeout.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            username: None,
            password: None,
            verify_tls: default_verify_tls(),
            timeout_secs: None,
        }
    }

    /// Reads the configuration from `BAMBOO_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`BambooError::InvalidConfig`] if `BAMBOO_URL` is unset or a
    /// boolean/numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("BAMBOO_URL")
            .map_err(|_| BambooError::InvalidConfig("BAMBOO_URL is not set".to_string()))?;

        let mut config = Self::new(&base_url);
        config.username = std::env::var("BAMBOO_USERNAME").ok();
        config.password = std::env::var("BAMBOO_PASSWORD").ok();

        if let Ok(raw) = std::env::var("BAMBOO_VERIFY_TLS") {
            config.verify_tls = parse_bool(&raw).ok_or_else(|| {
                BambooError::InvalidConfig(format!("BAMBOO_VERIFY_TLS is not a boolean: {raw}"))
            })?;
        }

        if let Ok(raw) = std::env::var("BAMBOO_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                BambooError::InvalidConfig(format!("BAMBOO_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.timeout_secs = Some(secs);
        }

        Ok(config)
    }

    /// Sets Basic auth credentials.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    /// Enables or disables TLS certificate verification.
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Sets the per-request timeout in seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Per-request timeout as a [`Duration`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Root of the JSON REST API.
    pub fn rest_url(&self) -> String {
        format!("{}{}", self.base_url, REST_PREFIX)
    }

    /// Checks that `base_url` is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| BambooError::InvalidConfig(format!("invalid base URL {}: {e}", self.base_url)))?;

        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(BambooError::InvalidConfig(format!(
                "unsupported URL scheme '{other}' in {}",
                self.base_url
            ))),
        }
    }
}

/// Trims whitespace and trailing slashes so paths can be appended directly.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_url() {
        let config = ClientConfig::new("  https://bamboo.example.com//  ");
        assert_eq!(config.base_url, "https://bamboo.example.com");
        assert_eq!(config.rest_url(), "https://bamboo.example.com/rest/api/latest");
        assert!(config.verify_tls);
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        assert!(ClientConfig::new("ftp://bamboo").validate().is_err());
        assert!(ClientConfig::new("not a url").validate().is_err());
        assert!(ClientConfig::new("http://localhost:8085").validate().is_ok());
    }

    #[test]
    fn test_deserialize_defaults() -> anyhow::Result<()> {
        let config: ClientConfig = serde_json::from_str(r#"{"base_url": "https://bamboo.example.com"}"#)?;
        assert!(config.verify_tls);
        assert!(config.username.is_none());
        assert!(config.timeout().is_none());
        config.validate()?;
        Ok(())
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
