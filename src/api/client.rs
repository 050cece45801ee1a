//
//  bamboo-client
//  api/client.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # HTTP Transport for the Bamboo Server
//!
//! This module provides the HTTP client every resource operation goes
//! through. It talks to two surfaces of the same server:
//!
//! - the JSON REST API below `/rest/api/latest`
//! - the legacy HTML/form endpoints below the server root
//!
//! ## Features
//!
//! - Basic authentication installed once as a default header
//! - Per-request timeout and TLS verification policy from [`ClientConfig`]
//! - Connection reuse through one shared `reqwest::Client`
//! - Error mapping from Bamboo's JSON error envelopes
//!
//! No request is ever retried; transport failures propagate unchanged.

use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

use crate::api::common::{BambooError, Result};
use crate::auth::BasicCredentials;
use crate::config::{normalize_base_url, ClientConfig};
use crate::resource::{Manager, ResourceKind};

const JSON: &str = "application/json";

/// Extracts a readable message from a Bamboo error response body.
///
/// Bamboo's REST API reports errors in one of two shapes:
/// ```json
/// {"message": "Plan PROJ-X not found", "status-code": 404}
/// {"errors": ["Reason one"], "fieldErrors": {}}
/// ```
///
/// If neither shape is present the status and raw body are returned.
pub fn format_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(message) = json.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }

        if let Some(message) = json
            .get("errors")
            .and_then(|e| e.as_array())
            .and_then(|arr| arr.first())
            .and_then(|m| m.as_str())
        {
            return message.to_string();
        }
    }

    format!("API error ({}): {}", status, body)
}

/// Which side of the server a path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// JSON REST API, `<root>/rest/api/latest`.
    Rest,
    /// Legacy HTML pages and form actions, `<root>`.
    Legacy,
}

/// The verb a request belongs to, used to pick the error variant when the
/// server refuses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
    Cancel,
    Retry,
}

impl Operation {
    /// Wraps a server message in the matching [`BambooError`] variant.
    pub fn error(self, message: String) -> BambooError {
        match self {
            Self::List => BambooError::List(message),
            Self::Get => BambooError::Get(message),
            Self::Create => BambooError::Create(message),
            Self::Update => BambooError::Update(message),
            Self::Delete => BambooError::Delete(message),
            Self::Cancel => BambooError::Cancel(message),
            Self::Retry => BambooError::Retry(message),
        }
    }
}

/// The HTTP client for one Bamboo server.
///
/// Cloning is cheap and shares the underlying connection pool. Independent
/// pollers should each hold their own clone.
///
/// # Example
///
/// ```rust,no_run
/// use bamboo_client::{BambooClient, ClientConfig};
///
/// # async fn example() -> bamboo_client::Result<()> {
/// let client = BambooClient::new(
///     &ClientConfig::new("https://bamboo.example.com").with_credentials("bot", "secret"),
/// )?;
///
/// for project in client.projects().all().await? {
///     println!("{}", project.str_field("name")?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BambooClient {
    /// The underlying HTTP client
    http: Client,
    /// Server root, e.g. `https://bamboo.example.com`
    root_url: String,
    /// REST root, e.g. `https://bamboo.example.com/rest/api/latest`
    rest_url: String,
    /// Whether a Basic auth header is attached to requests
    authenticated: bool,
}

impl BambooClient {
    /// Creates a client from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BambooError::InvalidConfig`] for an unusable base URL and
    /// [`BambooError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        let credentials =
            BasicCredentials::from_parts(config.username.as_deref(), config.password.as_deref());
        if let Some(credentials) = &credentials {
            headers.insert(AUTHORIZATION, credentials.header_value()?);
        }

        let mut builder = Client::builder()
            .user_agent(format!("bamboo-client/{}", crate::VERSION))
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.verify_tls);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let root_url = normalize_base_url(&config.base_url);
        Ok(Self {
            http: builder.build().map_err(BambooError::Http)?,
            rest_url: format!("{}{}", root_url, crate::config::REST_PREFIX),
            root_url,
            authenticated: credentials.is_some(),
        })
    }

    /// Server root URL.
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// REST API root URL.
    pub fn rest_url(&self) -> &str {
        &self.rest_url
    }

    /// Returns `true` when requests carry Basic auth.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Resolves `path` against a surface. Absolute `http(s)://` paths are
    /// used as given.
    pub fn url(&self, surface: Surface, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        match surface {
            Surface::Rest => format!("{}{}", self.rest_url, path),
            Surface::Legacy => format!("{}{}", self.root_url, path),
        }
    }

    /// Root manager for build projects.
    pub fn projects(&self) -> Manager {
        Manager::root(self.clone(), ResourceKind::Project)
    }

    /// Root manager for build plans.
    pub fn plans(&self) -> Manager {
        Manager::root(self.clone(), ResourceKind::Plan)
    }

    /// Root manager for deployment projects.
    pub fn deployments(&self) -> Manager {
        Manager::root(self.clone(), ResourceKind::DeploymentProject)
    }

    /// GETs a REST path with JSON content negotiation and decodes the body.
    ///
    /// # Errors
    ///
    /// - [`BambooError::Authentication`] on 401
    /// - the `operation` variant of [`BambooError`] on any other non-2xx
    /// - [`BambooError::Json`] if the body is not JSON
    /// - transport errors unchanged
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
        operation: Operation,
    ) -> Result<Value> {
        let url = self.url(Surface::Rest, path);
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .query(query)
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let text = response.text().await.unwrap_or_default();
            return Err(BambooError::Authentication(format_api_error(status, &text)));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(operation.error(format_api_error(status, &text)));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// GETs a path and returns the raw response, whatever its status.
    ///
    /// Used for the legacy HTML pages, where the caller decides how to treat
    /// failures.
    pub async fn get_raw(
        &self,
        surface: Surface,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Response> {
        let url = self.url(surface, path);
        tracing::debug!("GET {}", url);

        Ok(self.http.get(&url).query(query).send().await?)
    }

    /// POSTs to a path and returns the raw response, whatever its status.
    ///
    /// `form` fields are sent form-encoded. When `json` is set the request
    /// advertises `application/json` for both content type and accept, as
    /// Bamboo's queue endpoints expect.
    pub async fn post_raw(
        &self,
        surface: Surface,
        path: &str,
        query: &[(String, String)],
        form: Option<&[(String, String)]>,
        json: bool,
    ) -> Result<Response> {
        let url = self.url(surface, path);
        tracing::debug!("POST {}", url);

        let mut request = self.http.post(&url).query(query);
        if json {
            request = request
                .header(ACCEPT, JSON)
                .header(CONTENT_TYPE, JSON);
        }
        if let Some(fields) = form {
            request = request.form(fields);
        }

        Ok(request.send().await?)
    }
}

impl std::fmt::Debug for BambooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BambooClient")
            .field("root_url", &self.root_url)
            .field("authenticated", &self.authenticated)
            .finish()
    }
}
