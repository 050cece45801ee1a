//
//  bamboo-client
//  lib.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Bamboo Client Library
//!
//! An async client for the Atlassian Bamboo CI/CD server.
//!
//! ## Overview
//!
//! Bamboo entities (projects, plans, build results, deployment projects,
//! environments, versions, deployment results and environment variables)
//! are exposed through one generic resource model driven by static
//! per-kind descriptors, rather than one hand-written type per entity.
//!
//! ## Features
//!
//! - **Navigation**: root managers on the client, child managers on resources
//!   that inherit their URL parameters from the owner
//! - **Filtering**: client-side substring or exact matching, optionally
//!   stopping at the first match
//! - **Environment Variables**: read and written through Bamboo's legacy
//!   configuration forms, since the REST API does not expose them
//! - **Builds & Deployments**: queue a job and poll until it finishes, with a
//!   configurable interval, deadline and cancellation
//!
//! ## Module Structure
//!
//! - [`api`]: HTTP client, errors, parameters and filters
//! - [`auth`]: Basic authentication credentials
//! - [`config`]: Client configuration
//! - [`resource`]: Descriptors, managers and resources
//! - [`jobs`]: Build and deployment triggering and polling
//! - [`util`]: URL templates and text helpers
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use bamboo_client::{BambooClient, ClientConfig, Params, PollOptions, Queryable};
//!
//! # async fn example() -> bamboo_client::Result<()> {
//! let client = BambooClient::new(&ClientConfig::from_env()?)?;
//!
//! let project = client.deployments().find_by_name("Web App").await?.expect("project");
//! let env = project.environments()?.find_by_name("Production").await?.expect("environment");
//! let version = project.versions()?.find_by_name("release-42").await?.expect("version");
//!
//! let mut variables = Params::new();
//! variables.insert("FEATURE_FLAGS".to_string(), "beta".to_string());
//!
//! let report = env.deploy(&version, &variables, &PollOptions::default()).await?;
//! println!("{}", report.message);
//! # Ok(())
//! # }
//! ```
//!
//! ## Logging
//!
//! The crate emits `tracing` events and never installs a subscriber.

/// API client and shared types.
///
/// The client handles URL resolution, authentication and status mapping for
/// both the REST surface and the legacy form surface.
pub mod api;

/// Basic authentication credentials.
pub mod auth;

/// Client configuration.
///
/// Built programmatically or from `BAMBOO_*` environment variables.
pub mod config;

/// Build and deployment jobs.
pub mod jobs;

/// Generic resource model.
pub mod resource;

/// Utility functions and helpers.
///
/// URL template filling, JSON value rendering and HTML entity decoding.
pub mod util;

pub use api::common::{Filter, FilterOptions, FilterValue, Params};
pub use api::{BambooClient, BambooError, Result};
pub use config::ClientConfig;
pub use jobs::{CancelToken, JobOutcome, JobReport, JobState, PollOptions};
pub use resource::{Attribute, Listing, Manager, Queryable, Resource, ResourceKind};

/// Library version, derived from Cargo.toml at compile time.
///
/// Sent in the `User-Agent` header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
