//
//  bamboo-client
//  resource/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Resource Model
//!
//! Bamboo entities are exposed through one generic model instead of a
//! struct per entity:
//!
//! - [`descriptor`]: static per-kind metadata (URLs, envelopes, children)
//! - [`accessor`]: generic get/list driven by a descriptor
//! - [`manager`]: collections of a kind, with inherited parameters
//! - [`instance`]: the [`Resource`] wrapper around a raw payload
//! - [`env_vars`]: the HTML-form backend for deployment environment variables
//!
//! ## Navigation
//!
//! ```rust,no_run
//! use bamboo_client::{BambooClient, ClientConfig, Queryable};
//!
//! # async fn example() -> bamboo_client::Result<()> {
//! let client = BambooClient::new(&ClientConfig::from_env()?)?;
//!
//! let project = client
//!     .deployments()
//!     .find_by_name("Web App")
//!     .await?
//!     .expect("deployment project");
//!
//! for env in project.environments()?.all().await? {
//!     for var in env.vars()?.all().await? {
//!         println!("{} = {}", var.str_field("name")?, var.str_field("value")?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod accessor;
pub mod descriptor;
pub mod env_vars;
pub mod instance;
pub mod manager;

pub use accessor::Listing;
pub use descriptor::{Backend, Inherit, Relationship, ResourceDescriptor, ResourceKind};
pub use instance::{Attribute, BackReference, Resource};
pub use manager::{Manager, Queryable};
