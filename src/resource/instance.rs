//
//  bamboo-client
//  resource/instance.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Materialized server entities.
//!
//! A [`Resource`] wraps the raw JSON object Bamboo returned for one entity.
//! Instead of one struct per entity, every kind shares this type and the
//! kind's [`ResourceDescriptor`](super::ResourceDescriptor) decides which
//! child collections it exposes.
//!
//! # Attribute Resolution
//!
//! [`Resource::attr`] resolves a name in this order:
//!
//! 1. a child relationship of the kind (yields a bound [`Manager`])
//! 2. the back reference set by the manager that produced the resource
//! 3. a field of the raw payload
//!
//! Anything else is [`BambooError::AttributeNotFound`].
//!
//! # Example
//!
//! ```rust,no_run
//! use bamboo_client::{Attribute, BambooClient, ClientConfig, Filter};
//!
//! # async fn example() -> bamboo_client::Result<()> {
//! let client = BambooClient::new(&ClientConfig::new("https://bamboo.example.com"))?;
//! let project = client.deployments().fetch("42").await?;
//!
//! if let Attribute::Manager(environments) = project.attr("environments")? {
//!     for env in environments.all().await? {
//!         println!("{}", env.str_field("name")?);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{Manager, ResourceKind};
use crate::api::common::{BambooError, Params, Result};
use crate::api::BambooClient;
use crate::util::value_to_string;

/// Link from a child resource to the resource whose manager produced it.
#[derive(Clone)]
pub struct BackReference {
    /// Attribute name of the link (e.g. `"environment"`).
    pub name: &'static str,
    /// The owning resource.
    pub resource: Arc<Resource>,
}

/// Result of resolving an attribute name on a [`Resource`].
#[derive(Debug)]
pub enum Attribute<'a> {
    /// A child collection, bound to the resource.
    Manager(Manager),
    /// The owning resource this one was listed from.
    Parent(&'a Resource),
    /// A raw payload field.
    Value(&'a Value),
}

/// One server entity: its kind, raw payload, the parameters it was fetched
/// with, and an optional back reference to its owner.
///
/// Instances are created fresh by every fetch. Mutating calls issued through
/// a resource never change the resource itself; fetch again to observe the
/// server's new state.
#[derive(Clone)]
pub struct Resource {
    client: BambooClient,
    kind: ResourceKind,
    data: Map<String, Value>,
    scope: Params,
    parent: Option<BackReference>,
}

impl Resource {
    /// Wraps a raw payload.
    ///
    /// # Errors
    ///
    /// Returns [`BambooError::Decode`] if `data` is not a JSON object.
    pub fn new(client: BambooClient, kind: ResourceKind, data: Value, scope: Params) -> Result<Self> {
        match data {
            Value::Object(data) => Ok(Self {
                client,
                kind,
                data,
                scope,
                parent: None,
            }),
            other => Err(BambooError::Decode(format!(
                "expected a JSON object for {kind}, got {other}"
            ))),
        }
    }

    /// The kind of entity.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The raw payload as returned by the server.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.data
    }

    /// The URL parameters this resource was fetched with.
    pub fn scope(&self) -> &Params {
        &self.scope
    }

    /// The client this resource was fetched through.
    pub fn client(&self) -> &BambooClient {
        &self.client
    }

    /// Resolves an attribute: child manager, then back reference, then
    /// payload field.
    pub fn attr(&self, name: &str) -> Result<Attribute<'_>> {
        if self.kind.descriptor().child(name).is_some() {
            return self.manager(name).map(Attribute::Manager);
        }
        if let Some(parent) = self.parent.as_ref().filter(|p| p.name == name) {
            return Ok(Attribute::Parent(&parent.resource));
        }
        self.field(name).map(Attribute::Value)
    }

    /// A raw payload field.
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.data
            .get(name)
            .ok_or_else(|| BambooError::AttributeNotFound(format!("{} has no field '{name}'", self.kind)))
    }

    /// A payload field rendered as a string. Numbers and booleans are
    /// converted; `null` counts as absent.
    pub fn str_field(&self, name: &str) -> Result<String> {
        value_to_string(self.field(name)?)
            .ok_or_else(|| BambooError::AttributeNotFound(format!("{} field '{name}' is null", self.kind)))
    }

    /// The `id` field as a string.
    pub fn id(&self) -> Result<String> {
        self.str_field("id")
    }

    /// A child manager bound to this resource.
    ///
    /// # Errors
    ///
    /// Returns [`BambooError::AttributeNotFound`] if the kind has no child
    /// relationship called `name`.
    pub fn manager(&self, name: &str) -> Result<Manager> {
        let relationship = self.kind.descriptor().child(name).ok_or_else(|| {
            BambooError::AttributeNotFound(format!("{} has no collection '{name}'", self.kind))
        })?;
        Ok(Manager::bound(
            self.client.clone(),
            Arc::new(self.clone()),
            relationship,
        ))
    }

    /// The owning resource, if this one was produced by a bound manager.
    pub fn parent(&self) -> Option<&Resource> {
        self.parent.as_ref().map(|p| p.resource.as_ref())
    }

    /// The back reference, with its attribute name.
    pub fn back_reference(&self) -> Option<&BackReference> {
        self.parent.as_ref()
    }

    pub(crate) fn set_parent(&mut self, name: &'static str, resource: Arc<Resource>) {
        self.parent = Some(BackReference { name, resource });
    }

    /// Plan builds / deployment results.
    pub fn results(&self) -> Result<Manager> {
        self.manager("results")
    }

    /// Environments of a deployment project.
    pub fn environments(&self) -> Result<Manager> {
        self.manager("environments")
    }

    /// Versions of a deployment project.
    pub fn versions(&self) -> Result<Manager> {
        self.manager("versions")
    }

    /// Variables of a deployment environment.
    pub fn vars(&self) -> Result<Manager> {
        self.manager("vars")
    }

    pub(crate) fn ensure_kind(&self, expected: ResourceKind, operation: &str) -> Result<()> {
        if self.kind == expected {
            Ok(())
        } else {
            Err(BambooError::Unsupported(format!(
                "{operation} is only available on a {expected}, not a {}",
                self.kind
            )))
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("kind", &self.kind)
            .field("data", &self.data)
            .field("parent", &self.parent.as_ref().map(|p| p.name))
            .finish()
    }
}

impl fmt::Debug for BackReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackReference")
            .field("name", &self.name)
            .field("kind", &self.resource.kind)
            .finish()
    }
}
