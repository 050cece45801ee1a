//
//  bamboo-client
//  resource/manager.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Managers: collections of one resource kind, optionally scoped to an
//! owning resource.
//!
//! A root manager (`client.plans()`) lists server-wide collections. A bound
//! manager (`environment.vars()`) inherits URL parameters from its owner,
//! so `environment.vars()?.all()` needs no explicit environment id, and
//! every resource it returns carries a back reference to that owner.
//!
//! # Lookups
//!
//! The [`Queryable`] capability provides `find_by(field, value)` for the
//! fields each kind declares in its descriptor, equivalent to a `first` +
//! `exact` filtered list.
//!
//! ```rust,no_run
//! use bamboo_client::{BambooClient, ClientConfig, Queryable};
//!
//! # async fn example() -> bamboo_client::Result<()> {
//! let client = BambooClient::new(&ClientConfig::new("https://bamboo.example.com"))?;
//! if let Some(plan) = client.plans().find_by_key("APP-BUILD").await? {
//!     println!("{}", plan.str_field("name")?);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use super::descriptor::{Backend, Inherit, Relationship};
use super::{accessor, env_vars, Listing, Resource, ResourceKind};
use crate::api::common::{BambooError, Filter, Params, Result};
use crate::api::BambooClient;

/// A collection of one resource kind, optionally bound to an owner.
#[derive(Clone, Debug)]
pub struct Manager {
    client: BambooClient,
    kind: ResourceKind,
    owner: Option<Arc<Resource>>,
    inherit: &'static [Inherit],
    back_reference: Option<&'static str>,
}

impl Manager {
    /// A server-wide manager with no owner.
    pub(crate) fn root(client: BambooClient, kind: ResourceKind) -> Self {
        Self {
            client,
            kind,
            owner: None,
            inherit: &[],
            back_reference: None,
        }
    }

    /// A manager for `relationship`, scoped to `owner`.
    pub(crate) fn bound(client: BambooClient, owner: Arc<Resource>, relationship: &'static Relationship) -> Self {
        Self {
            client,
            kind: relationship.kind,
            owner: Some(owner),
            inherit: relationship.inherit,
            back_reference: Some(relationship.back_reference),
        }
    }

    /// The kind of resource this manager returns.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The owning resource of a bound manager.
    pub fn owner(&self) -> Option<&Resource> {
        self.owner.as_deref()
    }

    /// Merges parameters inherited from the owner into `explicit`.
    ///
    /// Explicit parameters win; inherited values only fill gaps. An owner
    /// without the inherited field leaves the gap for validation to report.
    pub fn resolve_params(&self, mut explicit: Params) -> Params {
        if let Some(owner) = &self.owner {
            for rule in self.inherit {
                if explicit.contains_key(rule.child_param) {
                    continue;
                }
                if let Ok(value) = owner.str_field(rule.parent_field) {
                    explicit.insert(rule.child_param.to_string(), value);
                }
            }
        }
        explicit
    }

    /// Fetches one resource by id with extra URL parameters.
    pub async fn get(&self, id: Option<&str>, params: Params) -> Result<Resource> {
        let params = self.resolve_params(params);
        let mut resource = accessor::get(&self.client, self.kind, id, params).await?;
        self.link(&mut resource);
        Ok(resource)
    }

    /// Fetches one resource by id.
    pub async fn fetch(&self, id: &str) -> Result<Resource> {
        self.get(Some(id), Params::new()).await
    }

    /// Lists the collection through `filter`, with extra URL parameters.
    pub async fn list(&self, filter: &Filter, params: Params) -> Result<Listing> {
        let params = self.resolve_params(params);
        let mut listing = accessor::list(&self.client, self.kind, filter, params).await?;
        listing.for_each_mut(|resource| self.link(resource));
        Ok(listing)
    }

    /// Lists the whole collection.
    pub async fn all(&self) -> Result<Vec<Resource>> {
        Ok(self.list(&Filter::new(), Params::new()).await?.into_vec())
    }

    /// The first item of the unfiltered collection. For result collections
    /// this is the most recent run.
    pub async fn latest(&self) -> Result<Option<Resource>> {
        Ok(self.list(&Filter::new().first(), Params::new()).await?.into_first())
    }

    /// Creates an environment variable.
    ///
    /// Returns `true` iff the server answered 200.
    pub async fn add(&self, name: &str, value: &str) -> Result<bool> {
        let environment_id = self.form_environment_id("add")?;
        env_vars::add(&self.client, &environment_id, name, value).await
    }

    /// Creates a resource from `fields`.
    ///
    /// Only environment variables support creation; `fields` must contain
    /// `name` and `value`.
    pub async fn create(&self, fields: &Params) -> Result<bool> {
        let environment_id = self.form_environment_id("create")?;
        let (name, value) = name_and_value(fields)?;
        env_vars::add(&self.client, &environment_id, name, value).await
    }

    /// Updates the resource with id `id` from `fields`.
    ///
    /// Only environment variables support updates; `fields` must contain
    /// `name` and `value`.
    pub async fn update(&self, id: &str, fields: &Params) -> Result<bool> {
        let environment_id = self.form_environment_id("update")?;
        let (name, value) = name_and_value(fields)?;
        env_vars::update(&self.client, &environment_id, id, name, value).await
    }

    /// Deletes the resource with id `id`.
    ///
    /// Only environment variables support deletion.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let environment_id = self.form_environment_id("delete")?;
        env_vars::delete(&self.client, &environment_id, id).await
    }

    fn link(&self, resource: &mut Resource) {
        if let (Some(owner), Some(name)) = (&self.owner, self.back_reference) {
            resource.set_parent(name, Arc::clone(owner));
        }
    }

    fn form_environment_id(&self, operation: &str) -> Result<String> {
        if self.kind.descriptor().backend != Backend::EnvironmentVariableForm {
            return Err(BambooError::Unsupported(format!(
                "{operation} is not supported for a {}",
                self.kind
            )));
        }
        let params = self.resolve_params(Params::new());
        params
            .get("deployment_project_env_id")
            .cloned()
            .ok_or_else(|| BambooError::MissingArgument(vec!["deployment_project_env_id".to_string()]))
    }
}

fn name_and_value(fields: &Params) -> Result<(&str, &str)> {
    let missing: Vec<String> = ["name", "value"]
        .iter()
        .filter(|k| !fields.contains_key(**k))
        .map(|k| k.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(BambooError::MissingArgument(missing));
    }
    Ok((fields["name"].as_str(), fields["value"].as_str()))
}

/// Field lookups restricted to a per-kind allowlist.
#[async_trait]
pub trait Queryable: Send + Sync {
    /// Fields that may be used with [`find_by`](Self::find_by).
    fn finders(&self) -> &'static [&'static str];

    /// The first item whose `field` equals `value` exactly.
    async fn find_by(&self, field: &str, value: &str) -> Result<Option<Resource>>;

    /// Lookup by `name`.
    async fn find_by_name(&self, name: &str) -> Result<Option<Resource>> {
        self.find_by("name", name).await
    }

    /// Lookup by `key`.
    async fn find_by_key(&self, key: &str) -> Result<Option<Resource>> {
        self.find_by("key", key).await
    }
}

#[async_trait]
impl Queryable for Manager {
    fn finders(&self) -> &'static [&'static str] {
        self.kind.descriptor().finders
    }

    async fn find_by(&self, field: &str, value: &str) -> Result<Option<Resource>> {
        if !self.finders().contains(&field) {
            return Err(BambooError::Unsupported(format!(
                "a {} cannot be looked up by '{field}'",
                self.kind
            )));
        }
        Ok(self
            .list(&Filter::lookup(field, value), Params::new())
            .await?
            .into_first())
    }
}
