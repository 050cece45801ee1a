//
//  bamboo-client
//  resource/descriptor.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Static per-kind metadata driving the generic accessor.
//!
//! Every kind of Bamboo entity is described by one [`ResourceDescriptor`]:
//! where to fetch it, which parameters its URLs need, how to unwrap the
//! list envelope, and which child collections hang off it.
//!
//! # Resource Tree
//!
//! ```text
//! Project
//! Plan ──results──> PlanResult
//! DeploymentProject ──environments──> DeploymentEnvironment ──vars────> DeploymentEnvironmentVariable
//!                   └─versions──────> DeploymentVersion     └─results─> DeploymentResult
//! ```
//!
//! # URL Templates
//!
//! Templates use `{name}` placeholders, filled from the request parameters.
//! Paths are relative to `/rest/api/latest` for the REST backend.

use std::fmt;

/// How a kind's collection is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// JSON REST API.
    Rest,
    /// Legacy HTML configuration page and form actions.
    EnvironmentVariableForm,
}

/// Parameter inheritance rule: fill `child_param` from the owner's
/// `parent_field`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inherit {
    pub child_param: &'static str,
    pub parent_field: &'static str,
}

/// A named child collection of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    /// Attribute name on the owner (e.g. `"vars"`).
    pub name: &'static str,
    /// Kind of the child resources.
    pub kind: ResourceKind,
    /// Parameters the child manager inherits from the owner.
    pub inherit: &'static [Inherit],
    /// Attribute name under which children refer back to the owner.
    pub back_reference: &'static str,
}

/// Static metadata for one resource kind.
#[derive(Debug, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Template for fetch-by-id, if the kind supports it.
    pub single_url: Option<&'static str>,
    /// Template for the collection fetch, if the kind supports it.
    pub list_url: Option<&'static str>,
    /// Parameters required before a single fetch is built.
    pub required_single: &'static [&'static str],
    /// Parameters required before a list fetch is built.
    pub required_list: &'static [&'static str],
    /// Keys to descend through to reach the item array.
    pub envelope: &'static [&'static str],
    /// Server-side page size hint sent as `max-results`.
    pub result_cap: Option<u32>,
    /// Child collections.
    pub children: &'static [Relationship],
    /// Fields accepted by `find_by`.
    pub finders: &'static [&'static str],
    /// Where the collection comes from.
    pub backend: Backend,
}

impl ResourceDescriptor {
    /// Looks up a child relationship by attribute name.
    pub fn child(&self, name: &str) -> Option<&'static Relationship> {
        self.children.iter().find(|r| r.name == name)
    }
}

/// Every kind of server entity the client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Project,
    Plan,
    PlanResult,
    DeploymentProject,
    DeploymentEnvironment,
    DeploymentVersion,
    DeploymentEnvironmentVariable,
    DeploymentResult,
}

const BY_ID: Inherit = Inherit {
    child_param: "deployment_project_id",
    parent_field: "id",
};

const BY_ENVIRONMENT_ID: Inherit = Inherit {
    child_param: "deployment_project_env_id",
    parent_field: "id",
};

const BY_PLAN_KEY: Inherit = Inherit {
    child_param: "plan_key",
    parent_field: "key",
};

static PROJECT: ResourceDescriptor = ResourceDescriptor {
    single_url: Some("/project/{id}"),
    list_url: Some("/project.json"),
    required_single: &["id"],
    required_list: &[],
    envelope: &["projects", "project"],
    result_cap: Some(500),
    children: &[],
    finders: &["key", "name"],
    backend: Backend::Rest,
};

static PLAN: ResourceDescriptor = ResourceDescriptor {
    single_url: Some("/plan/{id}"),
    list_url: Some("/plan.json"),
    required_single: &["id"],
    required_list: &[],
    envelope: &["plans", "plan"],
    result_cap: Some(3000),
    children: &[Relationship {
        name: "results",
        kind: ResourceKind::PlanResult,
        inherit: &[BY_PLAN_KEY],
        back_reference: "plan",
    }],
    finders: &["key", "name", "shortKey", "shortName", "buildName"],
    backend: Backend::Rest,
};

static PLAN_RESULT: ResourceDescriptor = ResourceDescriptor {
    single_url: Some("/result/{plan_key}-{build_number}.json"),
    list_url: Some("/result/{plan_key}.json"),
    required_single: &["plan_key", "build_number"],
    required_list: &["plan_key"],
    envelope: &["results", "result"],
    result_cap: Some(100),
    children: &[],
    finders: &["key", "buildResultKey", "buildNumber", "state", "buildState", "lifeCycleState"],
    backend: Backend::Rest,
};

static DEPLOYMENT_PROJECT: ResourceDescriptor = ResourceDescriptor {
    single_url: Some("/deploy/project/{id}"),
    list_url: Some("/deploy/project/all"),
    required_single: &["id"],
    required_list: &[],
    envelope: &[],
    result_cap: None,
    children: &[
        Relationship {
            name: "environments",
            kind: ResourceKind::DeploymentEnvironment,
            inherit: &[BY_ID],
            back_reference: "deployment_project",
        },
        Relationship {
            name: "versions",
            kind: ResourceKind::DeploymentVersion,
            inherit: &[BY_ID],
            back_reference: "deployment_project",
        },
    ],
    finders: &["id", "name", "planKey"],
    backend: Backend::Rest,
};

static DEPLOYMENT_ENVIRONMENT: ResourceDescriptor = ResourceDescriptor {
    single_url: None,
    list_url: Some("/deploy/project/{deployment_project_id}"),
    required_single: &[],
    required_list: &["deployment_project_id"],
    envelope: &["environments"],
    result_cap: None,
    children: &[
        Relationship {
            name: "vars",
            kind: ResourceKind::DeploymentEnvironmentVariable,
            inherit: &[BY_ENVIRONMENT_ID],
            back_reference: "environment",
        },
        Relationship {
            name: "results",
            kind: ResourceKind::DeploymentResult,
            inherit: &[BY_ENVIRONMENT_ID],
            back_reference: "environment",
        },
    ],
    finders: &["id", "name", "key"],
    backend: Backend::Rest,
};

static DEPLOYMENT_VERSION: ResourceDescriptor = ResourceDescriptor {
    single_url: None,
    list_url: Some("/deploy/project/{deployment_project_id}/versions"),
    required_single: &[],
    required_list: &["deployment_project_id"],
    envelope: &["versions"],
    result_cap: Some(1000),
    children: &[],
    finders: &["id", "name"],
    backend: Backend::Rest,
};

static DEPLOYMENT_RESULT: ResourceDescriptor = ResourceDescriptor {
    single_url: None,
    list_url: Some("/deploy/environment/{deployment_project_env_id}/results"),
    required_single: &[],
    required_list: &["deployment_project_env_id"],
    envelope: &["results"],
    result_cap: None,
    children: &[],
    finders: &["id", "deploymentVersionName", "deploymentState", "lifeCycleState"],
    backend: Backend::Rest,
};

static DEPLOYMENT_ENVIRONMENT_VARIABLE: ResourceDescriptor = ResourceDescriptor {
    single_url: None,
    list_url: None,
    required_single: &[],
    required_list: &["deployment_project_env_id"],
    envelope: &[],
    result_cap: None,
    children: &[],
    finders: &["id", "name", "value"],
    backend: Backend::EnvironmentVariableForm,
};

impl ResourceKind {
    /// All kinds, in resource-tree order.
    pub const ALL: [ResourceKind; 8] = [
        Self::Project,
        Self::Plan,
        Self::PlanResult,
        Self::DeploymentProject,
        Self::DeploymentEnvironment,
        Self::DeploymentVersion,
        Self::DeploymentEnvironmentVariable,
        Self::DeploymentResult,
    ];

    /// The static descriptor for this kind.
    pub fn descriptor(self) -> &'static ResourceDescriptor {
        match self {
            Self::Project => &PROJECT,
            Self::Plan => &PLAN,
            Self::PlanResult => &PLAN_RESULT,
            Self::DeploymentProject => &DEPLOYMENT_PROJECT,
            Self::DeploymentEnvironment => &DEPLOYMENT_ENVIRONMENT,
            Self::DeploymentVersion => &DEPLOYMENT_VERSION,
            Self::DeploymentEnvironmentVariable => &DEPLOYMENT_ENVIRONMENT_VARIABLE,
            Self::DeploymentResult => &DEPLOYMENT_RESULT,
        }
    }

    /// Human-readable kind name used in logs and errors.
    pub fn name(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Plan => "plan",
            Self::PlanResult => "plan result",
            Self::DeploymentProject => "deployment project",
            Self::DeploymentEnvironment => "deployment environment",
            Self::DeploymentVersion => "deployment version",
            Self::DeploymentEnvironmentVariable => "environment variable",
            Self::DeploymentResult => "deployment result",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
