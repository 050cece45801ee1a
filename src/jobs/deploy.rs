//
//  bamboo-client
//  jobs/deploy.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Deployments of a version to an environment.
//!
//! Deployment variables are not passed with the queue request. Each one is
//! first written to the environment's variables (updated in place if a
//! variable with that exact name exists, created otherwise) and the
//! deployment is queued afterwards.

use super::{follow, Clock, JobKind, JobReport, PollOptions, TokioClock};
use crate::api::client::Surface;
use crate::api::common::{BambooError, Filter, Params, Result};
use crate::resource::accessor;
use crate::resource::{Manager, Queryable, Resource, ResourceKind};

impl Resource {
    /// Deploys `version` to this environment.
    ///
    /// `variables` are reconciled into the environment's variables before
    /// the deployment is queued. A variable write the server refuses does
    /// not stop the deployment; its name is listed in
    /// [`JobReport::unwritten_variables`] and appended to the message.
    ///
    /// # Errors
    ///
    /// [`BambooError::Unsupported`] unless `self` is a deployment environment
    /// and `version` a deployment version; otherwise see
    /// [`wait_for_completion`](super::wait_for_completion).
    pub async fn deploy(&self, version: &Resource, variables: &Params, options: &PollOptions) -> Result<JobReport> {
        self.deploy_with_clock(version, variables, options, &TokioClock).await
    }

    /// [`deploy`](Self::deploy) with an explicit time source.
    pub async fn deploy_with_clock(
        &self,
        version: &Resource,
        variables: &Params,
        options: &PollOptions,
        clock: &dyn Clock,
    ) -> Result<JobReport> {
        self.ensure_kind(ResourceKind::DeploymentEnvironment, "deploy")?;
        version.ensure_kind(ResourceKind::DeploymentVersion, "deploy")?;
        let environment_id = self.id()?;
        let version_id = version.id()?;
        let results = self.results()?;

        let mut unwritten = Vec::new();
        if !variables.is_empty() {
            let vars = self.vars()?;
            for (name, value) in variables {
                if !reconcile_variable(&vars, name, value).await? {
                    unwritten.push(name.clone());
                }
            }
        }

        let query = vec![
            ("environmentId".to_string(), environment_id),
            ("versionId".to_string(), version_id),
        ];
        let response = self
            .client()
            .post_raw(Surface::Rest, "/queue/deployment", &query, None, true)
            .await?;

        let mut report = follow(JobKind::Deployment, response, &results, options, clock).await?;
        if !unwritten.is_empty() {
            report.message = format!("{} (variables not written: {})", report.message, unwritten.join(", "));
            report.unwritten_variables = unwritten;
        }
        Ok(report)
    }

    /// The version most recently deployed to this environment.
    ///
    /// Reads `deploymentVersionName` from the newest deployment result and
    /// looks that name up among the deployment project's versions. Returns
    /// `None` if the environment has never been deployed to or the version
    /// no longer exists.
    pub async fn current_version(&self) -> Result<Option<Resource>> {
        self.ensure_kind(ResourceKind::DeploymentEnvironment, "current_version")?;

        let Some(latest) = self.results()?.latest().await? else {
            return Ok(None);
        };
        let name = latest.str_field("deploymentVersionName")?;

        if let Some(project) = self
            .parent()
            .filter(|p| p.kind() == ResourceKind::DeploymentProject)
        {
            return project.versions()?.find_by_name(&name).await;
        }

        // Not reached through a project: fall back on the URL scope.
        let project_id = self.scope().get("deployment_project_id").cloned().ok_or_else(|| {
            BambooError::MissingArgument(vec!["deployment_project_id".to_string()])
        })?;
        let mut params = Params::new();
        params.insert("deployment_project_id".to_string(), project_id);
        Ok(accessor::list(
            self.client(),
            ResourceKind::DeploymentVersion,
            &Filter::lookup("name", &name),
            params,
        )
        .await?
        .into_first())
    }
}

/// Writes one variable. Returns `false` if the server refused the write.
async fn reconcile_variable(vars: &Manager, name: &str, value: &str) -> Result<bool> {
    let written = match vars.find_by_name(name).await? {
        Some(existing) => existing.update_value(value).await?,
        None => vars.add(name, value).await?,
    };
    if !written {
        tracing::warn!("Variable {} could not be written; deploying anyway", name);
    }
    Ok(written)
}
