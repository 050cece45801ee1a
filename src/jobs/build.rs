//
//  bamboo-client
//  jobs/build.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Plan builds.

use super::{follow, Clock, JobKind, JobReport, PollOptions, TokioClock};
use crate::api::client::Surface;
use crate::api::common::{Params, Result};
use crate::resource::{Resource, ResourceKind};

/// Query parameter prefix Bamboo reads build variables from.
pub const VARIABLE_PREFIX: &str = "bamboo.variable.";

impl Resource {
    /// Queues a build of this plan with the given build variables and,
    /// unless `options.wait` is off, polls its results until it finishes.
    ///
    /// # Errors
    ///
    /// [`BambooError::Unsupported`](crate::BambooError::Unsupported) if this
    /// is not a plan; otherwise see
    /// [`wait_for_completion`](super::wait_for_completion).
    pub async fn build(&self, variables: &Params, options: &PollOptions) -> Result<JobReport> {
        self.build_with_clock(variables, options, &TokioClock).await
    }

    /// [`build`](Self::build) with an explicit time source.
    pub async fn build_with_clock(
        &self,
        variables: &Params,
        options: &PollOptions,
        clock: &dyn Clock,
    ) -> Result<JobReport> {
        self.ensure_kind(ResourceKind::Plan, "build")?;
        let results = self.results()?;
        let key = self.str_field("key")?;

        let query: Vec<(String, String)> = variables
            .iter()
            .map(|(name, value)| (format!("{VARIABLE_PREFIX}{name}"), value.clone()))
            .collect();

        tracing::debug!("Queueing build of {} with {} variables", key, query.len());
        let response = self
            .client()
            .post_raw(Surface::Rest, &format!("/queue/{key}.json"), &query, None, true)
            .await?;

        follow(JobKind::Build, response, &results, options, clock).await
    }
}
