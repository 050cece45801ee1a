//
//  bamboo-client
//  jobs/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/01/12.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! # Long-Running Jobs
//!
//! Builds and deployments are queued with one POST and then observed by
//! polling the owner's `results` collection until the most recent result
//! reaches the `FINISHED` life-cycle state.
//!
//! ## States
//!
//! ```text
//! trigger ──200──> Queued ──> Running ──> Finished(Success | Failed)
//!    └────other──> Rejected { status, message }
//! ```
//!
//! ## Polling
//!
//! [`PollOptions`] controls whether to wait at all, the interval between
//! polls, an optional deadline and an optional [`CancelToken`]. Sleeping goes
//! through the [`Clock`] trait so tests can run the loop without real time
//! passing.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use bamboo_client::{BambooClient, ClientConfig, Params, PollOptions, Queryable};
//!
//! # async fn example() -> bamboo_client::Result<()> {
//! let client = BambooClient::new(&ClientConfig::from_env()?)?;
//! let plan = client.plans().find_by_key("APP-BUILD").await?.expect("plan");
//!
//! let options = PollOptions::default()
//!     .with_interval(Duration::from_secs(10))
//!     .with_deadline(Duration::from_secs(30 * 60));
//! let report = plan.build(&Params::new(), &options).await?;
//! println!("{} ({})", report.message, report.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod deploy;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Response, StatusCode};

use crate::api::common::{BambooError, Result};
use crate::resource::{Manager, Resource};

/// Interval between polls when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Shared flag that stops a poll loop at its next iteration.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a triggered job is observed.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Poll until the job finishes. When `false` the trigger's report is
    /// returned straight away.
    pub wait: bool,
    /// Time slept between polls.
    pub interval: Duration,
    /// Total time allowed for polling, measured from the first poll.
    pub deadline: Option<Duration>,
    /// Optional cancellation flag, checked before every poll.
    pub cancel: Option<CancelToken>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            wait: true,
            interval: DEFAULT_POLL_INTERVAL,
            deadline: None,
            cancel: None,
        }
    }
}

impl PollOptions {
    /// Trigger only; do not poll.
    pub fn no_wait() -> Self {
        Self {
            wait: false,
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

/// Time source for the poll loop.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time and `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Terminal outcome of a finished job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    Failed,
}

/// Where a job stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Accepted by the server; no result observed yet.
    Queued,
    /// A result exists but has not finished.
    Running,
    Finished(JobOutcome),
    /// The trigger request was refused.
    Rejected { status: u16, message: String },
}

/// What a build or deployment call ended with.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub state: JobState,
    /// Human-readable trigger or completion message.
    pub message: String,
    /// The result observed last, if polling happened.
    pub result: Option<Resource>,
    /// Deployment variables the server refused to write before the
    /// deployment was queued.
    pub unwritten_variables: Vec<String>,
}

impl JobReport {
    /// `true` iff the job finished successfully.
    pub fn succeeded(&self) -> bool {
        self.state == JobState::Finished(JobOutcome::Success)
    }
}

/// The kinds of job the server can queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Build,
    Deployment,
}

impl JobKind {
    /// Result field holding the outcome once finished.
    pub fn outcome_field(self) -> &'static str {
        match self {
            Self::Build => "buildState",
            Self::Deployment => "deploymentState",
        }
    }

    /// Outcome value meaning success, compared case-insensitively.
    pub fn success_value(self) -> &'static str {
        match self {
            Self::Build => "Successful",
            Self::Deployment => "SUCCESS",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Build => "Build",
            Self::Deployment => "Deployment",
        }
    }

    /// Maps the trigger response status to its message.
    pub fn trigger_message(self, status: u16, body: &str) -> String {
        let known = match (self, status) {
            (Self::Build, 200) => Some("Build successfully queued"),
            (Self::Build, 400) => Some(
                "Returned when build was not added to the queue because of Bamboo limitation - \
                 for example too many concurrent builds running for requested plan already",
            ),
            (Self::Build, 401) => Some(
                "Returned when user does not have sufficient rights to view or execute build for specified plan",
            ),
            (Self::Build, 404) => {
                Some("Returned when specified plan does not exist or plan is not a top level plan")
            }
            (Self::Build, 415) => Some("Returned when POST method payload is not form encoded"),
            (Self::Deployment, 200) => Some("Deployment successfully queued"),
            (Self::Deployment, 400) => Some("Rest Validation error"),
            (Self::Deployment, 401) => Some("Authentication required to trigger deployment"),
            (Self::Deployment, 403) => Some(
                "User dont have permissions to trigger deployment to given environment or there is another deployment in progress",
            ),
            (Self::Deployment, 404) => Some("Environment or version are not found"),
            (Self::Deployment, 415) => Some("Unsupported media type"),
            _ => None,
        };

        known
            .map(str::to_string)
            .unwrap_or_else(|| format!("Failed with code {status}:: {body}"))
    }
}

/// Turns a trigger response into a report, polling `results` when the job
/// was queued and `options.wait` is set.
pub(crate) async fn follow(
    kind: JobKind,
    response: Response,
    results: &Manager,
    options: &PollOptions,
    clock: &dyn Clock,
) -> Result<JobReport> {
    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        let message = kind.trigger_message(status.as_u16(), &body);
        tracing::info!("{} rejected: {}", kind.label(), message);
        return Ok(JobReport {
            state: JobState::Rejected {
                status: status.as_u16(),
                message: message.clone(),
            },
            message,
            result: None,
            unwritten_variables: Vec::new(),
        });
    }

    let message = kind.trigger_message(status.as_u16(), "");
    tracing::info!("{}", message);

    if !options.wait {
        return Ok(JobReport {
            state: JobState::Queued,
            message,
            result: None,
            unwritten_variables: Vec::new(),
        });
    }

    wait_for_completion(kind, results, options, clock).await
}

/// Polls the newest entry of `results` until it reports `FINISHED`.
///
/// Each iteration checks for cancellation, fetches the newest result,
/// returns if it finished, checks the deadline and sleeps `interval`, or
/// only the time left before the deadline when that is shorter.
///
/// # Errors
///
/// - [`BambooError::Cancelled`] when the cancel token is set
/// - [`BambooError::DeadlineExceeded`] once `deadline` has elapsed
/// - any error from listing `results`
pub async fn wait_for_completion(
    kind: JobKind,
    results: &Manager,
    options: &PollOptions,
    clock: &dyn Clock,
) -> Result<JobReport> {
    let started = clock.now();

    loop {
        if options.is_cancelled() {
            tracing::info!("{} polling cancelled", kind.label());
            return Err(BambooError::Cancelled);
        }

        let state = match results.latest().await? {
            None => {
                tracing::debug!("{} queued, no result yet", kind.label());
                JobState::Queued
            }
            Some(result) => {
                let life_cycle = result.str_field("lifeCycleState").unwrap_or_default();
                if life_cycle.eq_ignore_ascii_case("FINISHED") {
                    return Ok(finished(kind, result));
                }
                tracing::debug!("Current state is {}. Waiting", life_cycle);
                JobState::Running
            }
        };

        let mut pause = options.interval;
        if let Some(deadline) = options.deadline {
            let elapsed = clock.now().duration_since(started);
            if elapsed >= deadline {
                tracing::info!("{} still {:?} after {:?}", kind.label(), state, deadline);
                return Err(BambooError::DeadlineExceeded(deadline));
            }
            pause = pause.min(deadline - elapsed);
        }

        clock.sleep(pause).await;
    }
}

fn finished(kind: JobKind, result: Resource) -> JobReport {
    let outcome_value = result.str_field(kind.outcome_field()).unwrap_or_default();
    let outcome = if outcome_value.eq_ignore_ascii_case(kind.success_value()) {
        JobOutcome::Success
    } else {
        JobOutcome::Failed
    };
    let message = format!("{} is {}", kind.label(), outcome_value);
    tracing::info!("{}", message);

    JobReport {
        state: JobState::Finished(outcome),
        message,
        result: Some(result),
        unwritten_variables: Vec::new(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::common::Params;
    use crate::api::BambooClient;
    use crate::config::ClientConfig;
    use crate::resource::ResourceKind;
    use mockito::Matcher;
    use serde_json::json;
    use std::sync::Mutex;

    /// Clock that advances only when slept on.
    pub(crate) struct RecordingClock {
        start: Instant,
        elapsed: Mutex<Duration>,
        pub(crate) sleeps: Mutex<Vec<Duration>>,
    }

    impl RecordingClock {
        pub(crate) fn new() -> Self {
            Self {
                start: Instant::now(),
                elapsed: Mutex::new(Duration::ZERO),
                sleeps: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn sleep_count(&self) -> usize {
            self.sleeps.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Clock for RecordingClock {
        fn now(&self) -> Instant {
            self.start + *self.elapsed.lock().unwrap()
        }

        async fn sleep(&self, duration: Duration) {
            *self.elapsed.lock().unwrap() += duration;
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    const RESULTS_PATH: &str = "/rest/api/latest/result/APP-BUILD.json";

    fn plan_results(server: &mockito::ServerGuard) -> Manager {
        let client = BambooClient::new(&ClientConfig::new(&server.url())).unwrap();
        Resource::new(client, ResourceKind::Plan, json!({"key": "APP-BUILD"}), Params::new())
            .unwrap()
            .results()
            .unwrap()
    }

    fn results_body(items: serde_json::Value) -> String {
        json!({"results": {"result": items}}).to_string()
    }

    async fn mock_once(server: &mut mockito::ServerGuard, items: serde_json::Value) -> mockito::Mock {
        server
            .mock("GET", RESULTS_PATH)
            .match_query(Matcher::Any)
            .with_body(results_body(items))
            .expect(1)
            .create_async()
            .await
    }

    #[test]
    fn test_trigger_messages() {
        assert_eq!(JobKind::Build.trigger_message(200, ""), "Build successfully queued");
        assert_eq!(JobKind::Deployment.trigger_message(400, ""), "Rest Validation error");
        assert!(JobKind::Build.trigger_message(404, "").contains("not a top level plan"));
        assert_eq!(
            JobKind::Deployment.trigger_message(500, "{\"message\":\"boom\"}"),
            "Failed with code 500:: {\"message\":\"boom\"}"
        );
    }

    #[test]
    fn test_poll_options_defaults() {
        let options = PollOptions::default();
        assert!(options.wait);
        assert_eq!(options.interval, Duration::from_secs(30));
        assert!(options.deadline.is_none());
        assert!(!PollOptions::no_wait().wait);
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let options = PollOptions::default().with_cancel(token.clone());
        assert!(!options.is_cancelled());
        token.cancel();
        assert!(options.is_cancelled());
    }

    #[tokio::test]
    async fn test_polls_until_finished() {
        let mut server = mockito::Server::new_async().await;
        let first = mock_once(&mut server, json!([])).await;
        let second = mock_once(&mut server, json!([{"lifeCycleState": "InProgress"}])).await;
        let third = mock_once(
            &mut server,
            json!([{"lifeCycleState": "Finished", "buildState": "Successful"}]),
        )
        .await;
        let clock = RecordingClock::new();
        let options = PollOptions::default().with_interval(Duration::from_secs(5));

        let report = wait_for_completion(JobKind::Build, &plan_results(&server), &options, &clock)
            .await
            .unwrap();

        assert!(report.succeeded());
        assert_eq!(report.message, "Build is Successful");
        assert_eq!(*clock.sleeps.lock().unwrap(), vec![Duration::from_secs(5); 2]);
        first.assert_async().await;
        second.assert_async().await;
        third.assert_async().await;
    }

    #[tokio::test]
    async fn test_finished_failure() {
        let mut server = mockito::Server::new_async().await;
        mock_once(&mut server, json!([{"lifeCycleState": "FINISHED", "buildState": "Failed"}])).await;
        let clock = RecordingClock::new();

        let report = wait_for_completion(JobKind::Build, &plan_results(&server), &PollOptions::default(), &clock)
            .await
            .unwrap();

        assert_eq!(report.state, JobState::Finished(JobOutcome::Failed));
        assert!(!report.succeeded());
        assert_eq!(clock.sleep_count(), 0);
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", RESULTS_PATH)
            .match_query(Matcher::Any)
            .with_body(results_body(json!([{"lifeCycleState": "InProgress"}])))
            .create_async()
            .await;
        let clock = RecordingClock::new();
        let options = PollOptions::default()
            .with_interval(Duration::from_secs(10))
            .with_deadline(Duration::from_secs(25));

        let err = wait_for_completion(JobKind::Build, &plan_results(&server), &options, &clock)
            .await
            .unwrap_err();

        assert!(matches!(err, BambooError::DeadlineExceeded(d) if d == Duration::from_secs(25)));
        assert_eq!(clock.sleep_count(), 3);
    }

    #[tokio::test]
    async fn test_last_sleep_is_cut_to_the_deadline() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", RESULTS_PATH)
            .match_query(Matcher::Any)
            .with_body(results_body(json!([{"lifeCycleState": "Queued"}])))
            .create_async()
            .await;
        let clock = RecordingClock::new();
        let options = PollOptions::default()
            .with_interval(Duration::from_secs(30))
            .with_deadline(Duration::from_secs(5));

        let err = wait_for_completion(JobKind::Build, &plan_results(&server), &options, &clock)
            .await
            .unwrap_err();

        assert!(matches!(err, BambooError::DeadlineExceeded(_)));
        assert_eq!(*clock.sleeps.lock().unwrap(), vec![Duration::from_secs(5)]);
    }

    #[tokio::test]
    async fn test_cancelled_before_polling() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let token = CancelToken::new();
        token.cancel();
        let options = PollOptions::default().with_cancel(token);

        let err = wait_for_completion(JobKind::Build, &plan_results(&server), &options, &RecordingClock::new())
            .await
            .unwrap_err();

        assert!(matches!(err, BambooError::Cancelled));
        mock.assert_async().await;
    }
}
