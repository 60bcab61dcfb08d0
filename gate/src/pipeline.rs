// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The check-and-report workflow shared by every gate.
//!
//! `received -> artifacts-checked -> fetching -> checking -> aggregating -> reported`.
//! Any stage error moves straight to a failure report carrying the error text.

use log::{debug, error, info, warn};
use std::fmt::Formatter;
use time::OffsetDateTime;

use crate::artifacts::{fetch_templates, ArtifactRef};
use crate::checks::CheckStrategy;
use crate::config::GateConfig;
use crate::context::AppContext;
use crate::errors::{Error, Result};
use crate::event::PipelineEvent;
use crate::reporter::JobReporter;
use crate::results::{JobOutcome, JobStatus, ResultAggregator, RunResult};
use crate::store::ObjectStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Received,
    ArtifactsChecked,
    Fetching,
    Checking,
    Aggregating,
    ReportedSuccess,
    ReportedFailure,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Received => f.write_str("received"),
            RunState::ArtifactsChecked => f.write_str("artifacts-checked"),
            RunState::Fetching => f.write_str("fetching"),
            RunState::Checking => f.write_str("checking"),
            RunState::Aggregating => f.write_str("aggregating"),
            RunState::ReportedSuccess => f.write_str("reported-success"),
            RunState::ReportedFailure => f.write_str("reported-failure"),
        }
    }
}

/// The job being worked on, plus the request id every log line is tagged with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub job_id: String,
    pub request_id: String,
}

impl JobHandle {
    fn transition(&self, state: RunState) {
        debug!("[{}] job {} is {}", self.request_id, self.job_id, state);
    }
}

pub fn consume_event(event: &PipelineEvent, request_id: &str) -> JobHandle {
    let job = JobHandle {
        job_id: event.job.id.clone(),
        request_id: request_id.to_string(),
    };
    info!(
        "[{}] new invoke for job {} with {} input artifact(s)",
        job.request_id,
        job.job_id,
        event.input_artifacts().len()
    );
    job.transition(RunState::Received);
    job
}

pub async fn run_job(app: &AppContext, event: &PipelineEvent, request_id: &str) -> Result<JobOutcome> {
    run_pipeline(
        app.check.as_ref(),
        app.store.as_ref(),
        app.reporter.as_ref(),
        &app.config,
        event,
        request_id,
    )
    .await
}

/// Runs `check` over the event's template bundle and reports exactly once.
/// Only a failed report call is returned as an error.
pub async fn run_pipeline<C>(
    check: &C,
    store: &dyn ObjectStore,
    reporter: &dyn JobReporter,
    config: &GateConfig,
    event: &PipelineEvent,
    request_id: &str,
) -> Result<JobOutcome>
where
    C: CheckStrategy + ?Sized,
{
    let job = consume_event(event, request_id);
    let outcome = match execute(check, store, config, event, &job).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("[{}] job {} failed: {:?}", job.request_id, job.job_id, e);
            JobOutcome::failure(e.to_string())
        }
    };
    report(reporter, &job, &outcome).await?;
    Ok(outcome)
}

async fn execute<C>(
    check: &C,
    store: &dyn ObjectStore,
    config: &GateConfig,
    event: &PipelineEvent,
    job: &JobHandle,
) -> Result<JobOutcome>
where
    C: CheckStrategy + ?Sized,
{
    let artifact = select_artifact(event, job)?;
    job.transition(RunState::ArtifactsChecked);

    job.transition(RunState::Fetching);
    let templates = fetch_templates(store, &artifact).await?;
    info!(
        "[{}] {} template(s) in {}",
        job.request_id,
        templates.len(),
        artifact
    );

    job.transition(RunState::Checking);
    let mut aggregator = ResultAggregator::new(check.kind(), &artifact.key);
    for unit in templates {
        let issues = check.check(&unit.name, &unit.text).await?;
        debug!(
            "[{}] {} has {} issue(s)",
            job.request_id,
            unit.name,
            issues.len()
        );
        aggregator.record(unit, issues);
    }

    job.transition(RunState::Aggregating);
    let result = aggregator.finish();
    let mut outcome = result.outcome();
    if let Some(location) = archive_report(store, config, job, &result).await {
        outcome.message.push_str(&format!("\nFull report: {}", location));
    }
    Ok(outcome)
}

fn select_artifact(event: &PipelineEvent, job: &JobHandle) -> Result<ArtifactRef> {
    let artifacts = event.input_artifacts();
    let first = artifacts.first().ok_or(Error::NoInputArtifacts)?;
    if artifacts.len() > 1 {
        warn!(
            "[{}] {} input artifacts given, only the first is checked",
            job.request_id,
            artifacts.len()
        );
    }
    first.s3_ref()
}

/// Stores the full run result when a report bucket is configured. Failures are
/// logged and never change the outcome.
async fn archive_report(
    store: &dyn ObjectStore,
    config: &GateConfig,
    job: &JobHandle,
    result: &RunResult,
) -> Option<String> {
    let bucket = config.report_bucket.as_ref()?;
    let key = format!(
        "{}{}-{}.json",
        config.report_prefix,
        job.job_id,
        OffsetDateTime::now_utc().unix_timestamp()
    );
    let body = match serde_json::to_vec_pretty(result) {
        Ok(body) => body,
        Err(e) => {
            error!("[{}] could not serialize run report: {}", job.request_id, e);
            return None;
        }
    };
    match store.put_object(bucket, &key, body).await {
        Ok(()) => Some(store.location(bucket, &key)),
        Err(e) => {
            error!("[{}] could not store run report: {}", job.request_id, e);
            None
        }
    }
}

async fn report(reporter: &dyn JobReporter, job: &JobHandle, outcome: &JobOutcome) -> Result<()> {
    let reported = match outcome.status {
        JobStatus::Succeeded => {
            info!("[{}] {}", job.request_id, outcome.message);
            reporter.report_success(&job.job_id, &outcome.message).await
        }
        JobStatus::Failed => {
            error!("[{}] {}", job.request_id, outcome.message);
            reporter.report_failure(&job.job_id, &outcome.message).await
        }
    };
    if let Err(e) = reported {
        error!(
            "[{}] could not report {} for job {}: {:?}",
            job.request_id, outcome.status, job.job_id, e
        );
        return Err(e);
    }

    job.transition(match outcome.status {
        JobStatus::Succeeded => RunState::ReportedSuccess,
        JobStatus::Failed => RunState::ReportedFailure,
    });
    Ok(())
}
