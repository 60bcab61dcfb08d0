// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use aws_sdk_codepipeline::model::{ExecutionDetails, FailureDetails, FailureType};
use colored::*;
use std::io::Write;
use std::sync::Mutex;

use crate::errors::{Error, Result};
use crate::utils::writer::Writer;

/// CodePipeline caps `ExecutionDetails.summary` at 2048 characters.
pub const MAX_SUMMARY_LEN: usize = 2048;
/// CodePipeline caps `FailureDetails.message` at 5000 characters.
pub const MAX_FAILURE_MESSAGE_LEN: usize = 5000;
const TRUNCATION_MARKER: &str = "... [truncated]";

/// Signals the job result to the orchestrating pipeline.
#[async_trait]
pub trait JobReporter: Send + Sync {
    async fn report_success(&self, job_id: &str, message: &str) -> Result<()>;
    async fn report_failure(&self, job_id: &str, message: &str) -> Result<()>;
}

/// Shortens `message` to at most `limit` characters, marking the cut.
pub fn truncate_message(message: &str, limit: usize) -> String {
    if message.chars().count() <= limit {
        return message.to_string();
    }
    let keep = limit.saturating_sub(TRUNCATION_MARKER.len());
    let mut truncated = message.chars().take(keep).collect::<String>();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

pub struct CodePipelineReporter {
    client: aws_sdk_codepipeline::Client,
}

impl CodePipelineReporter {
    pub fn new(client: aws_sdk_codepipeline::Client) -> Self {
        CodePipelineReporter { client }
    }
}

#[async_trait]
impl JobReporter for CodePipelineReporter {
    async fn report_success(&self, job_id: &str, message: &str) -> Result<()> {
        let details = ExecutionDetails::builder()
            .summary(truncate_message(message, MAX_SUMMARY_LEN))
            .build();
        self.client
            .put_job_success_result()
            .job_id(job_id)
            .execution_details(details)
            .send()
            .await
            .map_err(|e| Error::ReportError(format!("PutJobSuccessResult for {}: {}", job_id, e)))?;
        Ok(())
    }

    async fn report_failure(&self, job_id: &str, message: &str) -> Result<()> {
        let details = FailureDetails::builder()
            .r#type(FailureType::JobFailed)
            .message(truncate_message(message, MAX_FAILURE_MESSAGE_LEN))
            .build();
        self.client
            .put_job_failure_result()
            .job_id(job_id)
            .failure_details(details)
            .send()
            .await
            .map_err(|e| Error::ReportError(format!("PutJobFailureResult for {}: {}", job_id, e)))?;
        Ok(())
    }
}

/// Prints the result for local runs.
pub struct ConsoleReporter {
    writer: Mutex<Writer>,
}

impl ConsoleReporter {
    pub fn new(writer: Writer) -> Self {
        ConsoleReporter {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_writer(self) -> Writer {
        match self.writer.into_inner() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn print(&self, status: ColoredString, job_id: &str, message: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| Error::ReportError(e.to_string()))?;
        writeln!(writer, "{} {}", status, job_id)?;
        writeln!(writer, "{}", message)?;
        Ok(())
    }
}

#[async_trait]
impl JobReporter for ConsoleReporter {
    async fn report_success(&self, job_id: &str, message: &str) -> Result<()> {
        self.print("PASS".green(), job_id, message)
    }

    async fn report_failure(&self, job_id: &str, message: &str) -> Result<()> {
        self.print("FAIL".red().bold(), job_id, message)
    }
}
