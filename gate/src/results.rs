// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use serde::Serialize;
use std::fmt::{Formatter, Write};

use crate::artifacts::TemplateUnit;
use crate::checks::{CheckKind, Issue};

/// A template that failed its check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub name: String,
    pub text: String,
    pub issues: Vec<Issue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub check: CheckKind,
    pub successes: Vec<String>,
    pub errors: Vec<Finding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobStatus {
    Succeeded,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Succeeded => f.write_str("PASS"),
            JobStatus::Failed => f.write_str("FAIL"),
        }
    }
}

/// What gets reported back to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub status: JobStatus,
    pub message: String,
}

impl JobOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        JobOutcome {
            status: JobStatus::Succeeded,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        JobOutcome {
            status: JobStatus::Failed,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Succeeded
    }
}

/// Collects per-template outcomes in fetch order.
#[derive(Debug)]
pub struct ResultAggregator {
    check: CheckKind,
    prefix: String,
    successes: Vec<String>,
    errors: Vec<Finding>,
}

impl ResultAggregator {
    /// `prefix` is prepended to member names to form success identifiers,
    /// usually the artifact object key.
    pub fn new(check: CheckKind, prefix: &str) -> Self {
        ResultAggregator {
            check,
            prefix: prefix.trim_end_matches('/').to_string(),
            successes: vec![],
            errors: vec![],
        }
    }

    pub fn record(&mut self, unit: TemplateUnit, issues: Vec<Issue>) {
        if issues.is_empty() {
            let id = if self.prefix.is_empty() {
                unit.name
            } else {
                format!("{}/{}", self.prefix, unit.name)
            };
            self.successes.push(id);
        } else {
            self.errors.push(Finding {
                name: unit.name,
                text: unit.text,
                issues,
            });
        }
    }

    pub fn finish(self) -> RunResult {
        RunResult {
            check: self.check,
            successes: self.successes,
            errors: self.errors,
        }
    }
}

impl RunResult {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn outcome(&self) -> JobOutcome {
        if self.passed() {
            JobOutcome::success(self.success_summary())
        } else {
            JobOutcome::failure(self.failure_summary())
        }
    }

    pub fn success_summary(&self) -> String {
        format!("Successfully {}: {:?}", self.check.verb(), self.successes)
    }

    pub fn failure_summary(&self) -> String {
        let mut summary = format!(
            "{} template(s) failed {} checks",
            self.errors.len(),
            self.check.noun()
        );
        for finding in &self.errors {
            let _ = write!(summary, "\n- {}:", finding.name);
            for issue in &finding.issues {
                let _ = write!(summary, "\n    {}", issue);
            }
            let _ = write!(summary, "\n  template:");
            for line in finding.text.lines() {
                let _ = write!(summary, "\n    | {}", line);
            }
        }
        summary
    }
}
