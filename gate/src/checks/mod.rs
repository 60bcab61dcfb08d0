// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub mod lint;
pub mod tags;
pub mod validate;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Formatter;
use std::str::FromStr;

use crate::errors::{Error, Result};

pub use lint::{GuardRuleEngine, LintCheck, LintMatch, RuleEngine, RuleFile};
pub use tags::{RequiredTagsCheck, TagReason, TagViolation, DEFAULT_REQUIRED_TAGS};
pub use validate::{
    CloudFormationValidator, TemplateValidator, ValidateCheck, ValidationCause, ValidationIssue,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Lint,
    Tags,
    Validate,
}

impl CheckKind {
    pub fn verb(&self) -> &'static str {
        match self {
            CheckKind::Lint => "linted",
            CheckKind::Tags => "checked for required tags",
            CheckKind::Validate => "validated",
        }
    }

    pub fn noun(&self) -> &'static str {
        match self {
            CheckKind::Lint => "lint",
            CheckKind::Tags => "required tags",
            CheckKind::Validate => "validation",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckKind::Lint => f.write_str("lint"),
            CheckKind::Tags => f.write_str("tags"),
            CheckKind::Validate => f.write_str("validate"),
        }
    }
}

impl FromStr for CheckKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lint" => Ok(CheckKind::Lint),
            "tags" | "tag-policy" => Ok(CheckKind::Tags),
            "validate" => Ok(CheckKind::Validate),
            other => Err(Error::ConfigError(format!(
                "unknown check `{}`, expected one of lint, tags, validate",
                other
            ))),
        }
    }
}

/// A single problem a check found in one template.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "check", rename_all = "lowercase")]
pub enum Issue {
    Lint(LintMatch),
    Tags(TagViolation),
    Validation(ValidationIssue),
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Issue::Lint(m) => write!(f, "{}", m),
            Issue::Tags(t) => write!(f, "{}", t),
            Issue::Validation(v) => write!(f, "{}", v),
        }
    }
}

/// Checks one template. An empty list means the template passed; `Err` aborts
/// the whole run.
#[async_trait]
pub trait CheckStrategy: Send + Sync {
    fn kind(&self) -> CheckKind;
    async fn check(&self, name: &str, text: &str) -> Result<Vec<Issue>>;
}
