// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Formatter;

use crate::checks::{CheckKind, CheckStrategy, Issue};
use crate::errors::{Error, Result};
use crate::template::{load_template, type_name};

pub const DEFAULT_REQUIRED_TAGS: [&str; 6] = [
    "BillAccount",
    "BillDeptId",
    "BillFund",
    "DataClassification",
    "PrimaryContact",
    "ServiceName",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TagReason {
    NoTagsFound,
    RequiredTagsMissing,
    Unreadable,
}

impl std::fmt::Display for TagReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TagReason::NoTagsFound => f.write_str("No Tags Found"),
            TagReason::RequiredTagsMissing => f.write_str("Required tags not in template"),
            TagReason::Unreadable => f.write_str("Unable to check tags"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagViolation {
    /// Logical id of the offending resource, absent when the template could not be read.
    pub resource: Option<String>,
    pub reason: TagReason,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TagViolation {
    fn no_tags(resource: &str) -> Self {
        TagViolation {
            resource: Some(resource.to_string()),
            reason: TagReason::NoTagsFound,
            missing: vec![],
            detail: None,
        }
    }

    fn missing(resource: &str, missing: Vec<String>) -> Self {
        TagViolation {
            resource: Some(resource.to_string()),
            reason: TagReason::RequiredTagsMissing,
            missing,
            detail: None,
        }
    }

    fn unreadable(detail: String) -> Self {
        TagViolation {
            resource: None,
            reason: TagReason::Unreadable,
            missing: vec![],
            detail: Some(detail),
        }
    }
}

impl std::fmt::Display for TagViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.resource {
            Some(resource) => write!(f, "({}, \"{}\"", resource, self.reason)?,
            None => write!(f, "(\"{}\"", self.reason)?,
        }
        if !self.missing.is_empty() {
            write!(f, ", missing {:?}", self.missing)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ", {}", detail)?;
        }
        f.write_str(")")
    }
}

/// Requires every resource to carry a fixed set of tag keys.
#[derive(Debug, Clone)]
pub struct RequiredTagsCheck {
    required: BTreeSet<String>,
}

impl Default for RequiredTagsCheck {
    fn default() -> Self {
        RequiredTagsCheck::new(DEFAULT_REQUIRED_TAGS.iter().map(|t| t.to_string()))
    }
}

impl RequiredTagsCheck {
    pub fn new<I: IntoIterator<Item = String>>(required: I) -> Self {
        RequiredTagsCheck {
            required: required.into_iter().collect(),
        }
    }

    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    pub fn violations(&self, text: &str) -> Vec<TagViolation> {
        match self.evaluate(text) {
            Ok(violations) => violations,
            Err(e) => vec![TagViolation::unreadable(e.to_string())],
        }
    }

    fn evaluate(&self, text: &str) -> Result<Vec<TagViolation>> {
        let template = load_template(text)?;
        let resources = match template.get("Resources") {
            Some(Value::Object(resources)) => resources,
            Some(other) => {
                return Err(Error::TemplateError(format!(
                    "Resources must be a mapping, found {}",
                    type_name(other)
                )))
            }
            None => {
                return Err(Error::TemplateError(String::from(
                    "template does not declare a Resources section",
                )))
            }
        };

        let mut violations = Vec::new();
        for (logical_id, resource) in resources {
            let tags = resource
                .get("Properties")
                .and_then(|properties| properties.get("Tags"));
            match tags {
                None => violations.push(TagViolation::no_tags(logical_id)),
                Some(tags) => {
                    let present = tag_keys(tags);
                    let missing = self
                        .required
                        .iter()
                        .filter(|required| !present.contains(required.as_str()))
                        .cloned()
                        .collect::<Vec<String>>();
                    if !missing.is_empty() {
                        violations.push(TagViolation::missing(logical_id, missing));
                    }
                }
            }
        }
        Ok(violations)
    }
}

//
// Tags are either a list of {Key, Value} pairs (most resource types) or a plain
// key/value mapping (e.g. AWS::SSM::Parameter). Keys that are not literal strings
// cannot satisfy the policy and are ignored.
//
fn tag_keys(tags: &Value) -> BTreeSet<&str> {
    match tags {
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| entry.get("Key").and_then(Value::as_str))
            .collect(),
        Value::Object(map) => map.keys().map(String::as_str).collect(),
        _ => BTreeSet::new(),
    }
}

#[async_trait]
impl CheckStrategy for RequiredTagsCheck {
    fn kind(&self) -> CheckKind {
        CheckKind::Tags
    }

    async fn check(&self, _name: &str, text: &str) -> Result<Vec<Issue>> {
        Ok(self.violations(text).into_iter().map(Issue::Tags).collect())
    }
}

#[cfg(test)]
#[path = "tags_tests.rs"]
mod tags_tests;
