// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use aws_sdk_cloudformation::types::SdkError;
use log::warn;
use serde::Serialize;
use std::fmt::Formatter;

use crate::checks::{CheckKind, CheckStrategy, Issue};
use crate::errors::Result;

const TEMPLATE_REJECTED_CODE: &str = "ValidationError";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationCause {
    /// The service evaluated the template and rejected it.
    Rejected,
    /// The service could not be asked: network, credentials, throttling.
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub cause: ValidationCause,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(cause: ValidationCause, message: impl Into<String>) -> Self {
        ValidationIssue {
            cause,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        ValidationIssue {
            cause: ValidationCause::Rejected,
            message: message.into(),
        }
    }

    pub fn unreachable(message: impl Into<String>) -> Self {
        ValidationIssue {
            cause: ValidationCause::Unreachable,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.cause {
            ValidationCause::Rejected => write!(f, "Template rejected: {}", self.message),
            ValidationCause::Unreachable => {
                write!(f, "Validation service unavailable: {}", self.message)
            }
        }
    }
}

#[async_trait]
pub trait TemplateValidator: Send + Sync {
    async fn validate(&self, template_body: &str) -> std::result::Result<(), ValidationIssue>;
}

pub struct CloudFormationValidator {
    client: aws_sdk_cloudformation::Client,
}

impl CloudFormationValidator {
    pub fn new(client: aws_sdk_cloudformation::Client) -> Self {
        CloudFormationValidator { client }
    }
}

#[async_trait]
impl TemplateValidator for CloudFormationValidator {
    async fn validate(&self, template_body: &str) -> std::result::Result<(), ValidationIssue> {
        match self
            .client
            .validate_template()
            .template_body(template_body)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(SdkError::ServiceError { err, .. }) => {
                Err(ValidationIssue::new(cause_for(err.code()), err.to_string()))
            }
            Err(err) => Err(ValidationIssue::unreachable(err.to_string())),
        }
    }
}

/// Only the service's own `ValidationError` means the template was judged.
fn cause_for(code: Option<&str>) -> ValidationCause {
    match code {
        Some(TEMPLATE_REJECTED_CODE) => ValidationCause::Rejected,
        _ => ValidationCause::Unreachable,
    }
}

pub struct ValidateCheck<V: TemplateValidator> {
    validator: V,
}

impl<V: TemplateValidator> ValidateCheck<V> {
    pub fn new(validator: V) -> Self {
        ValidateCheck { validator }
    }
}

#[async_trait]
impl<V: TemplateValidator> CheckStrategy for ValidateCheck<V> {
    fn kind(&self) -> CheckKind {
        CheckKind::Validate
    }

    async fn check(&self, name: &str, text: &str) -> Result<Vec<Issue>> {
        match self.validator.validate(text).await {
            Ok(()) => Ok(vec![]),
            Err(issue) => {
                if issue.cause == ValidationCause::Unreachable {
                    warn!("Could not reach the validation service for {}: {}", name, issue.message);
                }
                Ok(vec![Issue::Validation(issue)])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    struct StaticValidator(std::result::Result<(), ValidationIssue>);

    #[async_trait]
    impl TemplateValidator for StaticValidator {
        async fn validate(&self, _body: &str) -> std::result::Result<(), ValidationIssue> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn accepted_templates_have_no_issues() -> Result<()> {
        let check = ValidateCheck::new(StaticValidator(Ok(())));
        assert_eq!(check.check("t.yaml", "Resources: {}").await?, vec![]);
        Ok(())
    }

    #[tokio::test]
    async fn rejection_is_a_single_issue() -> Result<()> {
        let rejected = ValidationIssue::rejected("Template format error: Unresolved resource dependencies [Missing]");
        let check = ValidateCheck::new(StaticValidator(Err(rejected.clone())));
        let issues = check.check("t.yaml", "Resources: {}").await?;
        assert_eq!(issues, vec![Issue::Validation(rejected)]);
        assert_eq!(
            issues[0].to_string(),
            "Template rejected: Template format error: Unresolved resource dependencies [Missing]"
        );
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_service_is_tagged_separately() -> Result<()> {
        let check = ValidateCheck::new(StaticValidator(Err(ValidationIssue::unreachable(
            "dispatch failure: connection refused",
        ))));
        let issues = check.check("t.yaml", "Resources: {}").await?;
        match &issues[..] {
            [Issue::Validation(issue)] => assert_eq!(issue.cause, ValidationCause::Unreachable),
            other => panic!("unexpected issues {:?}", other),
        }
        Ok(())
    }

    #[rstest]
    #[case(Some("ValidationError"), ValidationCause::Rejected)]
    #[case(Some("Throttling"), ValidationCause::Unreachable)]
    #[case(Some("AccessDenied"), ValidationCause::Unreachable)]
    #[case(Some("validationerror"), ValidationCause::Unreachable)]
    #[case(None, ValidationCause::Unreachable)]
    fn only_validation_errors_are_rejections(
        #[case] code: Option<&str>,
        #[case] expected: ValidationCause,
    ) {
        assert_eq!(cause_for(code), expected);
    }
}
