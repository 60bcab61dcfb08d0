// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use aws_types::region::Region;
use cfn_pipeline_gate::checks::CloudFormationValidator;
use cfn_pipeline_gate::config::GateConfig;
use cfn_pipeline_gate::event::PipelineEvent;
use cfn_pipeline_gate::reporter::CodePipelineReporter;
use cfn_pipeline_gate::results::JobOutcome;
use cfn_pipeline_gate::store::S3Store;
use cfn_pipeline_gate::{build_check, run_job, AppContext};
use lambda_runtime::{Context, Error};
use log::{debug, info};

/// Builds the clients and the configured check once, at cold start.
pub async fn build_app_context(config: GateConfig) -> Result<AppContext, Error> {
    let shared = aws_config::from_env().load().await;
    info!(
        "New Lambda container initialised for the {} gate in {:?}",
        config.check,
        shared.region().map(Region::to_string)
    );

    let cloudformation = aws_sdk_cloudformation::Client::new(&shared);
    let check = build_check(&config, move || Ok(CloudFormationValidator::new(cloudformation)))?;
    Ok(AppContext::new(
        config,
        Arc::new(S3Store::new(aws_sdk_s3::Client::new(&shared))),
        Arc::new(CodePipelineReporter::new(aws_sdk_codepipeline::Client::new(&shared))),
        check,
    ))
}

/// Lambda entry: every outcome is reported to CodePipeline; only a failed report
/// call fails the invocation.
pub async fn handle_event(app: &AppContext, event: PipelineEvent, context: Context) -> Result<JobOutcome, Error> {
    debug!("[{}] handler starting: {:?}", context.request_id, event);
    let outcome = run_job(app, &event, &context.request_id).await?;
    Ok(outcome)
}
