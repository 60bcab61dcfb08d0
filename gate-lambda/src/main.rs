// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use cfn_pipeline_gate::config::GateConfig;
use cfn_pipeline_gate::event::PipelineEvent;
use cfn_pipeline_gate_lambda::{build_app_context, handle_event};
use lambda_runtime::{handler_fn, Context, Error};
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = GateConfig::from_env()?;
    SimpleLogger::new().with_level(config.log_level).init()?;

    let app = Arc::new(build_app_context(config).await?);
    let func = handler_fn(move |event: PipelineEvent, context: Context| {
        let app = Arc::clone(&app);
        async move { handle_event(&app, event, context).await }
    });
    lambda_runtime::run(func).await?;
    Ok(())
}
