// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! CI/CD pipeline gates for CloudFormation template bundles.
//!
//! A gate fetches a zipped template bundle from S3, runs one check over every
//! YAML template in it (rule engine lint, required tags or remote validation)
//! and reports a single pass/fail result back to CodePipeline.

pub mod artifacts;
pub mod checks;
pub mod config;
pub mod context;
pub mod errors;
pub mod event;
pub mod pipeline;
pub mod reporter;
pub mod results;
pub mod store;
pub mod template;
pub mod utils;

pub(crate) mod commands;

pub use crate::context::{build_check, AppContext};
pub use crate::errors::{Error, Result};
pub use crate::pipeline::{run_job, run_pipeline};

pub use crate::commands::{
    run_cli, APP_NAME, APP_VERSION, ERROR_STATUS_CODE, FAILURE_STATUS_CODE, SUCCESS_STATUS_CODE,
};
