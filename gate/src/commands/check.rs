// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use clap::{Arg, ArgMatches};
use std::path::PathBuf;
use std::str::FromStr;

use crate::checks::{CheckKind, CloudFormationValidator};
use crate::commands::{
    ARCHIVE, CHECK, FAILURE_STATUS_CODE, KIND, REGIONS, REPORT_DIR, REQUIRED_TAGS, RULES,
    SUCCESS_STATUS_CODE,
};
use crate::config::{split_list, GateConfig};
use crate::context::build_check;
use crate::errors::{Error, Result};
use crate::event::{Artifact, ArtifactLocation, Job, JobData, PipelineEvent, S3Location, S3_LOCATION_TYPE};
use crate::pipeline::run_pipeline;
use crate::reporter::ConsoleReporter;
use crate::store::FileStore;
use crate::utils::writer::Writer;

const LOCAL_BUCKET: &str = "local";
const LOCAL_REPORT_BUCKET: &str = "local-reports";
const LOCAL_JOB_ID: &str = "local";

pub(crate) fn command() -> clap::Command {
    clap::Command::new(CHECK)
        .about("Checks every template in a zipped bundle and prints PASS or FAIL")
        .arg(
            Arg::new(KIND.0)
                .long(KIND.0)
                .short(KIND.1)
                .value_parser(["lint", "tags", "validate"])
                .default_value("lint")
                .help("Check to run against every template"),
        )
        .arg(
            Arg::new(ARCHIVE.0)
                .long(ARCHIVE.0)
                .short(ARCHIVE.1)
                .required(true)
                .help("Zip bundle holding the templates"),
        )
        .arg(
            Arg::new(RULES.0)
                .long(RULES.0)
                .short(RULES.1)
                .help("Directory of Guard rule files for the lint check. Built-in rules are used when absent"),
        )
        .arg(
            Arg::new(REGIONS.0)
                .long(REGIONS.0)
                .short(REGIONS.1)
                .help("Comma separated regions the lint check evaluates against"),
        )
        .arg(
            Arg::new(REQUIRED_TAGS.0)
                .long(REQUIRED_TAGS.0)
                .short(REQUIRED_TAGS.1)
                .help("Comma separated tag keys every resource must carry"),
        )
        .arg(
            Arg::new(REPORT_DIR.0)
                .long(REPORT_DIR.0)
                .short(REPORT_DIR.1)
                .help("Directory to write the full JSON run report into"),
        )
}

fn config_from(args: &ArgMatches) -> Result<GateConfig> {
    let mut config = GateConfig::default();
    if let Some(kind) = args.get_one::<String>(KIND.0) {
        config.check = CheckKind::from_str(kind)?;
    }
    if let Some(rules) = args.get_one::<String>(RULES.0) {
        config.rules_dir = Some(PathBuf::from(rules));
    }
    if let Some(regions) = args.get_one::<String>(REGIONS.0).map(|r| split_list(r)) {
        if !regions.is_empty() {
            config.lint_regions = regions;
        }
    }
    if let Some(tags) = args.get_one::<String>(REQUIRED_TAGS.0).map(|t| split_list(t)) {
        if !tags.is_empty() {
            config.required_tags = tags;
        }
    }
    if args.get_one::<String>(REPORT_DIR.0).is_some() {
        config.report_bucket = Some(LOCAL_REPORT_BUCKET.to_string());
        config.report_prefix = String::new();
    }
    Ok(config)
}

fn local_event(key: &str) -> PipelineEvent {
    PipelineEvent {
        job: Job {
            id: LOCAL_JOB_ID.to_string(),
            account_id: None,
            data: JobData {
                input_artifacts: vec![Artifact {
                    name: Some(key.to_string()),
                    location: Some(ArtifactLocation {
                        location_type: S3_LOCATION_TYPE.to_string(),
                        s3_location: Some(S3Location {
                            bucket_name: LOCAL_BUCKET.to_string(),
                            object_key: key.to_string(),
                        }),
                    }),
                }],
                ..JobData::default()
            },
        },
    }
}

pub(crate) async fn execute(args: &ArgMatches, writer: Writer) -> Result<(i32, Writer)> {
    let config = config_from(args)?;
    let archive = args
        .get_one::<String>(ARCHIVE.0)
        .map(PathBuf::from)
        .ok_or_else(|| Error::ConfigError(format!("--{} is required", ARCHIVE.0)))?;
    if !archive.is_file() {
        return Err(Error::ConfigError(format!(
            "archive `{}` does not exist",
            archive.display()
        )));
    }
    let key = archive
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| Error::ConfigError(format!("`{}` is not a file", archive.display())))?;
    let archive_dir = archive
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut store = FileStore::new().with_bucket(LOCAL_BUCKET, &archive_dir);
    if let Some(dir) = args.get_one::<String>(REPORT_DIR.0).map(PathBuf::from) {
        store = store.with_bucket(LOCAL_REPORT_BUCKET, &dir);
    }

    let validator = match config.check {
        CheckKind::Validate => {
            let shared = aws_config::load_from_env().await;
            Some(CloudFormationValidator::new(aws_sdk_cloudformation::Client::new(&shared)))
        }
        _ => None,
    };
    let check = build_check(&config, move || {
        validator.ok_or_else(|| Error::ConfigError(String::from("no validator configured")))
    })?;

    let reporter = ConsoleReporter::new(writer);
    let outcome = run_pipeline(
        check.as_ref(),
        &store,
        &reporter,
        &config,
        &local_event(&key),
        LOCAL_JOB_ID,
    )
    .await?;

    let code = if outcome.is_success() {
        SUCCESS_STATUS_CODE
    } else {
        FAILURE_STATUS_CODE
    };
    Ok((code, reporter.into_writer()))
}
