// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod check;

use clap::error::ErrorKind;
use std::io::Write;

use crate::errors::{Error, Result};
use crate::utils::writer::Writer;

//
// Constants
//
// Application metadata
pub const APP_NAME: &str = "cfn-pipeline-gate";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
// Commands
pub const CHECK: &str = "check";
// Arguments for check
pub const KIND: (&str, char) = ("kind", 'k');
pub const ARCHIVE: (&str, char) = ("archive", 'a');
pub const RULES: (&str, char) = ("rules", 'r');
pub const REGIONS: (&str, char) = ("regions", 'g');
pub const REQUIRED_TAGS: (&str, char) = ("required-tags", 't');
pub const REPORT_DIR: (&str, char) = ("report-dir", 'o');

pub const FAILURE_STATUS_CODE: i32 = 19;
pub const SUCCESS_STATUS_CODE: i32 = 0;
pub const ERROR_STATUS_CODE: i32 = 5;

pub(crate) fn app() -> clap::Command {
    clap::Command::new(APP_NAME)
        .version(APP_VERSION)
        .about(
            r#"
  Runs a CloudFormation pipeline gate against a local zipped template bundle.
  Every member whose name contains .yaml is checked with the selected check
  (lint, tags or validate) and a single PASS/FAIL result is printed."#,
        )
        .arg_required_else_help(true)
        .subcommand(check::command())
}

/// Parses `args` (including the program name) and runs the selected command,
/// returning the process exit code.
pub async fn run_cli<I, T>(args: I, mut writer: Writer) -> Result<(i32, Writer)>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let matches = match app().try_get_matches_from(args) {
        Ok(matches) => matches,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                write!(writer, "{}", e.render())?;
                return Ok((SUCCESS_STATUS_CODE, writer));
            }
            _ => return Err(Error::ConfigError(e.to_string())),
        },
    };

    match matches.subcommand() {
        Some((CHECK, value)) => check::execute(value, writer).await,
        _ => Err(Error::ConfigError(app().render_usage().to_string())),
    }
}
