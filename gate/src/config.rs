// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use log::LevelFilter;
use std::path::PathBuf;
use std::str::FromStr;

use crate::checks::{CheckKind, DEFAULT_REQUIRED_TAGS};
use crate::errors::{Error, Result};

pub const CHECK: &str = "GATE_CHECK";
pub const LINT_REGIONS: &str = "GATE_LINT_REGIONS";
pub const REQUIRED_TAGS: &str = "GATE_REQUIRED_TAGS";
pub const RULES_DIR: &str = "GATE_RULES_DIR";
pub const REPORT_BUCKET: &str = "GATE_REPORT_BUCKET";
pub const REPORT_PREFIX: &str = "GATE_REPORT_PREFIX";
pub const LOG_LEVEL: &str = "GATE_LOG_LEVEL";

pub const DEFAULT_LINT_REGION: &str = "us-west-2";
pub const DEFAULT_REPORT_PREFIX: &str = "gate-reports/";

#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    pub check: CheckKind,
    pub lint_regions: Vec<String>,
    pub required_tags: Vec<String>,
    pub rules_dir: Option<PathBuf>,
    pub report_bucket: Option<String>,
    pub report_prefix: String,
    pub log_level: LevelFilter,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            check: CheckKind::Lint,
            lint_regions: vec![DEFAULT_LINT_REGION.to_string()],
            required_tags: DEFAULT_REQUIRED_TAGS.iter().map(|t| t.to_string()).collect(),
            rules_dir: None,
            report_bucket: None,
            report_prefix: DEFAULT_REPORT_PREFIX.to_string(),
            log_level: LevelFilter::Info,
        }
    }
}

impl GateConfig {
    pub fn from_env() -> Result<Self> {
        GateConfig::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = GateConfig::default();

        let check = match value(CHECK) {
            Some(check) => CheckKind::from_str(&check)?,
            None => defaults.check,
        };
        let log_level = match value(LOG_LEVEL) {
            Some(level) => LevelFilter::from_str(&level).map_err(|_| {
                Error::ConfigError(format!("{} has an unknown log level `{}`", LOG_LEVEL, level))
            })?,
            None => defaults.log_level,
        };

        Ok(GateConfig {
            check,
            lint_regions: value(LINT_REGIONS)
                .map(|v| split_list(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.lint_regions),
            required_tags: value(REQUIRED_TAGS)
                .map(|v| split_list(&v))
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.required_tags),
            rules_dir: value(RULES_DIR).map(PathBuf::from),
            report_bucket: value(REPORT_BUCKET),
            report_prefix: value(REPORT_PREFIX).unwrap_or(defaults.report_prefix),
            log_level,
        })
    }
}

pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
