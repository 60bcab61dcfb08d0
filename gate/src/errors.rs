// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use std::string::FromUtf8Error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error parsing incoming JSON context {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Error parsing template YAML {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Error reading artifact archive {0}")]
    ArchiveError(#[from] zip::result::ZipError),
    #[error("I/O error when reading {0}")]
    IoError(#[from] std::io::Error),
    #[error("Archive member `{member}` is not valid UTF-8: {source}")]
    DecodeError {
        member: String,
        #[source]
        source: FromUtf8Error,
    },
    #[error("Could not access `{key}` in bucket `{bucket}`: {message}")]
    StorageError {
        bucket: String,
        key: String,
        message: String,
    },
    #[error("No input artifacts given")]
    NoInputArtifacts,
    #[error("Unsupported artifact location type `{0}`")]
    UnsupportedLocation(String),
    #[error("Input artifact is incomplete: {0}")]
    IncompleteArtifact(String),
    #[error("Template is not a CloudFormation document: {0}")]
    TemplateError(String),
    #[error("Rule engine failed: {0}")]
    RuleEngineError(String),
    #[error("Failed to report job result: {0}")]
    ReportError(String),
    #[error("{0}")]
    ConfigError(String),
}

pub type Result<R> = std::result::Result<R, Error>;
