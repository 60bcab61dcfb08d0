// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The CodePipeline job event a gate Lambda is invoked with.

use serde::{Deserialize, Serialize};

use crate::artifacts::ArtifactRef;
use crate::errors::{Error, Result};

pub(crate) const S3_LOCATION_TYPE: &str = "S3";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineEvent {
    #[serde(rename = "CodePipeline.job")]
    pub job: Job,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub data: JobData,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobData {
    #[serde(default)]
    pub action_configuration: Option<ActionConfiguration>,
    #[serde(default)]
    pub input_artifacts: Vec<Artifact>,
    #[serde(default)]
    pub output_artifacts: Vec<Artifact>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ActionConfiguration {
    #[serde(default)]
    pub configuration: ActionConfigurationValues,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ActionConfigurationValues {
    #[serde(rename = "FunctionName", default)]
    pub function_name: Option<String>,
    #[serde(rename = "UserParameters", default)]
    pub user_parameters: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Artifact {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<ArtifactLocation>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactLocation {
    #[serde(rename = "type", default)]
    pub location_type: String,
    #[serde(default)]
    pub s3_location: Option<S3Location>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Location {
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub object_key: String,
}

impl Artifact {
    /// The S3 object this artifact lives in. Other location types are not supported.
    ///
    /// Every location field is optional on the wire so that a partial artifact still
    /// reaches the handler and gets a failure report instead of a rejected invoke.
    pub fn s3_ref(&self) -> Result<ArtifactRef> {
        let location = self
            .location
            .as_ref()
            .ok_or_else(|| self.incomplete("no location"))?;
        match (&*location.location_type, &location.s3_location) {
            (S3_LOCATION_TYPE, Some(s3)) if s3.bucket_name.is_empty() => {
                Err(self.incomplete("no bucketName in s3Location"))
            }
            (S3_LOCATION_TYPE, Some(s3)) if s3.object_key.is_empty() => {
                Err(self.incomplete("no objectKey in s3Location"))
            }
            (S3_LOCATION_TYPE, Some(s3)) => Ok(ArtifactRef::new(&s3.bucket_name, &s3.object_key)),
            (S3_LOCATION_TYPE, None) => Err(self.incomplete("S3 location without an s3Location")),
            ("", _) => Err(self.incomplete("no location type")),
            (other, _) => Err(Error::UnsupportedLocation(other.to_string())),
        }
    }

    fn incomplete(&self, what: &str) -> Error {
        Error::IncompleteArtifact(format!(
            "artifact `{}` has {}",
            self.name.as_deref().unwrap_or("<unnamed>"),
            what
        ))
    }
}

impl PipelineEvent {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn input_artifacts(&self) -> &[Artifact] {
        &self.job.data.input_artifacts
    }
}
