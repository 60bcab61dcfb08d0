// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use log::debug;
use serde::Serialize;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::errors::{Error, Result};
use crate::store::ObjectStore;

pub(crate) const TEMPLATE_MARKER: &str = ".yaml";

/// Location of a zipped template bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    pub bucket: String,
    pub key: String,
}

impl ArtifactRef {
    pub fn new(bucket: &str, key: &str) -> Self {
        ArtifactRef {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

impl std::fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// One template read out of the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateUnit {
    pub name: String,
    pub text: String,
}

pub async fn fetch_templates<S>(store: &S, artifact: &ArtifactRef) -> Result<Vec<TemplateUnit>>
where
    S: ObjectStore + ?Sized,
{
    let data = store.get_object(&artifact.bucket, &artifact.key).await?;
    debug!("Read {} bytes from {}", data.len(), artifact);
    read_templates(data)
}

/// Extracts every member whose name contains `.yaml`, in archive order.
pub fn read_templates(data: Vec<u8>) -> Result<Vec<TemplateUnit>> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut templates = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut member = archive.by_index(index)?;
        let name = member.name().to_string();
        if member.is_dir() || !name.contains(TEMPLATE_MARKER) {
            debug!("Skipping archive member {}", name);
            continue;
        }

        // the declared size comes from the archive itself and is not trusted
        let mut bytes = Vec::new();
        member.read_to_end(&mut bytes)?;
        let text = String::from_utf8(bytes).map_err(|source| Error::DecodeError {
            member: name.clone(),
            source,
        })?;
        templates.push(TemplateUnit { name, text });
    }
    Ok(templates)
}
