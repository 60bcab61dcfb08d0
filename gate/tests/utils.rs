// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use cfn_pipeline_gate::checks::{TemplateValidator, ValidationIssue};
use cfn_pipeline_gate::event::PipelineEvent;
use cfn_pipeline_gate::reporter::JobReporter;
use cfn_pipeline_gate::store::{MemoryStore, ObjectStore};
use cfn_pipeline_gate::{Error, Result};
use zip::write::FileOptions;
use zip::ZipWriter;

pub const BUCKET: &str = "codepipeline-us-west-2-artifacts";
pub const KEY: &str = "Pipeline/Source/Artifact.zip";
pub const JOB_ID: &str = "11111111-abcd-1111-abcd-111111abcdef";
pub const REQUEST_ID: &str = "8476a536-e9f4-11e8-9739-2dfe598c3fcd";

pub const REQUIRED_TAGS: [&str; 6] = [
    "BillAccount",
    "BillDeptId",
    "BillFund",
    "DataClassification",
    "PrimaryContact",
    "ServiceName",
];

pub fn bundle(members: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in members {
        writer.start_file(*name, FileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn store_with(members: &[(&str, &str)]) -> MemoryStore {
    MemoryStore::new().with_object(BUCKET, KEY, bundle(members))
}

pub fn tagged_template(logical_id: &str, tags: &[&str]) -> String {
    let mut template = format!(
        "Resources:\n  {}:\n    Type: AWS::S3::Bucket\n    Properties:\n      Tags:\n",
        logical_id
    );
    for tag in tags {
        template.push_str(&format!("        - Key: {}\n          Value: x\n", tag));
    }
    template
}

pub fn event_json(artifacts: &str) -> String {
    format!(
        r#"{{"CodePipeline.job": {{"id": "{}", "accountId": "111111111111", "data": {{"inputArtifacts": {}, "outputArtifacts": []}}}}}}"#,
        JOB_ID, artifacts
    )
}

pub fn s3_event() -> PipelineEvent {
    PipelineEvent::from_json(&event_json(&format!(
        r#"[{{"name": "SourceOutput", "location": {{"type": "S3", "s3Location": {{"bucketName": "{}", "objectKey": "{}"}}}}}}]"#,
        BUCKET, KEY
    )))
    .unwrap()
}

pub fn empty_event() -> PipelineEvent {
    PipelineEvent::from_json(&event_json("[]")).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reported {
    Success(String, String),
    Failure(String, String),
}

#[derive(Default)]
pub struct RecordingReporter {
    pub reports: Mutex<Vec<Reported>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<Reported> {
        self.reports.lock().unwrap().clone()
    }

    pub fn only_report(&self) -> Reported {
        let reports = self.reports();
        assert_eq!(reports.len(), 1, "expected exactly one report, got {:?}", reports);
        reports[0].clone()
    }
}

#[async_trait]
impl JobReporter for RecordingReporter {
    async fn report_success(&self, job_id: &str, message: &str) -> Result<()> {
        self.reports
            .lock()
            .unwrap()
            .push(Reported::Success(job_id.to_string(), message.to_string()));
        Ok(())
    }

    async fn report_failure(&self, job_id: &str, message: &str) -> Result<()> {
        self.reports
            .lock()
            .unwrap()
            .push(Reported::Failure(job_id.to_string(), message.to_string()));
        Ok(())
    }
}

pub struct UnreachableReporter;

#[async_trait]
impl JobReporter for UnreachableReporter {
    async fn report_success(&self, _job_id: &str, _message: &str) -> Result<()> {
        Err(Error::ReportError(String::from("dispatch failure")))
    }

    async fn report_failure(&self, _job_id: &str, _message: &str) -> Result<()> {
        Err(Error::ReportError(String::from("dispatch failure")))
    }
}

/// Counts reads so tests can assert whether a fetch happened.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryStore,
    pub reads: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        CountingStore {
            inner,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for CountingStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_object(bucket, key).await
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.inner.put_object(bucket, key, body).await
    }
}

/// Rejects any template body containing `marker`.
pub struct MarkerValidator {
    pub marker: &'static str,
}

#[async_trait]
impl TemplateValidator for MarkerValidator {
    async fn validate(&self, template_body: &str) -> std::result::Result<(), ValidationIssue> {
        if template_body.contains(self.marker) {
            Err(ValidationIssue::rejected(format!(
                "Template format error: Unrecognized resource types: [{}]",
                self.marker
            )))
        } else {
            Ok(())
        }
    }
}
