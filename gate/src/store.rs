// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use log::{error, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::{Error, Result};

/// Object storage as seen by the gate: whole-object reads and writes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;

    /// Where an object can be found, as shown to whoever reads the job result.
    fn location(&self, bucket: &str, key: &str) -> String {
        format!("s3://{}/{}", bucket, key)
    }
}

pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        S3Store { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| storage_error(bucket, key, err.to_string()))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|err| storage_error(bucket, key, err.to_string()))?;
        Ok(data.into_bytes().to_vec())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body.into())
            .content_type("application/json")
            .send()
            .await
            .map_err(|err| {
                error!("failed to upload '{}' to S3 with error: {}", key, err);
                storage_error(bucket, key, err.to_string())
            })?;

        info!("Successfully stored s3://{}/{}", bucket, key);
        Ok(())
    }
}

fn storage_error(bucket: &str, key: &str, message: String) -> Error {
    Error::StorageError {
        bucket: bucket.to_string(),
        key: key.to_string(),
        message,
    }
}

/// In-process store keyed by (bucket, key).
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, bucket: &str, key: &str, body: Vec<u8>) -> Self {
        self.insert(bucket, key, body);
        self
    }

    pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert((bucket.to_string(), key.to_string()), body);
        }
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .ok()
            .and_then(|objects| objects.get(&(bucket.to_string(), key.to_string())).cloned())
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys = match self.objects.lock() {
            Ok(objects) => objects
                .keys()
                .filter(|(b, _)| b == bucket)
                .map(|(_, k)| k.clone())
                .collect::<Vec<String>>(),
            Err(_) => vec![],
        };
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.object(bucket, key).ok_or_else(|| {
            storage_error(bucket, key, String::from("NoSuchKey: The specified key does not exist."))
        })
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.insert(bucket, key, body);
        Ok(())
    }
}

/// Local directories standing in for buckets. Backs the CLI: the bundle is read
/// from its own directory and run reports land in the report directory.
#[derive(Debug, Default)]
pub struct FileStore {
    buckets: HashMap<String, PathBuf>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(mut self, bucket: &str, dir: &Path) -> Self {
        self.buckets.insert(bucket.to_string(), dir.to_path_buf());
        self
    }

    fn path_of(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        self.buckets
            .get(bucket)
            .map(|dir| dir.join(key))
            .ok_or_else(|| storage_error(bucket, key, String::from("NoSuchBucket: no directory configured")))
    }
}

#[async_trait]
impl ObjectStore for FileStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.path_of(bucket, key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|err| storage_error(bucket, key, format!("{}: {}", path.display(), err)))
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let path = self.path_of(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| storage_error(bucket, key, err.to_string()))?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|err| storage_error(bucket, key, err.to_string()))?;
        info!("Successfully stored {}", path.display());
        Ok(())
    }

    fn location(&self, bucket: &str, key: &str) -> String {
        match self.path_of(bucket, key) {
            Ok(path) => path.display().to_string(),
            Err(_) => format!("{}/{}", bucket, key),
        }
    }
}
