use super::ObjectStore;
use crate::{bucket::Bucket, error::StorageError, progress::ProgressTracker};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::StatusCode;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicU32, Ordering},
};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Bytes,
    pub content_type: String,
}

/// Object store kept in process memory.
///
/// `fail_next` makes the following puts fail with a transient error, to
/// exercise retries.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<(Bucket, String), StoredObject>>,
    failures: AtomicU32,
    puts: AtomicU32,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Number of put attempts, failed ones included
    pub fn put_attempts(&self) -> u32 {
        self.puts.load(Ordering::SeqCst)
    }

    pub async fn get(&self, bucket: Bucket, key: &str) -> Option<StoredObject> {
        self.objects
            .lock()
            .await
            .get(&(bucket, key.to_string()))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        body: Bytes,
        content_type: &str,
        progress: &ProgressTracker,
    ) -> Result<(), StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);

        let total = body.len() as u64;
        progress.report(total / 2, total);

        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StorageError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "injected failure".into(),
            });
        }

        progress.report(total, total);
        self.objects.lock().await.insert(
            (bucket, key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> Result<(), StorageError> {
        self.objects
            .lock()
            .await
            .remove(&(bucket, key.to_string()))
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!("memory://{bucket}/{key}")
    }
}
