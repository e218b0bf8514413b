pub mod http;
pub mod memory;

use crate::{bucket::Bucket, error::StorageError, progress::ProgressTracker};
use async_trait::async_trait;
use bytes::Bytes;

/// A blob store with public read access
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `body` under `key`, reporting transfer progress on `progress`
    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        body: Bytes,
        content_type: &str,
        progress: &ProgressTracker,
    ) -> Result<(), StorageError>;

    async fn delete(&self, bucket: Bucket, key: &str) -> Result<(), StorageError>;

    /// URL anyone can fetch the object from
    fn public_url(&self, bucket: Bucket, key: &str) -> String;
}
