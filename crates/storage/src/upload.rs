use crate::{
    bucket::{Bucket, UploadRequest},
    error::UploadError,
    key::object_key,
    progress::ProgressTracker,
    store::ObjectStore,
};
use bytes::Bytes;
use log::{info, warn};
use models::{
    media::MediaKind,
    policy::{Action, Resource, authorize},
    tree::Content,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total tries, the first one included
    pub attempts: u32,
    /// Delay before the second try; doubles after every failure
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

/// A stored upload and where to fetch it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedObject {
    pub bucket: Bucket,
    pub key: String,
    pub url: String,
    pub name: String,
    pub content_type: String,
    pub size: u64,
}

impl UploadedObject {
    /// Content reference for a lesson; `None` for course images
    pub fn to_content(&self) -> Option<Content> {
        if self.bucket != Bucket::LessonFiles {
            return None;
        }

        Some(Content {
            name: self.name.clone(),
            kind: MediaKind::classify(&self.content_type)?,
            url: self.url.clone(),
            size: self.size,
        })
    }
}

/// Validates, names and transfers files into an [`ObjectStore`]
#[derive(Clone)]
pub struct Uploader {
    store: Arc<dyn ObjectStore>,
    retry: RetryPolicy,
}

impl Uploader {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Stores `body` for `request`.
    ///
    /// Nothing is sent when the request fails validation. Transient storage
    /// errors are retried; the tracker ends in `Completed` or `Failed`
    /// either way.
    pub async fn upload(
        &self,
        request: &UploadRequest,
        body: Bytes,
        tracker: &ProgressTracker,
    ) -> Result<UploadedObject, UploadError> {
        let result = self.try_upload(request, body, tracker).await;
        match &result {
            Ok(_) => tracker.complete(),
            Err(_) => tracker.fail(),
        };
        result
    }

    async fn try_upload(
        &self,
        request: &UploadRequest,
        body: Bytes,
        tracker: &ProgressTracker,
    ) -> Result<UploadedObject, UploadError> {
        request.validate(body.len() as u64)?;

        let bucket = request.target.bucket();
        let key = object_key(
            request.owner,
            &request.target,
            &request.file_name,
            &request.content_type,
        );
        authorize(
            Some(request.owner),
            Resource::Object { key: &key },
            Action::Write,
        )?;

        let mut attempt = 1;
        let mut delay = self.retry.base_delay;
        loop {
            match self
                .store
                .put(bucket, &key, body.clone(), &request.content_type, tracker)
                .await
            {
                Ok(()) => break,
                Err(e) if e.is_transient() && attempt < self.retry.attempts => {
                    warn!("Upload of {key} failed on attempt {attempt}, retrying: {e}");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(UploadError::Storage {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }

        info!("Stored {} bytes at {bucket}/{key}", body.len());
        Ok(UploadedObject {
            url: self.store.public_url(bucket, &key),
            bucket,
            key,
            name: request.file_name.clone(),
            content_type: request.content_type.clone(),
            size: request.size,
        })
    }

    /// Deletes an object the caller uploaded
    pub async fn remove(&self, caller: Uuid, bucket: Bucket, key: &str) -> Result<(), UploadError> {
        authorize(Some(caller), Resource::Object { key }, Action::Write)?;

        self.store
            .delete(bucket, key)
            .await
            .map_err(|source| UploadError::Storage {
                attempts: 1,
                source,
            })?;

        info!("Removed {bucket}/{key}");
        Ok(())
    }
}
