use super::ObjectStore;
use crate::{bucket::Bucket, error::StorageError, progress::ProgressTracker};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use log::debug;
use reqwest::{
    Body, Client as HttpClient, Response, StatusCode, Url,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use std::{convert::Infallible, time::Duration};

/// Size of the pieces a body is streamed in
const CHUNK_SIZE: usize = 256 * 1024; // 256 KiB

const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Object store speaking the hosted storage REST API
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    /// Base endpoint, always ending in `/`
    endpoint: Url,
    client: HttpClient,
}

impl HttpObjectStore {
    pub fn new(endpoint: &str, api_key: &str) -> Result<Self, StorageError> {
        let mut endpoint = endpoint.trim().to_string();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| StorageError::Config(format!("bad endpoint {endpoint}: {e}")))?;

        Ok(Self {
            endpoint,
            client: build_http_client(api_key)?,
        })
    }

    fn object_url(&self, bucket: Bucket, key: &str) -> Result<Url, StorageError> {
        self.endpoint
            .join(&format!("storage/v1/object/{bucket}/{key}"))
            .map_err(|e| StorageError::Config(format!("bad object key {key}: {e}")))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn put(
        &self,
        bucket: Bucket,
        key: &str,
        body: Bytes,
        content_type: &str,
        progress: &ProgressTracker,
    ) -> Result<(), StorageError> {
        let url = self.object_url(bucket, key)?;
        let total = body.len() as u64;

        let chunks: Vec<Bytes> = (0..body.len())
            .step_by(CHUNK_SIZE)
            .map(|start| body.slice(start..(start + CHUNK_SIZE).min(body.len())))
            .collect();

        let tracker = progress.clone();
        let mut sent = 0u64;
        let stream = stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            tracker.report(sent, total);
            Ok::<_, Infallible>(chunk)
        });

        debug!("Uploading {total} bytes to {bucket}/{key}");
        let res = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(Body::wrap_stream(stream))
            .send()
            .await?;

        check_status(res, key).await
    }

    async fn delete(&self, bucket: Bucket, key: &str) -> Result<(), StorageError> {
        let url = self.object_url(bucket, key)?;
        let res = self.client.delete(url).send().await?;

        check_status(res, key).await
    }

    fn public_url(&self, bucket: Bucket, key: &str) -> String {
        format!("{}storage/v1/object/public/{bucket}/{key}", self.endpoint)
    }
}

async fn check_status(res: Response, key: &str) -> Result<(), StorageError> {
    let status = res.status();
    if status.is_success() {
        return Ok(());
    }
    if status == StatusCode::NOT_FOUND {
        return Err(StorageError::NotFound(key.to_string()));
    }

    let message = res.text().await.unwrap_or_default();
    Err(StorageError::Status { status, message })
}

fn build_http_client(api_key: &str) -> Result<HttpClient, StorageError> {
    let header = |value: String| {
        HeaderValue::from_str(&value)
            .map_err(|_| StorageError::Config("API key is not a valid header value".into()))
    };

    let mut headers = HeaderMap::new();
    headers.insert("apikey", header(api_key.to_string())?);
    headers.insert(AUTHORIZATION, header(format!("Bearer {api_key}"))?);

    Ok(HttpClient::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let store = HttpObjectStore::new("https://project.storage.example", "anon-key").unwrap();

        assert_eq!(
            store
                .object_url(Bucket::LessonFiles, "u/c/m/l/f.mp4")
                .unwrap()
                .as_str(),
            "https://project.storage.example/storage/v1/object/lesson-files/u/c/m/l/f.mp4"
        );
        assert_eq!(
            store.public_url(Bucket::CourseImages, "u/c/f.png"),
            "https://project.storage.example/storage/v1/object/public/course-images/u/c/f.png"
        );
    }

    #[test]
    fn test_endpoint_with_path_prefix() {
        let store = HttpObjectStore::new("http://localhost:54321/base/", "key").unwrap();
        assert_eq!(
            store.public_url(Bucket::LessonFiles, "k.pdf"),
            "http://localhost:54321/base/storage/v1/object/public/lesson-files/k.pdf"
        );
    }

    #[test]
    fn test_rejects_bad_configuration() {
        assert!(matches!(
            HttpObjectStore::new("not a url", "key"),
            Err(StorageError::Config(_))
        ));
        assert!(matches!(
            HttpObjectStore::new("https://storage.example", "bad\nkey"),
            Err(StorageError::Config(_))
        ));
    }
}
