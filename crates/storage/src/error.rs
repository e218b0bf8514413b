use crate::bucket::Bucket;
use models::policy::AccessDenied;
use reqwest::StatusCode;
use thiserror::Error;

/// A failed call to the object store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("storage responded with HTTP {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("invalid storage configuration: {0}")]
    Config(String),

    #[error("object {0} not found")]
    NotFound(String),
}

impl StorageError {
    /// Whether trying the same request again may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
            }
            Self::Config(_) | Self::NotFound(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("{content_type} files cannot be stored in {bucket}")]
    UnsupportedType {
        bucket: Bucket,
        content_type: String,
    },

    #[error("file is empty")]
    Empty,

    #[error("file of {size} bytes exceeds the {limit} byte limit of {bucket}")]
    TooLarge { bucket: Bucket, size: u64, limit: u64 },

    #[error("declared size of {declared} bytes does not match the {received} bytes received")]
    SizeMismatch { declared: u64, received: u64 },

    #[error(transparent)]
    Denied(#[from] AccessDenied),

    #[error("upload failed after {attempts} attempt(s): {source}")]
    Storage {
        attempts: u32,
        #[source]
        source: StorageError,
    },
}

impl UploadError {
    /// Rejections that happen before any bytes are sent
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType { .. }
                | Self::Empty
                | Self::TooLarge { .. }
                | Self::SizeMismatch { .. }
        )
    }
}
