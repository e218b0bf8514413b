use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use database::error::ServiceError;
use log::error;
use sea_orm::DbErr;
use serde_json::json;
use storage::{StorageError, UploadError};

/// An error response: status code plus a message for the client
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(what: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    fn internal(e: impl std::fmt::Display) -> Self {
        error!("Internal error: {e}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::InvalidTree(_) | ServiceError::Invalid(_) => {
                Self::bad_request(e.to_string())
            }
            ServiceError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, e.to_string()),
            ServiceError::NotFound(what) => Self::not_found(what),
            ServiceError::Db(e) => Self::internal(e),
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(e: DbErr) -> Self {
        Self::internal(e)
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match &e {
            UploadError::TooLarge { .. } => Self::new(StatusCode::PAYLOAD_TOO_LARGE, e.to_string()),
            UploadError::UnsupportedType { .. } => {
                Self::new(StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string())
            }
            UploadError::Empty | UploadError::SizeMismatch { .. } => {
                Self::bad_request(e.to_string())
            }
            UploadError::Denied(_) => Self::new(StatusCode::FORBIDDEN, e.to_string()),
            UploadError::Storage {
                source: StorageError::NotFound(key),
                ..
            } => Self::not_found(&format!("object {key}")),
            UploadError::Storage { source, .. } if source.is_transient() => {
                error!("Storage unavailable: {e}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage is unavailable, try the upload again",
                )
            }
            UploadError::Storage { .. } => {
                error!("Storage rejected upload: {e}");
                Self::new(StatusCode::BAD_GATEWAY, e.to_string())
            }
        }
    }
}
