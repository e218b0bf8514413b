use models::{policy::AccessDenied, tree::TreeError};
use sea_orm::DbErr;
use thiserror::Error;

/// Errors returned by the services in this crate
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was rejected before touching the database
    #[error("invalid course tree: {0}")]
    InvalidTree(#[from] TreeError),
    #[error("invalid input: {0}")]
    Invalid(String),
    /// The caller does not own the rows it tried to change
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The statement or the transaction failed; nothing was committed
    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<AccessDenied> for ServiceError {
    fn from(denied: AccessDenied) -> Self {
        Self::Forbidden(denied.to_string())
    }
}
