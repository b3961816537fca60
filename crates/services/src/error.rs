use thiserror::Error;

use crate::dao::base::DaoError;

/// Business-level failures shared by every service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} has expired")]
    Expired(String),
    #[error("{0} is out of stock")]
    OutOfStock(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// A concurrent writer won the race. Retryable.
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Validation: {0}")]
    Validation(String),
    #[error("Upstream failure: {0}")]
    Upstream(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(what: impl Into<String>) -> Self {
        ServiceError::NotFound(what.into())
    }
}

impl From<DaoError> for ServiceError {
    fn from(err: DaoError) -> Self {
        match err {
            DaoError::NotFound => ServiceError::NotFound("Resource".to_string()),
            DaoError::DuplicateKey(msg) => ServiceError::Conflict(msg),
            DaoError::Mongo(e) => ServiceError::Upstream(e.to_string()),
            DaoError::BsonSer(e) => ServiceError::Upstream(e.to_string()),
            DaoError::BsonDe(e) => ServiceError::Upstream(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Map a DAO `NotFound` to a named entity, passing other errors through.
pub(crate) trait DaoResultExt<T> {
    fn or_not_found(self, what: &str) -> ServiceResult<T>;
}

impl<T> DaoResultExt<T> for Result<T, DaoError> {
    fn or_not_found(self, what: &str) -> ServiceResult<T> {
        self.map_err(|e| match e {
            DaoError::NotFound => ServiceError::not_found(what),
            other => other.into(),
        })
    }
}
