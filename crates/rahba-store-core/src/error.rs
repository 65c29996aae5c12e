//! Error types for storefront operations.

use thiserror::Error;

/// Errors that can occur in catalog, checkout, and order handling.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A request field or state transition failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The requested record does not exist (within the caller's tenant).
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The write lost to a concurrent change or a unique index.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A plan or trial limit blocks the operation.
    #[error("{0}")]
    LimitReached(String),

    /// An upstream delivery carrier failed or answered garbage.
    #[error("Delivery provider error: {0}")]
    Provider(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Catch-all for internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// HTTP status code this error should map to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::LimitReached(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Provider(_) => 502,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::LimitReached(_) => "LIMIT_REACHED",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Provider(_) => "PROVIDER_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<rahba_db::DbError> for StoreError {
    fn from(err: rahba_db::DbError) -> Self {
        match err {
            rahba_db::DbError::UniqueViolation { constraint } => {
                Self::Conflict(format!("duplicate value ({})", constraint))
            }
            rahba_db::DbError::NotFound => Self::NotFound("Record"),
            other => {
                tracing::error!("Database error: {}", other);
                Self::Database(other.to_string())
            }
        }
    }
}
