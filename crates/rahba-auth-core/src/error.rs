//! Error types for authentication operations.

use thiserror::Error;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email/password combination is wrong. Deliberately vague so a
    /// caller cannot distinguish "no such account" from "bad password".
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account exists but has been deactivated.
    #[error("Account is disabled")]
    AccountDisabled,

    /// The token is malformed, has a bad signature, or is otherwise unusable.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token was valid once but its lifetime is over.
    #[error("Token has expired")]
    TokenExpired,

    /// No user matches the requested id.
    #[error("User not found")]
    UserNotFound,

    /// Another account already uses this email address.
    #[error("Email is already registered")]
    EmailTaken,

    /// Another store already claimed this subdomain.
    #[error("Subdomain is already taken")]
    SubdomainTaken,

    /// A request field failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Password hashing or verification failed internally.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Catch-all for internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// HTTP status code this error should map to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials | Self::InvalidToken(_) | Self::TokenExpired => 401,
            Self::AccountDisabled => 403,
            Self::UserNotFound => 404,
            Self::EmailTaken | Self::SubdomainTaken => 409,
            Self::InvalidInput(_) => 400,
            Self::Crypto(_) | Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Stable machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::AccountDisabled => "ACCOUNT_DISABLED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::SubdomainTaken => "SUBDOMAIN_TAKEN",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Crypto(_) => "CRYPTO_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<rahba_db::DbError> for AuthError {
    fn from(err: rahba_db::DbError) -> Self {
        // Registration races resolve at the unique index, not the pre-check.
        if let rahba_db::DbError::UniqueViolation { constraint } = &err {
            if constraint.contains("email") {
                return Self::EmailTaken;
            }
            if constraint.contains("subdomain") {
                return Self::SubdomainTaken;
            }
        }
        tracing::error!("Database error: {}", err);
        Self::Database(err.to_string())
    }
}
