//! Error types for the Rahba API service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use rahba_auth_core::AuthError;
use rahba_billing_core::BillingError;
use rahba_store_core::StoreError;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Billing(#[from] BillingError),

    #[error("Database error")]
    Database(#[from] rahba_db::DbError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        let code = match self {
            Self::BadRequest(_) => 400,
            Self::Auth(e) => e.status_code(),
            Self::Store(e) => e.status_code(),
            Self::Billing(e) => billing_status(e),
            Self::Database(rahba_db::DbError::NotFound) => 404,
            Self::Database(rahba_db::DbError::UniqueViolation { .. }) => 409,
            Self::Database(_) => 500,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Auth(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
            Self::Billing(e) => billing_error_code(e),
            Self::Database(rahba_db::DbError::NotFound) => "NOT_FOUND",
            Self::Database(rahba_db::DbError::UniqueViolation { .. }) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

fn billing_status(err: &BillingError) -> u16 {
    match err {
        BillingError::SubscriptionNotFound | BillingError::PaymentNotFound => 404,
        BillingError::PaymentAlreadyDecided => 409,
        BillingError::InvalidPlan(_) | BillingError::Validation(_) => 400,
        BillingError::Notify(_) => 502,
        BillingError::Database(_) | BillingError::Internal(_) => 500,
    }
}

fn billing_error_code(err: &BillingError) -> &'static str {
    match err {
        BillingError::SubscriptionNotFound => "SUBSCRIPTION_NOT_FOUND",
        BillingError::PaymentNotFound => "PAYMENT_NOT_FOUND",
        BillingError::PaymentAlreadyDecided => "PAYMENT_ALREADY_DECIDED",
        BillingError::InvalidPlan(_) => "INVALID_PLAN",
        BillingError::Validation(_) => "VALIDATION_ERROR",
        BillingError::Notify(_) => "UPSTREAM_ERROR",
        BillingError::Database(_) => "DATABASE_ERROR",
        BillingError::Internal(_) => "INTERNAL_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Internal API error");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
