//! Billing errors

use thiserror::Error;

/// Billing errors
#[derive(Error, Debug)]
pub enum BillingError {
    /// Subscription not found
    #[error("subscription not found")]
    SubscriptionNotFound,

    /// Payment not found
    #[error("payment not found")]
    PaymentNotFound,

    /// Payment was already approved or rejected
    #[error("payment already decided")]
    PaymentAlreadyDecided,

    /// Invalid plan
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// Invalid submission or filter input
    #[error("validation error: {0}")]
    Validation(String),

    /// Notifier delivery error
    #[error("notify error: {0}")]
    Notify(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rahba_db::DbError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl BillingError {
    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SubscriptionNotFound | Self::PaymentNotFound)
    }

    /// Check if this is a conflict with an earlier decision
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::PaymentAlreadyDecided)
    }

    /// Check if this is a rejected input
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::InvalidPlan(_) | Self::Validation(_))
    }
}
