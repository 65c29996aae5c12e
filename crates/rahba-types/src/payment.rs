//! Payment types

use serde::{Deserialize, Serialize};

use crate::error::EnumParseError;

/// Payment review status
///
/// Payments are created pending and decided exactly once by an admin;
/// rows are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Awaiting admin review
    Pending,
    /// Accepted; the subscription was activated
    Approved,
    /// Refused with a reason
    Rejected,
}

impl PaymentStatus {
    /// Whether an admin may still decide this payment
    pub const fn is_decidable(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(EnumParseError::new("payment status", s)),
        }
    }
}
