//! Subscription types

use serde::{Deserialize, Serialize};

use crate::error::EnumParseError;

/// Subscription lifecycle status
///
/// Normal progression is trial, then pending_payment once a proof is
/// submitted, then active on admin approval. The expiry sweep moves
/// active subscriptions to expired when their period ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// In the registration trial window
    Trial,
    /// Payment proof submitted, awaiting admin review
    PendingPayment,
    /// Approved and inside a paid period
    Active,
    /// Paid period or trial ran out
    Expired,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trial => write!(f, "trial"),
            Self::PendingPayment => write!(f, "pending_payment"),
            Self::Active => write!(f, "active"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trial" => Ok(Self::Trial),
            "pending_payment" => Ok(Self::PendingPayment),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            _ => Err(EnumParseError::new("subscription status", s)),
        }
    }
}
