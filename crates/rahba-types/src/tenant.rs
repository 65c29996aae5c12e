//! Tenant types

use serde::{Deserialize, Serialize};

use crate::error::EnumParseError;

/// Length of the trial period granted at merchant registration, in days
pub const TRIAL_DAYS: i64 = 7;

/// Maximum number of products a trial tenant may hold
pub const TRIAL_PRODUCT_LIMIT: i32 = 10;

/// Maximum number of orders a trial tenant may receive
pub const TRIAL_ORDER_LIMIT: i32 = 20;

/// Tenant lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Inside the time-boxed trial window with reduced quotas
    Trial,
    /// Paid and fully operational
    Active,
    /// Subscription lapsed, storefront disabled until payment
    Suspended,
    /// Trial ran out without payment
    Expired,
}

impl std::fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trial => write!(f, "trial"),
            Self::Active => write!(f, "active"),
            Self::Suspended => write!(f, "suspended"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for TenantStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trial" => Ok(Self::Trial),
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "expired" => Ok(Self::Expired),
            _ => Err(EnumParseError::new("tenant status", s)),
        }
    }
}
