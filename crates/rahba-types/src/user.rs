//! User types

use serde::{Deserialize, Serialize};

use crate::error::EnumParseError;

/// Account role carried in the JWT role claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Store owner or staff, always bound to a tenant
    Merchant,
    /// Platform administrator, not bound to any tenant
    SuperAdmin,
    /// Storefront customer account
    Customer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Merchant => write!(f, "merchant"),
            Self::SuperAdmin => write!(f, "super_admin"),
            Self::Customer => write!(f, "customer"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "merchant" => Ok(Self::Merchant),
            "super_admin" | "superadmin" => Ok(Self::SuperAdmin),
            "customer" => Ok(Self::Customer),
            _ => Err(EnumParseError::new("role", s)),
        }
    }
}
