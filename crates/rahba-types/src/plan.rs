//! Subscription plan types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EnumParseError;

/// Subscription plan levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    /// Standard plan - 1350 DA/mo
    Standard,
    /// Pro plan - 2500 DA/mo
    Pro,
}

impl Plan {
    /// Monthly price in Algerian dinars
    ///
    /// Prices are fixed server-side; client-supplied amounts are never
    /// trusted.
    pub fn monthly_price(&self) -> Decimal {
        match self {
            Self::Standard => dec!(1350),
            Self::Pro => dec!(2500),
        }
    }

    /// All known plans, in ascending price order
    pub const fn all() -> &'static [Plan] {
        &[Self::Standard, Self::Pro]
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "pro" => Ok(Self::Pro),
            _ => Err(EnumParseError::new("plan", s)),
        }
    }
}
