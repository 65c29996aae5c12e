//! Order types

use serde::{Deserialize, Serialize};

use crate::error::EnumParseError;

/// Order fulfilment status
///
/// Legal transitions:
///
/// ```text
/// pending --> confirmed --> shipped --> delivered
/// pending --> cancelled
/// confirmed --> cancelled
/// ```
///
/// delivered and cancelled are terminal. Anything else is rejected at
/// the service layer before any write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Freshly checked out, awaiting merchant confirmation
    Pending,
    /// Merchant confirmed, preparing shipment
    Confirmed,
    /// Handed to a delivery company
    Shipped,
    /// Received by the customer
    Delivered,
    /// Cancelled by merchant or customer request
    Cancelled,
}

impl OrderStatus {
    /// Whether no further transition is allowed from this status
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether moving from `self` to `next` is a legal edge
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Confirmed, Self::Shipped)
                | (Self::Confirmed, Self::Cancelled)
                | (Self::Shipped, Self::Delivered)
        )
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Shipped => write!(f, "shipped"),
            Self::Delivered => write!(f, "delivered"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(EnumParseError::new("order status", s)),
        }
    }
}
