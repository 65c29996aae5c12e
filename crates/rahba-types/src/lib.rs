//! Rahba Types - Shared domain types
//!
//! Status enums and plan definitions shared by every Rahba crate. All
//! status and plan values are closed enums parsed case-insensitively at
//! the boundary; free-text values never reach persistence.

pub mod error;
pub mod order;
pub mod payment;
pub mod plan;
pub mod subscription;
pub mod tenant;
pub mod user;

pub use error::EnumParseError;
pub use order::OrderStatus;
pub use payment::PaymentStatus;
pub use plan::Plan;
pub use subscription::SubscriptionStatus;
pub use tenant::{TenantStatus, TRIAL_DAYS, TRIAL_ORDER_LIMIT, TRIAL_PRODUCT_LIMIT};
pub use user::Role;
