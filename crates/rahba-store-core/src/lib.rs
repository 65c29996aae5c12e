//! Rahba Store Core - Storefront business logic
//!
//! Product catalog with collision-resistant slugs, trial quota
//! enforcement, server-priced checkout, the order status machine, and
//! delivery carriers with wilaya fee resolution.

pub mod catalog;
pub mod delivery;
pub mod error;
pub mod orders;
pub mod quota;

pub use catalog::*;
pub use delivery::*;
pub use error::*;
pub use orders::*;
pub use quota::*;
