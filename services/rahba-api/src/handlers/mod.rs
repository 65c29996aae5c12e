//! REST API handlers

pub mod admin;
pub mod auth;
pub mod delivery;
pub mod health;
pub mod limits;
pub mod orders;
pub mod products;
pub mod shared;
pub mod subscription;

pub use admin::*;
pub use auth::*;
pub use delivery::*;
pub use health::*;
pub use limits::*;
pub use orders::*;
pub use products::*;
pub use subscription::*;
