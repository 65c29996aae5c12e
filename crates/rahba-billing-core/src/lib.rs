//! Rahba Billing Core - Subscription and payment business logic
//!
//! Fixed plan pricing, BaridiMob payment submission and admin review,
//! Telegram operator notifications, and the scheduled sweeps that expire
//! trials and lapsed subscriptions.

pub mod error;
pub mod notify;
pub mod service;
pub mod sweeps;

pub use error::*;
pub use notify::*;
pub use service::*;
pub use sweeps::*;
