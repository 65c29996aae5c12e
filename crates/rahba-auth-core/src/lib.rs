//! Rahba Auth Core - Authentication business logic
//!
//! Password hashing, JWT access tokens, single-use refresh-token rotation,
//! and merchant registration (tenant provisioning).

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::*;
pub use error::*;
pub use password::{hash_password, verify_password};
pub use service::*;
pub use token::{
    decode_access_token, generate_refresh_token, hash_refresh_token, issue_access_token,
    AccessTokenClaims, AuthenticatedUser,
};
