//! Common test utilities for rahba-auth-core integration tests

pub mod mock_repos;

#[allow(unused_imports)]
pub use mock_repos::{MockSessionRepository, MockTenantRepository, MockUserRepository};
