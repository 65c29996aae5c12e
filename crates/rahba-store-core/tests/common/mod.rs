//! Common test utilities for rahba-store-core integration tests

pub mod mock_repos;

#[allow(unused_imports)]
pub use mock_repos::{
    MockDeliveryZoneRepository, MockOrderRepository, MockProductRepository, MockTenantRepository,
};
