//! Common test utilities for rahba-billing-core integration tests

pub mod mock_repos;

#[allow(unused_imports)]
pub use mock_repos::{
    FailingNotifier, MockPaymentRepository, MockSubscriptionRepository, MockTenantRepository,
    RecordingNotifier,
};
