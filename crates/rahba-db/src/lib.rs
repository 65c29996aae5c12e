//! Rahba DB - Database abstractions
//!
//! SQLx-based database layer for Rahba services.
//!
//! # Example
//!
//! ```rust,ignore
//! use rahba_db::{create_pool, Repositories};
//!
//! let pool = create_pool("postgres://localhost/rahba").await?;
//! let repos = Repositories::new(pool);
//!
//! // Use repositories
//! let tenant = repos.tenants.find_by_subdomain("boutique-amina").await?;
//! ```

pub mod error;
pub mod models;
pub mod pg;
pub mod pool;
pub mod repo;
pub mod seed;

pub use error::{DbError, DbResult};
pub use models::*;
pub use pg::Repositories;
pub use pool::{DbPool, PoolOptions, create_pool, create_pool_with_options, run_migrations};
pub use repo::*;
pub use seed::seed_delivery_zones;
