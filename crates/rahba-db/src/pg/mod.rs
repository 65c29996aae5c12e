//! PostgreSQL repository implementations

mod delivery_zone;
mod order;
mod payment;
mod product;
mod session;
mod subscription;
mod tenant;
mod user;

pub use delivery_zone::PgDeliveryZoneRepository;
pub use order::PgOrderRepository;
pub use payment::PgPaymentRepository;
pub use product::PgProductRepository;
pub use session::PgSessionRepository;
pub use subscription::PgSubscriptionRepository;
pub use tenant::PgTenantRepository;
pub use user::PgUserRepository;

use crate::DbPool;

/// All repositories bundled together
#[derive(Clone)]
pub struct Repositories {
    pub tenants: PgTenantRepository,
    pub users: PgUserRepository,
    pub sessions: PgSessionRepository,
    pub subscriptions: PgSubscriptionRepository,
    pub payments: PgPaymentRepository,
    pub products: PgProductRepository,
    pub orders: PgOrderRepository,
    pub delivery_zones: PgDeliveryZoneRepository,
}

impl Repositories {
    /// Create all repositories from a database pool
    pub fn new(pool: DbPool) -> Self {
        Self {
            tenants: PgTenantRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            subscriptions: PgSubscriptionRepository::new(pool.clone()),
            payments: PgPaymentRepository::new(pool.clone()),
            products: PgProductRepository::new(pool.clone()),
            orders: PgOrderRepository::new(pool.clone()),
            delivery_zones: PgDeliveryZoneRepository::new(pool),
        }
    }
}
