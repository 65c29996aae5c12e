//! Application state for the Rahba API service.

use std::sync::Arc;

use rahba_auth_core::AuthService;
use rahba_billing_core::{BillingService, Sweeper};
use rahba_db::pg::{
    PgDeliveryZoneRepository, PgOrderRepository, PgPaymentRepository, PgProductRepository,
    PgSessionRepository, PgSubscriptionRepository, PgTenantRepository, PgUserRepository,
};
use rahba_db::{DbPool, Repositories};
use rahba_store_core::{CatalogService, OrderService, QuotaGuard, ZoneFeeResolver};

use crate::config::Config;

/// Service types instantiated over the Postgres repositories
pub type AuthServiceImpl =
    AuthService<PgUserRepository, PgSessionRepository, PgTenantRepository>;
pub type CatalogServiceImpl = CatalogService<PgProductRepository, PgTenantRepository>;
pub type OrderServiceImpl = OrderService<
    PgOrderRepository,
    PgProductRepository,
    PgTenantRepository,
    PgDeliveryZoneRepository,
>;
pub type BillingServiceImpl = BillingService<PgSubscriptionRepository, PgPaymentRepository>;
pub type SweeperImpl = Sweeper<PgTenantRepository, PgSubscriptionRepository>;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Auth service (registration, tokens, refresh rotation)
    pub auth: Arc<AuthServiceImpl>,
    /// Product catalog service
    pub catalog: Arc<CatalogServiceImpl>,
    /// Order lifecycle service
    pub orders: Arc<OrderServiceImpl>,
    /// Billing service (subscriptions, payment review)
    pub billing: Arc<BillingServiceImpl>,
    /// Quota guard, for the advisory limits endpoint
    pub quota: QuotaGuard<PgTenantRepository>,
    /// Wilaya fee table access
    pub zones: ZoneFeeResolver<PgDeliveryZoneRepository>,
    /// Database repositories (tenant resolution, admin listings)
    pub repos: Repositories,
    /// Database pool (health checks)
    pub pool: DbPool,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        auth: AuthServiceImpl,
        catalog: CatalogServiceImpl,
        orders: OrderServiceImpl,
        billing: BillingServiceImpl,
        quota: QuotaGuard<PgTenantRepository>,
        zones: ZoneFeeResolver<PgDeliveryZoneRepository>,
        repos: Repositories,
        pool: DbPool,
        config: Config,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            catalog: Arc::new(catalog),
            orders: Arc::new(orders),
            billing: Arc::new(billing),
            quota,
            zones,
            repos,
            pool,
            config: Arc::new(config),
        }
    }

    /// Get request timeout from config
    pub fn request_timeout(&self) -> std::time::Duration {
        self.config.request_timeout
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
