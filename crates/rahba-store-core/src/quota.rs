//! Trial quota enforcement
//!
//! Trial stores may hold at most [`TRIAL_PRODUCT_LIMIT`] products and
//! accept [`TRIAL_ORDER_LIMIT`] orders; active stores are unlimited.
//! Reservations go through a single conditional increment in the
//! database, so two concurrent requests can never both take the last
//! slot. Counts are read fresh on every check — caching them would
//! reintroduce the race the conditional increment exists to close.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use rahba_db::{TenantRepository, TenantRow};
use rahba_types::{TenantStatus, TRIAL_ORDER_LIMIT, TRIAL_PRODUCT_LIMIT};

use crate::error::StoreError;

/// Usage of one counted resource against its (optional) limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitStatus {
    pub used: i32,
    /// None when the store is not on trial (unlimited).
    pub limit: Option<i32>,
    pub remaining: Option<i32>,
}

impl LimitStatus {
    fn new(used: i32, limit: Option<i32>) -> Self {
        Self {
            used,
            limit,
            remaining: limit.map(|l| (l - used).max(0)),
        }
    }
}

/// Snapshot of a store's quota situation, for the limits endpoint.
///
/// The flags answer the same question a reservation would: a false
/// `can_add_product` here means `reserve_product_slot` would refuse,
/// with `reason` carrying the refusal message.
#[derive(Debug, Clone)]
pub struct UsageLimits {
    pub status: TenantStatus,
    pub trial_ends_at: DateTime<Utc>,
    pub can_add_product: bool,
    pub can_add_order: bool,
    /// Set when either flag is false; the product limit takes priority
    /// when both are breached.
    pub reason: Option<String>,
    pub products: LimitStatus,
    pub orders: LimitStatus,
}

/// Quota guard over the tenant repository
pub struct QuotaGuard<T: TenantRepository> {
    tenants: Arc<T>,
}

impl<T: TenantRepository> QuotaGuard<T> {
    /// Create a new quota guard
    pub fn new(tenants: Arc<T>) -> Self {
        Self { tenants }
    }

    /// Read a store's current usage and limits without reserving anything.
    pub async fn usage(&self, tenant_id: Uuid) -> Result<UsageLimits, StoreError> {
        let tenant = self.load(tenant_id).await?;
        let status = parse_status(&tenant)?;
        let limited = status == TenantStatus::Trial;

        let (can_add_product, can_add_order, reason) = match write_block(&tenant, status) {
            Some(block) => (false, false, Some(block)),
            None if limited => {
                let can_add_product = tenant.product_count < TRIAL_PRODUCT_LIMIT;
                let can_add_order = tenant.order_count < TRIAL_ORDER_LIMIT;
                let reason = if !can_add_product {
                    Some(product_limit_reason())
                } else if !can_add_order {
                    Some(order_limit_reason())
                } else {
                    None
                };
                (can_add_product, can_add_order, reason)
            }
            None => (true, true, None),
        };

        Ok(UsageLimits {
            status,
            trial_ends_at: tenant.trial_ends_at,
            can_add_product,
            can_add_order,
            reason,
            products: LimitStatus::new(
                tenant.product_count,
                limited.then_some(TRIAL_PRODUCT_LIMIT),
            ),
            orders: LimitStatus::new(tenant.order_count, limited.then_some(TRIAL_ORDER_LIMIT)),
        })
    }

    /// Take a product slot, or explain why the store cannot add products.
    ///
    /// On success the count is already incremented; callers that fail to
    /// persist the product afterwards must release the slot.
    pub async fn reserve_product_slot(&self, tenant_id: Uuid) -> Result<(), StoreError> {
        let tenant = self.load(tenant_id).await?;
        self.ensure_open(&tenant)?;

        let reserved = self
            .tenants
            .try_reserve_product_slot(tenant_id, TRIAL_PRODUCT_LIMIT)
            .await?;
        if !reserved {
            return Err(StoreError::LimitReached(product_limit_reason()));
        }
        Ok(())
    }

    /// Take an order slot, or explain why the store cannot accept orders.
    pub async fn reserve_order_slot(&self, tenant_id: Uuid) -> Result<(), StoreError> {
        let tenant = self.load(tenant_id).await?;
        self.ensure_open(&tenant)?;

        let reserved = self
            .tenants
            .try_reserve_order_slot(tenant_id, TRIAL_ORDER_LIMIT)
            .await?;
        if !reserved {
            return Err(StoreError::LimitReached(order_limit_reason()));
        }
        Ok(())
    }

    /// Give back a product slot after a failed persist or a delete.
    pub async fn release_product_slot(&self, tenant_id: Uuid) -> Result<(), StoreError> {
        self.tenants.release_product_slot(tenant_id).await?;
        Ok(())
    }

    /// Give back an order slot after a failed persist.
    pub async fn release_order_slot(&self, tenant_id: Uuid) -> Result<(), StoreError> {
        self.tenants.release_order_slot(tenant_id).await?;
        Ok(())
    }

    async fn load(&self, tenant_id: Uuid) -> Result<TenantRow, StoreError> {
        self.tenants
            .find_by_id(tenant_id)
            .await?
            .ok_or(StoreError::NotFound("Store"))
    }

    /// A store can only take writes while trial (and inside its window)
    /// or active.
    fn ensure_open(&self, tenant: &TenantRow) -> Result<(), StoreError> {
        let status = parse_status(tenant)?;
        match write_block(tenant, status) {
            Some(block) => Err(StoreError::LimitReached(block)),
            None => Ok(()),
        }
    }
}

fn parse_status(tenant: &TenantRow) -> Result<TenantStatus, StoreError> {
    tenant
        .status
        .parse::<TenantStatus>()
        .map_err(|e| StoreError::Internal(format!("stored tenant status is invalid: {}", e)))
}

/// Why the store refuses all writes right now, independent of counters.
fn write_block(tenant: &TenantRow, status: TenantStatus) -> Option<String> {
    match status {
        TenantStatus::Trial if tenant.trial_ends_at <= Utc::now() => Some(
            "Trial period has expired. Subscribe to a plan to continue.".to_string(),
        ),
        TenantStatus::Trial | TenantStatus::Active => None,
        TenantStatus::Expired => Some(
            "Trial period has expired. Subscribe to a plan to continue.".to_string(),
        ),
        TenantStatus::Suspended => Some(
            "Store is suspended. Settle the subscription to reopen it.".to_string(),
        ),
    }
}

fn product_limit_reason() -> String {
    format!(
        "Trial product limit reached ({} products). Upgrade to add more.",
        TRIAL_PRODUCT_LIMIT
    )
}

fn order_limit_reason() -> String {
    format!(
        "Trial order limit reached ({} orders). Upgrade to accept more.",
        TRIAL_ORDER_LIMIT
    )
}

impl<T: TenantRepository> Clone for QuotaGuard<T> {
    fn clone(&self) -> Self {
        Self {
            tenants: Arc::clone(&self.tenants),
        }
    }
}

impl<T: TenantRepository> std::fmt::Debug for QuotaGuard<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGuard").finish()
    }
}
