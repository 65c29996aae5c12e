//! Repository traits
//!
//! Define async repository interfaces for database operations. Every
//! method touching tenant-owned rows (products, orders, order items)
//! takes `tenant_id` as its first parameter, so an unscoped query cannot
//! be written against these interfaces.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::*;

/// Tenant repository trait
#[async_trait]
pub trait TenantRepository: Send + Sync {
    /// Find a tenant by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TenantRow>>;

    /// Find a tenant by its storefront subdomain
    async fn find_by_subdomain(&self, subdomain: &str) -> DbResult<Option<TenantRow>>;

    /// List tenants, newest first
    async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<TenantRow>>;

    /// Create tenant, trial subscription, and owner user in one transaction
    async fn provision(&self, input: ProvisionMerchant) -> DbResult<ProvisionedMerchant>;

    /// Update tenant status
    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()>;

    /// Atomically increment product_count if it is below `limit`
    ///
    /// The limit only applies while the tenant is in trial; other
    /// statuses increment unconditionally. Returns whether a slot was
    /// taken.
    async fn try_reserve_product_slot(&self, id: Uuid, limit: i32) -> DbResult<bool>;

    /// Atomically increment order_count if it is below `limit`
    ///
    /// Same trial-only semantics as [`Self::try_reserve_product_slot`].
    async fn try_reserve_order_slot(&self, id: Uuid, limit: i32) -> DbResult<bool>;

    /// Decrement product_count, floored at zero
    async fn release_product_slot(&self, id: Uuid) -> DbResult<()>;

    /// Decrement order_count, floored at zero
    async fn release_order_slot(&self, id: Uuid) -> DbResult<()>;

    /// Trial tenants whose trial window has ended
    async fn find_expired_trials(&self, now: DateTime<Utc>) -> DbResult<Vec<TenantRow>>;

    /// Trial tenants whose window ends after `now` but within `until`
    async fn find_trials_ending_within(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<TenantRow>>;
}

/// Input for provisioning a merchant: tenant + subscription + owner user
#[derive(Debug, Clone)]
pub struct ProvisionMerchant {
    pub tenant_id: Uuid,
    pub subdomain: String,
    pub store_name: String,
    pub trial_ends_at: DateTime<Utc>,
    pub subscription_id: Uuid,
    pub plan: String,
    pub period_start: DateTime<Utc>,
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
}

/// Rows created by a successful provisioning transaction
#[derive(Debug, Clone)]
pub struct ProvisionedMerchant {
    pub tenant: TenantRow,
    pub subscription: SubscriptionRow,
    pub user: UserRow,
}

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>>;

    /// Find a user by email
    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>>;

    /// Create a new user
    async fn create(&self, user: CreateUser) -> DbResult<UserRow>;
}

/// Create user input
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
}

/// Refresh-token session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Find a session by refresh-token hash
    async fn find_by_token_hash(&self, token_hash: &str) -> DbResult<Option<SessionRow>>;

    /// Create a new session
    async fn create(&self, session: CreateSession) -> DbResult<SessionRow>;

    /// Delete a session (rotation consume, logout, expiry)
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

/// Create session input
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Subscription repository trait
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a subscription by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Find the subscription owned by a tenant
    async fn find_by_tenant(&self, tenant_id: Uuid) -> DbResult<Option<SubscriptionRow>>;

    /// Record a submitted plan and move the subscription to pending_payment
    async fn set_plan_pending(&self, id: Uuid, plan: &str) -> DbResult<()>;

    /// Active subscriptions whose paid period has ended
    async fn find_expired_active(&self, now: DateTime<Utc>) -> DbResult<Vec<SubscriptionRow>>;

    /// Expire a never-paid subscription and mark its tenant expired in
    /// one transaction
    ///
    /// Only fires while the subscription is still in trial or
    /// pending_payment; fails with NotFound if an approval moved it to
    /// active in the meantime.
    async fn expire_unpaid(&self, id: Uuid) -> DbResult<()>;

    /// Expire an active subscription whose period ended by `now` and
    /// suspend its tenant in one transaction
    ///
    /// The period is re-checked inside the update, so an approval that
    /// just opened a new period makes this fail with NotFound instead of
    /// clobbering it.
    async fn expire_lapsed(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<()>;
}

/// Payment repository trait
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Find a payment by ID
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PaymentRow>>;

    /// Create a new payment
    async fn create(&self, payment: CreatePayment) -> DbResult<PaymentRow>;

    /// List payments, optionally filtered by status, newest first
    async fn list(&self, status: Option<&str>, limit: i64, offset: i64)
        -> DbResult<Vec<PaymentRow>>;

    /// List payments submitted for a subscription, newest first
    async fn list_for_subscription(&self, subscription_id: Uuid) -> DbResult<Vec<PaymentRow>>;

    /// Approve a pending payment in one transaction
    ///
    /// Payment goes to approved (stamped), its subscription to active
    /// with the given period, and the owning tenant to active. All three
    /// writes commit together or not at all. Fails with NotFound if the
    /// payment is no longer pending.
    async fn approve(&self, input: ApprovePayment) -> DbResult<PaymentRow>;

    /// Reject a pending payment with a reason
    ///
    /// No subscription or tenant state changes. Fails with NotFound if
    /// the payment is no longer pending.
    async fn reject(&self, id: Uuid, reason: &str) -> DbResult<PaymentRow>;
}

/// Create payment input
#[derive(Debug, Clone)]
pub struct CreatePayment {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub amount: Decimal,
    pub payer_email: String,
    pub payment_proof: String,
    pub baridimob_ref: Option<String>,
}

/// Input for the transactional payment approval
#[derive(Debug, Clone)]
pub struct ApprovePayment {
    pub payment_id: Uuid,
    pub approved_by: Uuid,
    pub approved_at: DateTime<Utc>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

/// Product repository trait
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Find a product by ID within a tenant
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<ProductRow>>;

    /// Load the active products among `ids` within a tenant
    ///
    /// Used by checkout: the caller compares the returned set against the
    /// requested set and treats any shortfall as total failure.
    async fn find_active_by_ids(&self, tenant_id: Uuid, ids: &[Uuid]) -> DbResult<Vec<ProductRow>>;

    /// List products within a tenant, newest first
    async fn list(&self, tenant_id: Uuid, filter: ProductFilter) -> DbResult<Vec<ProductRow>>;

    /// Create a new product
    async fn create(&self, product: CreateProduct) -> DbResult<ProductRow>;

    /// Partially update a product within a tenant
    ///
    /// Returns None when the product does not exist in this tenant.
    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: UpdateProduct,
    ) -> DbResult<Option<ProductRow>>;

    /// Delete a product within a tenant; returns whether a row was removed
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DbResult<bool>;
}

/// Product listing filter
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub is_active: Option<bool>,
    pub limit: i64,
    pub offset: i64,
}

/// Create product input
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub name_ar: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub slug: String,
    pub is_active: bool,
    pub category: Option<String>,
}

/// Partial product update; None fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub slug: Option<String>,
    pub is_active: Option<bool>,
    pub category: Option<String>,
}

/// Order repository trait
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persist an order and its line items in one transaction
    async fn create_with_items(
        &self,
        order: CreateOrder,
        items: Vec<CreateOrderItem>,
    ) -> DbResult<OrderRow>;

    /// Find an order by ID within a tenant
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<OrderRow>>;

    /// Find an order by its public order number within a tenant
    async fn find_by_order_number(
        &self,
        tenant_id: Uuid,
        order_number: &str,
    ) -> DbResult<Option<OrderRow>>;

    /// Line items of an order within a tenant
    async fn list_items(&self, tenant_id: Uuid, order_id: Uuid) -> DbResult<Vec<OrderItemRow>>;

    /// List orders within a tenant, newest first
    async fn list(&self, tenant_id: Uuid, filter: OrderFilter) -> DbResult<Vec<OrderRow>>;

    /// Apply a status transition, stamping the matching timestamp
    ///
    /// The update is guarded by the expected current status; None means
    /// the order is missing or its status moved concurrently.
    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: StatusUpdate,
    ) -> DbResult<Option<OrderRow>>;
}

/// Order listing filter
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Create order input
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub wilaya: String,
    pub commune: String,
    pub address: String,
    pub postal_code: Option<String>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

/// Create order line-item input (snapshot values)
#[derive(Debug, Clone)]
pub struct CreateOrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

/// Guarded status transition with its timestamp stamp
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    /// Status the order must currently hold
    pub from: String,
    /// Status being written
    pub to: String,
    /// Timestamp stamped into the column matching `to`
    pub stamped_at: DateTime<Utc>,
    /// Delivery company recorded when shipping
    pub delivery_company: Option<String>,
    /// Tracking number recorded when shipping
    pub tracking_number: Option<String>,
}

/// Delivery zone repository trait
#[async_trait]
pub trait DeliveryZoneRepository: Send + Sync {
    /// Find a zone by wilaya name (case-insensitive)
    async fn find_by_wilaya(&self, wilaya: &str) -> DbResult<Option<DeliveryZoneRow>>;

    /// All zones, alphabetical by wilaya
    async fn list(&self) -> DbResult<Vec<DeliveryZoneRow>>;

    /// Insert or update a zone fee
    async fn upsert(&self, wilaya: &str, fee: Decimal) -> DbResult<()>;
}
