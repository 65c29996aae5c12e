//! Mock repositories for testing

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use rahba_db::{
    CreateOrder, CreateOrderItem, CreateProduct, DbError, DbResult, DeliveryZoneRepository,
    DeliveryZoneRow, OrderFilter, OrderItemRow, OrderRepository, OrderRow, ProductFilter,
    ProductRepository, ProductRow, ProvisionMerchant, ProvisionedMerchant, StatusUpdate,
    SubscriptionRow, TenantRepository, TenantRow, UpdateProduct, UserRow,
};

/// In-memory tenant repository for testing
#[derive(Default, Clone)]
pub struct MockTenantRepository {
    tenants: Arc<DashMap<Uuid, TenantRow>>,
    by_subdomain: Arc<DashMap<String, Uuid>>,
}

impl MockTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a tenant directly for testing
    pub fn insert_tenant(&self, tenant: TenantRow) {
        self.by_subdomain.insert(tenant.subdomain.clone(), tenant.id);
        self.tenants.insert(tenant.id, tenant);
    }

    /// Build and store a trial tenant with a live trial window
    pub fn seed_trial(&self, product_count: i32, order_count: i32) -> TenantRow {
        self.seed(
            "trial",
            Utc::now() + Duration::days(5),
            product_count,
            order_count,
        )
    }

    /// Build and store an active (paid) tenant
    pub fn seed_active(&self) -> TenantRow {
        self.seed("active", Utc::now() - Duration::days(30), 0, 0)
    }

    /// Build and store a tenant with an arbitrary status
    pub fn seed(
        &self,
        status: &str,
        trial_ends_at: DateTime<Utc>,
        product_count: i32,
        order_count: i32,
    ) -> TenantRow {
        let id = Uuid::new_v4();
        let row = TenantRow {
            id,
            subdomain: format!("store-{}", &id.to_string()[..8]),
            name: "Test Store".to_string(),
            status: status.to_string(),
            trial_ends_at,
            product_count,
            order_count,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.insert_tenant(row.clone());
        row
    }

    /// Read back a stored tenant
    pub fn get(&self, id: Uuid) -> Option<TenantRow> {
        self.tenants.get(&id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl TenantRepository for MockTenantRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TenantRow>> {
        Ok(self.tenants.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> DbResult<Option<TenantRow>> {
        Ok(self
            .by_subdomain
            .get(subdomain)
            .and_then(|id| self.tenants.get(id.value()).map(|r| r.value().clone())))
    }

    async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<TenantRow>> {
        let mut all: Vec<TenantRow> = self.tenants.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn provision(&self, input: ProvisionMerchant) -> DbResult<ProvisionedMerchant> {
        let now = Utc::now();
        let tenant = TenantRow {
            id: input.tenant_id,
            subdomain: input.subdomain.clone(),
            name: input.store_name.clone(),
            status: "trial".to_string(),
            trial_ends_at: input.trial_ends_at,
            product_count: 0,
            order_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.insert_tenant(tenant.clone());
        Ok(ProvisionedMerchant {
            tenant,
            subscription: SubscriptionRow {
                id: input.subscription_id,
                tenant_id: input.tenant_id,
                plan: input.plan,
                status: "trial".to_string(),
                current_period_start: input.period_start,
                current_period_end: input.trial_ends_at,
                created_at: now,
                updated_at: now,
            },
            user: UserRow {
                id: input.user_id,
                tenant_id: Some(input.tenant_id),
                email: input.email,
                password_hash: input.password_hash,
                full_name: input.full_name,
                role: input.role,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        })
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
        if let Some(mut tenant) = self.tenants.get_mut(&id) {
            tenant.status = status.to_string();
            tenant.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn try_reserve_product_slot(&self, id: Uuid, limit: i32) -> DbResult<bool> {
        // The entry lock makes check + increment one step, like the
        // conditional UPDATE it stands in for.
        let mut tenant = match self.tenants.get_mut(&id) {
            Some(t) => t,
            None => return Ok(false),
        };
        if tenant.status == "trial" && tenant.product_count >= limit {
            return Ok(false);
        }
        tenant.product_count += 1;
        Ok(true)
    }

    async fn try_reserve_order_slot(&self, id: Uuid, limit: i32) -> DbResult<bool> {
        let mut tenant = match self.tenants.get_mut(&id) {
            Some(t) => t,
            None => return Ok(false),
        };
        if tenant.status == "trial" && tenant.order_count >= limit {
            return Ok(false);
        }
        tenant.order_count += 1;
        Ok(true)
    }

    async fn release_product_slot(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut tenant) = self.tenants.get_mut(&id) {
            tenant.product_count = (tenant.product_count - 1).max(0);
        }
        Ok(())
    }

    async fn release_order_slot(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut tenant) = self.tenants.get_mut(&id) {
            tenant.order_count = (tenant.order_count - 1).max(0);
        }
        Ok(())
    }

    async fn find_expired_trials(&self, now: DateTime<Utc>) -> DbResult<Vec<TenantRow>> {
        Ok(self
            .tenants
            .iter()
            .filter(|r| r.status == "trial" && r.trial_ends_at <= now)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn find_trials_ending_within(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<TenantRow>> {
        Ok(self
            .tenants
            .iter()
            .filter(|r| r.status == "trial" && r.trial_ends_at > now && r.trial_ends_at <= until)
            .map(|r| r.value().clone())
            .collect())
    }
}

/// In-memory product repository for testing
#[derive(Default, Clone)]
pub struct MockProductRepository {
    products: Arc<DashMap<Uuid, ProductRow>>,
    fail_next_create: Arc<AtomicBool>,
}

impl MockProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next create fail like a unique-index collision
    #[allow(dead_code)]
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Insert a product directly for testing
    #[allow(dead_code)]
    pub fn insert_product(&self, product: ProductRow) {
        self.products.insert(product.id, product);
    }

    /// Number of stored products for a tenant
    #[allow(dead_code)]
    pub fn count_for(&self, tenant_id: Uuid) -> usize {
        self.products
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .count()
    }
}

#[async_trait]
impl ProductRepository for MockProductRepository {
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<ProductRow>> {
        Ok(self
            .products
            .get(&id)
            .filter(|r| r.tenant_id == tenant_id)
            .map(|r| r.value().clone()))
    }

    async fn find_active_by_ids(&self, tenant_id: Uuid, ids: &[Uuid]) -> DbResult<Vec<ProductRow>> {
        Ok(self
            .products
            .iter()
            .filter(|r| r.tenant_id == tenant_id && r.is_active && ids.contains(&r.id))
            .map(|r| r.value().clone())
            .collect())
    }

    async fn list(&self, tenant_id: Uuid, filter: ProductFilter) -> DbResult<Vec<ProductRow>> {
        let mut rows: Vec<ProductRow> = self
            .products
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .filter(|r| filter.is_active.is_none_or(|want| r.is_active == want))
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn create(&self, product: CreateProduct) -> DbResult<ProductRow> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(DbError::UniqueViolation {
                constraint: "products_tenant_id_slug_key".to_string(),
            });
        }
        let now = Utc::now();
        let row = ProductRow {
            id: product.id,
            tenant_id: product.tenant_id,
            name: product.name,
            name_ar: product.name_ar,
            price: product.price,
            stock: product.stock,
            slug: product.slug,
            is_active: product.is_active,
            category: product.category,
            created_at: now,
            updated_at: now,
        };
        self.products.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: UpdateProduct,
    ) -> DbResult<Option<ProductRow>> {
        let mut entry = match self.products.get_mut(&id) {
            Some(e) if e.tenant_id == tenant_id => e,
            _ => return Ok(None),
        };
        if let Some(name) = changes.name {
            entry.name = name;
        }
        if let Some(name_ar) = changes.name_ar {
            entry.name_ar = Some(name_ar);
        }
        if let Some(price) = changes.price {
            entry.price = price;
        }
        if let Some(stock) = changes.stock {
            entry.stock = stock;
        }
        if let Some(slug) = changes.slug {
            entry.slug = slug;
        }
        if let Some(is_active) = changes.is_active {
            entry.is_active = is_active;
        }
        if let Some(category) = changes.category {
            entry.category = Some(category);
        }
        entry.updated_at = Utc::now();
        Ok(Some(entry.value().clone()))
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DbResult<bool> {
        let owned = self
            .products
            .get(&id)
            .map(|r| r.tenant_id == tenant_id)
            .unwrap_or(false);
        if owned {
            self.products.remove(&id);
        }
        Ok(owned)
    }
}

/// In-memory order repository for testing
#[derive(Default, Clone)]
pub struct MockOrderRepository {
    orders: Arc<DashMap<Uuid, OrderRow>>,
    items: Arc<DashMap<Uuid, Vec<OrderItemRow>>>,
    by_number: Arc<DashMap<String, Uuid>>,
    fail_next_create: Arc<AtomicBool>,
}

impl MockOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next create fail, leaving nothing behind (the real
    /// implementation rolls the whole transaction back)
    #[allow(dead_code)]
    pub fn fail_next_create(&self) {
        self.fail_next_create.store(true, Ordering::SeqCst);
    }

    /// Number of stored orders for a tenant
    #[allow(dead_code)]
    pub fn count_for(&self, tenant_id: Uuid) -> usize {
        self.orders
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .count()
    }
}

#[async_trait]
impl OrderRepository for MockOrderRepository {
    async fn create_with_items(
        &self,
        order: CreateOrder,
        items: Vec<CreateOrderItem>,
    ) -> DbResult<OrderRow> {
        if self.fail_next_create.swap(false, Ordering::SeqCst) {
            return Err(DbError::UniqueViolation {
                constraint: "orders_order_number_key".to_string(),
            });
        }
        let row = OrderRow {
            id: order.id,
            tenant_id: order.tenant_id,
            order_number: order.order_number.clone(),
            customer_name: order.customer_name,
            customer_phone: order.customer_phone,
            customer_email: order.customer_email,
            wilaya: order.wilaya,
            commune: order.commune,
            address: order.address,
            postal_code: order.postal_code,
            subtotal: order.subtotal,
            delivery_fee: order.delivery_fee,
            total: order.total,
            status: "pending".to_string(),
            confirmed_at: None,
            shipped_at: None,
            delivered_at: None,
            cancelled_at: None,
            delivery_company: None,
            tracking_number: None,
            created_at: Utc::now(),
        };
        let item_rows: Vec<OrderItemRow> = items
            .into_iter()
            .map(|item| OrderItemRow {
                id: item.id,
                order_id: order.id,
                product_id: item.product_id,
                product_name: item.product_name,
                unit_price: item.unit_price,
                quantity: item.quantity,
                subtotal: item.subtotal,
            })
            .collect();

        self.by_number.insert(order.order_number, order.id);
        self.items.insert(order.id, item_rows);
        self.orders.insert(order.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<OrderRow>> {
        Ok(self
            .orders
            .get(&id)
            .filter(|r| r.tenant_id == tenant_id)
            .map(|r| r.value().clone()))
    }

    async fn find_by_order_number(
        &self,
        tenant_id: Uuid,
        order_number: &str,
    ) -> DbResult<Option<OrderRow>> {
        Ok(self.by_number.get(order_number).and_then(|id| {
            self.orders
                .get(id.value())
                .filter(|r| r.tenant_id == tenant_id)
                .map(|r| r.value().clone())
        }))
    }

    async fn list_items(&self, tenant_id: Uuid, order_id: Uuid) -> DbResult<Vec<OrderItemRow>> {
        let owned = self
            .orders
            .get(&order_id)
            .map(|r| r.tenant_id == tenant_id)
            .unwrap_or(false);
        if !owned {
            return Ok(Vec::new());
        }
        Ok(self
            .items
            .get(&order_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }

    async fn list(&self, tenant_id: Uuid, filter: OrderFilter) -> DbResult<Vec<OrderRow>> {
        let mut rows: Vec<OrderRow> = self
            .orders
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .filter(|r| {
                filter
                    .status
                    .as_deref()
                    .is_none_or(|want| r.status == want)
            })
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: StatusUpdate,
    ) -> DbResult<Option<OrderRow>> {
        let mut entry = match self.orders.get_mut(&id) {
            Some(e) if e.tenant_id == tenant_id => e,
            _ => return Ok(None),
        };
        // Guarded like the SQL UPDATE: the expected status must still hold.
        if entry.status != update.from {
            return Ok(None);
        }

        entry.status = update.to.clone();
        match update.to.as_str() {
            "confirmed" => entry.confirmed_at = Some(update.stamped_at),
            "shipped" => entry.shipped_at = Some(update.stamped_at),
            "delivered" => entry.delivered_at = Some(update.stamped_at),
            "cancelled" => entry.cancelled_at = Some(update.stamped_at),
            _ => {}
        }
        if update.delivery_company.is_some() {
            entry.delivery_company = update.delivery_company;
        }
        if update.tracking_number.is_some() {
            entry.tracking_number = update.tracking_number;
        }
        Ok(Some(entry.value().clone()))
    }
}

/// In-memory delivery zone repository for testing
#[derive(Default, Clone)]
pub struct MockDeliveryZoneRepository {
    zones: Arc<DashMap<String, DeliveryZoneRow>>,
}

impl MockDeliveryZoneRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a zone directly for testing
    pub fn seed_zone(&self, wilaya: &str, fee: Decimal) {
        self.zones.insert(
            wilaya.to_lowercase(),
            DeliveryZoneRow {
                id: Uuid::new_v4(),
                wilaya: wilaya.to_string(),
                fee,
                created_at: Utc::now(),
            },
        );
    }
}

#[async_trait]
impl DeliveryZoneRepository for MockDeliveryZoneRepository {
    async fn find_by_wilaya(&self, wilaya: &str) -> DbResult<Option<DeliveryZoneRow>> {
        Ok(self
            .zones
            .get(&wilaya.to_lowercase())
            .map(|r| r.value().clone()))
    }

    async fn list(&self) -> DbResult<Vec<DeliveryZoneRow>> {
        let mut rows: Vec<DeliveryZoneRow> =
            self.zones.iter().map(|r| r.value().clone()).collect();
        rows.sort_by(|a, b| a.wilaya.cmp(&b.wilaya));
        Ok(rows)
    }

    async fn upsert(&self, wilaya: &str, fee: Decimal) -> DbResult<()> {
        let key = wilaya.to_lowercase();
        match self.zones.get_mut(&key) {
            Some(mut zone) => zone.fee = fee,
            None => {
                self.seed_zone(wilaya, fee);
            }
        }
        Ok(())
    }
}
