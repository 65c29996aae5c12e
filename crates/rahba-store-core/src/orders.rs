//! Order lifecycle: checkout, status transitions, public tracking

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, warn};
use uuid::Uuid;

use rahba_db::{
    CreateOrder, CreateOrderItem, DeliveryZoneRepository, OrderFilter, OrderItemRow,
    OrderRepository, OrderRow, ProductRepository, StatusUpdate, TenantRepository,
};
use rahba_types::OrderStatus;

use crate::catalog::MAX_PAGE_SIZE;
use crate::delivery::{DeliveryProvider, ShipmentRequest, ZoneFeeResolver};
use crate::error::StoreError;
use crate::quota::QuotaGuard;

const ORDER_SUFFIX_LEN: usize = 6;
const ORDER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// One requested line at checkout.
#[derive(Debug, Clone)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Storefront checkout input. Prices are deliberately absent: the
/// server prices every line from the catalog.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub wilaya: String,
    pub commune: String,
    pub address: String,
    pub postal_code: Option<String>,
    pub items: Vec<CheckoutItem>,
}

/// Shipping details supplied when moving an order to shipped.
#[derive(Debug, Clone, Default)]
pub struct ShippingInfo {
    pub delivery_company: Option<String>,
    pub tracking_number: Option<String>,
}

/// Public view of an order for customer tracking. Built from the row by
/// projection, so customer contact details and pricing cannot leak
/// through it.
#[derive(Debug, Clone)]
pub struct OrderTracking {
    pub order_number: String,
    pub status: String,
    pub wilaya: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub delivery_company: Option<String>,
    pub tracking_number: Option<String>,
}

impl From<OrderRow> for OrderTracking {
    fn from(order: OrderRow) -> Self {
        Self {
            order_number: order.order_number,
            status: order.status,
            wilaya: order.wilaya,
            created_at: order.created_at,
            confirmed_at: order.confirmed_at,
            shipped_at: order.shipped_at,
            delivered_at: order.delivered_at,
            cancelled_at: order.cancelled_at,
            delivery_company: order.delivery_company,
            tracking_number: order.tracking_number,
        }
    }
}

/// Order service
pub struct OrderService<O, P, T, Z>
where
    O: OrderRepository,
    P: ProductRepository,
    T: TenantRepository,
    Z: DeliveryZoneRepository,
{
    orders: Arc<O>,
    products: Arc<P>,
    quota: QuotaGuard<T>,
    fees: ZoneFeeResolver<Z>,
    carrier: Option<Arc<dyn DeliveryProvider>>,
}

impl<O, P, T, Z> OrderService<O, P, T, Z>
where
    O: OrderRepository,
    P: ProductRepository,
    T: TenantRepository,
    Z: DeliveryZoneRepository,
{
    /// Create a new order service
    pub fn new(
        orders: Arc<O>,
        products: Arc<P>,
        quota: QuotaGuard<T>,
        fees: ZoneFeeResolver<Z>,
        carrier: Option<Arc<dyn DeliveryProvider>>,
    ) -> Self {
        Self {
            orders,
            products,
            quota,
            fees,
            carrier,
        }
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Place a storefront order.
    ///
    /// The order quota slot is taken first, so a store at its limit hears
    /// about the quota before anything about its cart; the slot is given
    /// back if pricing or the insert fails afterwards. Every line is
    /// priced from the live catalog and snapshotted onto the order items.
    pub async fn checkout(
        &self,
        tenant_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<OrderRow, StoreError> {
        let customer_name = require_field("customer name", &request.customer_name)?;
        let customer_phone = validate_phone(&request.customer_phone)?;
        let wilaya = require_field("wilaya", &request.wilaya)?;
        let commune = require_field("commune", &request.commune)?;
        let address = require_field("address", &request.address)?;
        validate_items(&request.items)?;

        self.quota.reserve_order_slot(tenant_id).await?;

        let placed = self
            .place_order(
                tenant_id,
                CreateOrder {
                    id: Uuid::new_v4(),
                    tenant_id,
                    order_number: generate_order_number(),
                    customer_name,
                    customer_phone,
                    customer_email: none_if_blank(request.customer_email),
                    wilaya,
                    commune,
                    address,
                    postal_code: none_if_blank(request.postal_code),
                    subtotal: Decimal::ZERO,
                    delivery_fee: Decimal::ZERO,
                    total: Decimal::ZERO,
                },
                &request.items,
            )
            .await;

        match placed {
            Ok(order) => {
                info!(
                    tenant_id = %tenant_id,
                    order_number = %order.order_number,
                    total = %order.total,
                    "order placed"
                );
                Ok(order)
            }
            Err(err) => {
                if let Err(release_err) = self.quota.release_order_slot(tenant_id).await {
                    warn!(
                        tenant_id = %tenant_id,
                        error = %release_err,
                        "failed to release order slot after checkout failure"
                    );
                }
                Err(err)
            }
        }
    }

    /// Price the cart from the active catalog and persist the order with
    /// its item snapshots. The caller holds the order slot.
    async fn place_order(
        &self,
        tenant_id: Uuid,
        mut order: CreateOrder,
        items: &[CheckoutItem],
    ) -> Result<OrderRow, StoreError> {
        let ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let rows = self.products.find_active_by_ids(tenant_id, &ids).await?;

        let mut subtotal = Decimal::ZERO;
        let mut item_inputs = Vec::with_capacity(items.len());
        for item in items {
            // Missing or inactive: refuse the whole cart.
            let product = rows
                .iter()
                .find(|p| p.id == item.product_id)
                .ok_or_else(|| {
                    warn!(
                        tenant_id = %tenant_id,
                        product_id = %item.product_id,
                        "checkout referenced a missing or inactive product"
                    );
                    StoreError::NotFound("Product")
                })?;

            let line_subtotal = product.price * Decimal::from(item.quantity);
            subtotal += line_subtotal;
            item_inputs.push(CreateOrderItem {
                id: Uuid::new_v4(),
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price: product.price,
                quantity: item.quantity,
                subtotal: line_subtotal,
            });
        }

        order.subtotal = subtotal;
        order.delivery_fee = self.fees.fee_for(&order.wilaya).await?;
        order.total = subtotal + order.delivery_fee;

        Ok(self.orders.create_with_items(order, item_inputs).await?)
    }

    // =========================================================================
    // Status Transitions
    // =========================================================================

    /// Move an order along its lifecycle.
    ///
    /// The transition must be a legal edge of the status machine, and the
    /// database write is guarded by the status the order was read at, so
    /// of two concurrent transitions exactly one wins.
    pub async fn transition_order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
        target: OrderStatus,
        shipping: ShippingInfo,
    ) -> Result<OrderRow, StoreError> {
        let order = self
            .orders
            .find_by_id(tenant_id, order_id)
            .await?
            .ok_or(StoreError::NotFound("Order"))?;

        let current: OrderStatus = order
            .status
            .parse()
            .map_err(|e| StoreError::Internal(format!("stored order status is invalid: {}", e)))?;

        if !current.can_transition_to(target) {
            return Err(StoreError::Validation(format!(
                "order cannot move from {} to {}",
                current, target
            )));
        }

        let delivery_company = none_if_blank(shipping.delivery_company);
        let mut tracking_number = none_if_blank(shipping.tracking_number);

        // Register the shipment unless the merchant supplied a tracking
        // number themselves.
        if target == OrderStatus::Shipped && tracking_number.is_none() {
            if let Some(carrier) = &self.carrier {
                let shipment = carrier
                    .create_shipment(&ShipmentRequest {
                        order_number: order.order_number.clone(),
                        customer_name: order.customer_name.clone(),
                        customer_phone: order.customer_phone.clone(),
                        wilaya: order.wilaya.clone(),
                        commune: order.commune.clone(),
                        address: order.address.clone(),
                        cod_amount: order.total,
                    })
                    .await?;
                tracking_number = Some(shipment.tracking_number);
            }
        }

        let updated = self
            .orders
            .update_status(
                tenant_id,
                order_id,
                StatusUpdate {
                    from: current.to_string(),
                    to: target.to_string(),
                    stamped_at: Utc::now(),
                    delivery_company,
                    tracking_number,
                },
            )
            .await?;

        match updated {
            Some(order) => {
                info!(
                    tenant_id = %tenant_id,
                    order_number = %order.order_number,
                    from = %current,
                    to = %target,
                    "order status changed"
                );
                Ok(order)
            }
            None => Err(StoreError::Conflict(
                "order status changed concurrently".to_string(),
            )),
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Fetch one order with its line items.
    pub async fn get_order(
        &self,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<(OrderRow, Vec<OrderItemRow>), StoreError> {
        let order = self
            .orders
            .find_by_id(tenant_id, order_id)
            .await?
            .ok_or(StoreError::NotFound("Order"))?;
        let items = self.orders.list_items(tenant_id, order_id).await?;
        Ok((order, items))
    }

    /// List orders for the merchant dashboard, optionally by status.
    pub async fn list_orders(
        &self,
        tenant_id: Uuid,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<OrderRow>, StoreError> {
        let status = match status {
            Some(raw) => {
                let parsed: OrderStatus = raw.parse().map_err(|_| {
                    StoreError::Validation(format!("unknown order status '{}'", raw))
                })?;
                Some(parsed.to_string())
            }
            None => None,
        };

        let filter = OrderFilter {
            status,
            limit: limit.clamp(1, MAX_PAGE_SIZE),
            offset: offset.max(0),
        };
        Ok(self.orders.list(tenant_id, filter).await?)
    }

    /// Public tracking by order number, scoped to one store.
    pub async fn track(
        &self,
        tenant_id: Uuid,
        order_number: &str,
    ) -> Result<OrderTracking, StoreError> {
        let order = self
            .orders
            .find_by_order_number(tenant_id, order_number.trim())
            .await?
            .ok_or(StoreError::NotFound("Order"))?;
        Ok(order.into())
    }
}

impl<O, P, T, Z> std::fmt::Debug for OrderService<O, P, T, Z>
where
    O: OrderRepository,
    P: ProductRepository,
    T: TenantRepository,
    Z: DeliveryZoneRepository,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("carrier_configured", &self.carrier.is_some())
            .finish()
    }
}

// =============================================================================
// Order numbers
// =============================================================================

/// Build a public order number: ORD-<epoch millis>-<6 random chars>.
/// The global unique index is the backstop for the unlikely collision.
pub fn generate_order_number() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_SUFFIX_LEN)
        .map(|_| ORDER_ALPHABET[rng.random_range(0..ORDER_ALPHABET.len())] as char)
        .collect();
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}

// =============================================================================
// Input validation
// =============================================================================

fn require_field(field: &str, value: &str) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Accept phone numbers as digits with an optional leading +, ignoring
/// spaces and dashes, 9 to 14 digits long.
fn validate_phone(raw: &str) -> Result<String, StoreError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let digits = cleaned.strip_prefix('+').unwrap_or(&cleaned);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(StoreError::Validation(
            "phone number may only contain digits".into(),
        ));
    }
    if !(9..=14).contains(&digits.len()) {
        return Err(StoreError::Validation(
            "phone number must be 9-14 digits".into(),
        ));
    }
    Ok(cleaned)
}

fn validate_items(items: &[CheckoutItem]) -> Result<(), StoreError> {
    if items.is_empty() {
        return Err(StoreError::Validation(
            "order must contain at least one item".into(),
        ));
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(StoreError::Validation(format!(
                "quantity for product {} must be positive",
                item.product_id
            )));
        }
    }
    Ok(())
}

fn none_if_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
