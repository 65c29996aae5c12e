//! PostgreSQL order repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{OrderItemRow, OrderRow};
use crate::repo::{CreateOrder, CreateOrderItem, OrderFilter, OrderRepository, StatusUpdate};

/// PostgreSQL order repository
#[derive(Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Create a new order repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create_with_items(
        &self,
        order: CreateOrder,
        items: Vec<CreateOrderItem>,
    ) -> DbResult<OrderRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (id, tenant_id, order_number, customer_name,
                                customer_phone, customer_email, wilaya, commune,
                                address, postal_code, subtotal, delivery_fee, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING id, tenant_id, order_number, customer_name, customer_phone,
                      customer_email, wilaya, commune, address, postal_code,
                      subtotal, delivery_fee, total, status, confirmed_at,
                      shipped_at, delivered_at, cancelled_at, delivery_company,
                      tracking_number, created_at
            "#,
        )
        .bind(order.id)
        .bind(order.tenant_id)
        .bind(&order.order_number)
        .bind(&order.customer_name)
        .bind(&order.customer_phone)
        .bind(&order.customer_email)
        .bind(&order.wilaya)
        .bind(&order.commune)
        .bind(&order.address)
        .bind(&order.postal_code)
        .bind(order.subtotal)
        .bind(order.delivery_fee)
        .bind(order.total)
        .fetch_one(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, product_name,
                                         unit_price, quantity, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id)
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(row)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<OrderRow>> {
        let order = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, tenant_id, order_number, customer_name, customer_phone,
                   customer_email, wilaya, commune, address, postal_code,
                   subtotal, delivery_fee, total, status, confirmed_at,
                   shipped_at, delivered_at, cancelled_at, delivery_company,
                   tracking_number, created_at
            FROM orders
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn find_by_order_number(
        &self,
        tenant_id: Uuid,
        order_number: &str,
    ) -> DbResult<Option<OrderRow>> {
        let order = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, tenant_id, order_number, customer_name, customer_phone,
                   customer_email, wilaya, commune, address, postal_code,
                   subtotal, delivery_fee, total, status, confirmed_at,
                   shipped_at, delivered_at, cancelled_at, delivery_company,
                   tracking_number, created_at
            FROM orders
            WHERE tenant_id = $1 AND order_number = $2
            "#,
        )
        .bind(tenant_id)
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn list_items(&self, tenant_id: Uuid, order_id: Uuid) -> DbResult<Vec<OrderItemRow>> {
        let items = sqlx::query_as::<_, OrderItemRow>(
            r#"
            SELECT i.id, i.order_id, i.product_id, i.product_name, i.unit_price,
                   i.quantity, i.subtotal
            FROM order_items i
            JOIN orders o ON o.id = i.order_id
            WHERE o.tenant_id = $1 AND i.order_id = $2
            ORDER BY i.product_name
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn list(&self, tenant_id: Uuid, filter: OrderFilter) -> DbResult<Vec<OrderRow>> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, tenant_id, order_number, customer_name, customer_phone,
                   customer_email, wilaya, commune, address, postal_code,
                   subtotal, delivery_fee, total, status, confirmed_at,
                   shipped_at, delivered_at, cancelled_at, delivery_company,
                   tracking_number, created_at
            FROM orders
            WHERE tenant_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(&filter.status)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn update_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        update: StatusUpdate,
    ) -> DbResult<Option<OrderRow>> {
        let order = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET status = $4,
                confirmed_at = CASE WHEN $4 = 'confirmed' THEN $5 ELSE confirmed_at END,
                shipped_at   = CASE WHEN $4 = 'shipped'   THEN $5 ELSE shipped_at END,
                delivered_at = CASE WHEN $4 = 'delivered' THEN $5 ELSE delivered_at END,
                cancelled_at = CASE WHEN $4 = 'cancelled' THEN $5 ELSE cancelled_at END,
                delivery_company = COALESCE($6, delivery_company),
                tracking_number = COALESCE($7, tracking_number)
            WHERE tenant_id = $1 AND id = $2 AND status = $3
            RETURNING id, tenant_id, order_number, customer_name, customer_phone,
                      customer_email, wilaya, commune, address, postal_code,
                      subtotal, delivery_fee, total, status, confirmed_at,
                      shipped_at, delivered_at, cancelled_at, delivery_company,
                      tracking_number, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&update.from)
        .bind(&update.to)
        .bind(update.stamped_at)
        .bind(&update.delivery_company)
        .bind(&update.tracking_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }
}
