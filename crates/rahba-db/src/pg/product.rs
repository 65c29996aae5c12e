//! PostgreSQL product repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::ProductRow;
use crate::repo::{CreateProduct, ProductFilter, ProductRepository, UpdateProduct};

/// PostgreSQL product repository
#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> DbResult<Option<ProductRow>> {
        let product = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, tenant_id, name, name_ar, price, stock, slug, is_active,
                   category, created_at, updated_at
            FROM products
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn find_active_by_ids(
        &self,
        tenant_id: Uuid,
        ids: &[Uuid],
    ) -> DbResult<Vec<ProductRow>> {
        let products = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, tenant_id, name, name_ar, price, stock, slug, is_active,
                   category, created_at, updated_at
            FROM products
            WHERE tenant_id = $1 AND id = ANY($2) AND is_active = TRUE
            "#,
        )
        .bind(tenant_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn list(&self, tenant_id: Uuid, filter: ProductFilter) -> DbResult<Vec<ProductRow>> {
        let products = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, tenant_id, name, name_ar, price, stock, slug, is_active,
                   category, created_at, updated_at
            FROM products
            WHERE tenant_id = $1 AND ($2::boolean IS NULL OR is_active = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(tenant_id)
        .bind(filter.is_active)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    async fn create(&self, product: CreateProduct) -> DbResult<ProductRow> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (id, tenant_id, name, name_ar, price, stock,
                                  slug, is_active, category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, tenant_id, name, name_ar, price, stock, slug, is_active,
                      category, created_at, updated_at
            "#,
        )
        .bind(product.id)
        .bind(product.tenant_id)
        .bind(&product.name)
        .bind(&product.name_ar)
        .bind(product.price)
        .bind(product.stock)
        .bind(&product.slug)
        .bind(product.is_active)
        .bind(&product.category)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        changes: UpdateProduct,
    ) -> DbResult<Option<ProductRow>> {
        let product = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name = COALESCE($3, name),
                name_ar = COALESCE($4, name_ar),
                price = COALESCE($5, price),
                stock = COALESCE($6, stock),
                slug = COALESCE($7, slug),
                is_active = COALESCE($8, is_active),
                category = COALESCE($9, category),
                updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, tenant_id, name, name_ar, price, stock, slug, is_active,
                      category, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.name_ar)
        .bind(changes.price)
        .bind(changes.stock)
        .bind(&changes.slug)
        .bind(changes.is_active)
        .bind(&changes.category)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
