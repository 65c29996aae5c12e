//! PostgreSQL tenant repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::{SubscriptionRow, TenantRow, UserRow};
use crate::repo::{ProvisionMerchant, ProvisionedMerchant, TenantRepository};

/// PostgreSQL tenant repository
#[derive(Clone)]
pub struct PgTenantRepository {
    pool: PgPool,
}

impl PgTenantRepository {
    /// Create a new tenant repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PgTenantRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TenantRow>> {
        let tenant = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, subdomain, name, status, trial_ends_at, product_count,
                   order_count, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> DbResult<Option<TenantRow>> {
        let tenant = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, subdomain, name, status, trial_ends_at, product_count,
                   order_count, created_at, updated_at
            FROM tenants
            WHERE subdomain = $1
            "#,
        )
        .bind(subdomain)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tenant)
    }

    async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<TenantRow>> {
        let tenants = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, subdomain, name, status, trial_ends_at, product_count,
                   order_count, created_at, updated_at
            FROM tenants
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    async fn provision(&self, input: ProvisionMerchant) -> DbResult<ProvisionedMerchant> {
        let mut tx = self.pool.begin().await?;

        let tenant = sqlx::query_as::<_, TenantRow>(
            r#"
            INSERT INTO tenants (id, subdomain, name, status, trial_ends_at)
            VALUES ($1, $2, $3, 'trial', $4)
            RETURNING id, subdomain, name, status, trial_ends_at, product_count,
                      order_count, created_at, updated_at
            "#,
        )
        .bind(input.tenant_id)
        .bind(&input.subdomain)
        .bind(&input.store_name)
        .bind(input.trial_ends_at)
        .fetch_one(&mut *tx)
        .await?;

        let subscription = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (id, tenant_id, plan, status,
                                       current_period_start, current_period_end)
            VALUES ($1, $2, $3, 'trial', $4, $5)
            RETURNING id, tenant_id, plan, status, current_period_start,
                      current_period_end, created_at, updated_at
            "#,
        )
        .bind(input.subscription_id)
        .bind(input.tenant_id)
        .bind(&input.plan)
        .bind(input.period_start)
        .bind(input.trial_ends_at)
        .fetch_one(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, tenant_id, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, email, password_hash, full_name, role,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(input.user_id)
        .bind(input.tenant_id)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.full_name)
        .bind(&input.role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ProvisionedMerchant {
            tenant,
            subscription,
            user,
        })
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
        sqlx::query("UPDATE tenants SET status = $1, updated_at = NOW() WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn try_reserve_product_slot(&self, id: Uuid, limit: i32) -> DbResult<bool> {
        // Single conditional statement: the check and the increment cannot
        // be interleaved by a concurrent request.
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET product_count = product_count + 1, updated_at = NOW()
            WHERE id = $1 AND (status <> 'trial' OR product_count < $2)
            "#,
        )
        .bind(id)
        .bind(limit)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_reserve_order_slot(&self, id: Uuid, limit: i32) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET order_count = order_count + 1, updated_at = NOW()
            WHERE id = $1 AND (status <> 'trial' OR order_count < $2)
            "#,
        )
        .bind(id)
        .bind(limit)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn release_product_slot(&self, id: Uuid) -> DbResult<()> {
        sqlx::query(
            "UPDATE tenants SET product_count = GREATEST(product_count - 1, 0), \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn release_order_slot(&self, id: Uuid) -> DbResult<()> {
        sqlx::query(
            "UPDATE tenants SET order_count = GREATEST(order_count - 1, 0), \
             updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_expired_trials(&self, now: DateTime<Utc>) -> DbResult<Vec<TenantRow>> {
        let tenants = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, subdomain, name, status, trial_ends_at, product_count,
                   order_count, created_at, updated_at
            FROM tenants
            WHERE status = 'trial' AND trial_ends_at <= $1
            ORDER BY trial_ends_at
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }

    async fn find_trials_ending_within(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<TenantRow>> {
        let tenants = sqlx::query_as::<_, TenantRow>(
            r#"
            SELECT id, subdomain, name, status, trial_ends_at, product_count,
                   order_count, created_at, updated_at
            FROM tenants
            WHERE status = 'trial' AND trial_ends_at > $1 AND trial_ends_at <= $2
            ORDER BY trial_ends_at
            "#,
        )
        .bind(now)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(tenants)
    }
}
