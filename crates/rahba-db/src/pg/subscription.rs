//! PostgreSQL subscription repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::SubscriptionRow;
use crate::repo::SubscriptionRepository;

/// PostgreSQL subscription repository
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new subscription repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, tenant_id, plan, status, current_period_start,
                   current_period_end, created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn find_by_tenant(&self, tenant_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        let sub = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, tenant_id, plan, status, current_period_start,
                   current_period_end, created_at, updated_at
            FROM subscriptions
            WHERE tenant_id = $1
            "#,
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sub)
    }

    async fn set_plan_pending(&self, id: Uuid, plan: &str) -> DbResult<()> {
        sqlx::query(
            "UPDATE subscriptions SET plan = $1, status = 'pending_payment', \
             updated_at = NOW() WHERE id = $2",
        )
        .bind(plan)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_expired_active(&self, now: DateTime<Utc>) -> DbResult<Vec<SubscriptionRow>> {
        let subs = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, tenant_id, plan, status, current_period_start,
                   current_period_end, created_at, updated_at
            FROM subscriptions
            WHERE status = 'active' AND current_period_end <= $1
            ORDER BY current_period_end
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(subs)
    }

    async fn expire_unpaid(&self, id: Uuid) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let tenant_id: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE subscriptions
            SET status = 'expired', updated_at = NOW()
            WHERE id = $1 AND status IN ('trial', 'pending_payment')
            RETURNING tenant_id
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((tenant_id,)) = tenant_id else {
            // Row is unknown or was paid for since the caller read it.
            tx.rollback().await?;
            return Err(DbError::NotFound);
        };

        sqlx::query("UPDATE tenants SET status = 'expired', updated_at = NOW() WHERE id = $1")
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn expire_lapsed(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let tenant_id: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE subscriptions
            SET status = 'expired', updated_at = NOW()
            WHERE id = $1 AND status = 'active' AND current_period_end <= $2
            RETURNING tenant_id
            "#,
        )
        .bind(id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((tenant_id,)) = tenant_id else {
            // Row is unknown or a renewal opened a new period since the scan.
            tx.rollback().await?;
            return Err(DbError::NotFound);
        };

        sqlx::query("UPDATE tenants SET status = 'suspended', updated_at = NOW() WHERE id = $1")
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}
