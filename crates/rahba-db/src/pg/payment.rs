//! PostgreSQL payment repository implementation

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::PaymentRow;
use crate::repo::{ApprovePayment, CreatePayment, PaymentRepository};

/// PostgreSQL payment repository
#[derive(Clone)]
pub struct PgPaymentRepository {
    pool: PgPool,
}

impl PgPaymentRepository {
    /// Create a new payment repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentRepository for PgPaymentRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PaymentRow>> {
        let payment = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, subscription_id, amount, payer_email, payment_proof,
                   baridimob_ref, status, approved_by, approved_at,
                   rejection_reason, created_at
            FROM payments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(payment)
    }

    async fn create(&self, payment: CreatePayment) -> DbResult<PaymentRow> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"
            INSERT INTO payments (id, subscription_id, amount, payer_email,
                                  payment_proof, baridimob_ref)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, subscription_id, amount, payer_email, payment_proof,
                      baridimob_ref, status, approved_by, approved_at,
                      rejection_reason, created_at
            "#,
        )
        .bind(payment.id)
        .bind(payment.subscription_id)
        .bind(payment.amount)
        .bind(&payment.payer_email)
        .bind(&payment.payment_proof)
        .bind(&payment.baridimob_ref)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list(
        &self,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<PaymentRow>> {
        let payments = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, subscription_id, amount, payer_email, payment_proof,
                   baridimob_ref, status, approved_by, approved_at,
                   rejection_reason, created_at
            FROM payments
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn list_for_subscription(&self, subscription_id: Uuid) -> DbResult<Vec<PaymentRow>> {
        let payments = sqlx::query_as::<_, PaymentRow>(
            r#"
            SELECT id, subscription_id, amount, payer_email, payment_proof,
                   baridimob_ref, status, approved_by, approved_at,
                   rejection_reason, created_at
            FROM payments
            WHERE subscription_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(subscription_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    async fn approve(&self, input: ApprovePayment) -> DbResult<PaymentRow> {
        let mut tx = self.pool.begin().await?;

        // The status guard makes a concurrent double-decide lose the race
        // and roll back instead of re-approving.
        let payment = sqlx::query_as::<_, PaymentRow>(
            r#"
            UPDATE payments
            SET status = 'approved', approved_by = $2, approved_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING id, subscription_id, amount, payer_email, payment_proof,
                      baridimob_ref, status, approved_by, approved_at,
                      rejection_reason, created_at
            "#,
        )
        .bind(input.payment_id)
        .bind(input.approved_by)
        .bind(input.approved_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(payment) = payment else {
            tx.rollback().await?;
            return Err(DbError::NotFound);
        };

        let tenant_id: Option<(Uuid,)> = sqlx::query_as(
            r#"
            UPDATE subscriptions
            SET status = 'active', current_period_start = $2,
                current_period_end = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING tenant_id
            "#,
        )
        .bind(payment.subscription_id)
        .bind(input.period_start)
        .bind(input.period_end)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((tenant_id,)) = tenant_id else {
            tx.rollback().await?;
            return Err(DbError::NotFound);
        };

        let result =
            sqlx::query("UPDATE tenants SET status = 'active', updated_at = NOW() WHERE id = $1")
                .bind(tenant_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(DbError::NotFound);
        }

        tx.commit().await?;

        Ok(payment)
    }

    async fn reject(&self, id: Uuid, reason: &str) -> DbResult<PaymentRow> {
        let payment = sqlx::query_as::<_, PaymentRow>(
            r#"
            UPDATE payments
            SET status = 'rejected', rejection_reason = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING id, subscription_id, amount, payer_email, payment_proof,
                      baridimob_ref, status, approved_by, approved_at,
                      rejection_reason, created_at
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;

        payment.ok_or(DbError::NotFound)
    }
}
