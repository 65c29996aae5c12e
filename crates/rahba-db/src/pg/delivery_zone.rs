//! PostgreSQL delivery zone repository implementation

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DbResult;
use crate::models::DeliveryZoneRow;
use crate::repo::DeliveryZoneRepository;

/// PostgreSQL delivery zone repository
#[derive(Clone)]
pub struct PgDeliveryZoneRepository {
    pool: PgPool,
}

impl PgDeliveryZoneRepository {
    /// Create a new delivery zone repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliveryZoneRepository for PgDeliveryZoneRepository {
    async fn find_by_wilaya(&self, wilaya: &str) -> DbResult<Option<DeliveryZoneRow>> {
        let zone = sqlx::query_as::<_, DeliveryZoneRow>(
            r#"
            SELECT id, wilaya, fee, created_at
            FROM delivery_zones
            WHERE LOWER(wilaya) = LOWER($1)
            "#,
        )
        .bind(wilaya)
        .fetch_optional(&self.pool)
        .await?;

        Ok(zone)
    }

    async fn list(&self) -> DbResult<Vec<DeliveryZoneRow>> {
        let zones = sqlx::query_as::<_, DeliveryZoneRow>(
            "SELECT id, wilaya, fee, created_at FROM delivery_zones ORDER BY wilaya",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(zones)
    }

    async fn upsert(&self, wilaya: &str, fee: Decimal) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO delivery_zones (id, wilaya, fee)
            VALUES ($1, $2, $3)
            ON CONFLICT (wilaya) DO UPDATE SET fee = EXCLUDED.fee
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(wilaya)
        .bind(fee)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
