//! Delivery zone seed data
//!
//! Wilaya fees used to initialize a fresh database. Upserted behind the
//! AUTO_SEED boot flag; re-running refreshes fees without duplicating
//! rows.

use rust_decimal::Decimal;
use tracing::info;

use crate::error::DbResult;
use crate::repo::DeliveryZoneRepository;

/// Default wilaya delivery fees in DA
pub const DEFAULT_ZONES: &[(&str, u32)] = &[
    ("Adrar", 900),
    ("Alger", 400),
    ("Annaba", 650),
    ("Batna", 600),
    ("Béjaïa", 500),
    ("Blida", 400),
    ("Boumerdès", 450),
    ("Constantine", 550),
    ("Ghardaïa", 750),
    ("Mostaganem", 550),
    ("Oran", 500),
    ("Ouargla", 800),
    ("Sétif", 600),
    ("Skikda", 600),
    ("Tamanrasset", 1000),
    ("Tipaza", 450),
    ("Tizi Ouzou", 450),
    ("Tlemcen", 650),
];

/// Upsert the default delivery zones
pub async fn seed_delivery_zones(repo: &impl DeliveryZoneRepository) -> DbResult<usize> {
    for (wilaya, fee) in DEFAULT_ZONES {
        repo.upsert(wilaya, Decimal::from(*fee)).await?;
    }

    info!(zones = DEFAULT_ZONES.len(), "delivery zones seeded");
    Ok(DEFAULT_ZONES.len())
}
