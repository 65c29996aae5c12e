//! Delivery zone handler

use axum::Json;
use axum::extract::State;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ZoneResponse {
    pub wilaya: String,
    pub fee: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ZoneListResponse {
    pub zones: Vec<ZoneResponse>,
}

/// GET /delivery/zones
///
/// Public wilaya fee table, used by storefront checkout pages
pub async fn list_zones(State(state): State<AppState>) -> ApiResult<Json<ZoneListResponse>> {
    let zones = state.zones.list_zones().await?;

    Ok(Json(ZoneListResponse {
        zones: zones
            .into_iter()
            .map(|row| ZoneResponse {
                wilaya: row.wilaya,
                fee: row.fee,
            })
            .collect(),
    }))
}
