//! Quota advisory handler for the merchant dashboard

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use rahba_store_core::LimitStatus;

use crate::error::ApiResult;
use crate::extractors::Merchant;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LimitsResponse {
    pub status: String,
    pub trial_ends_at: String,
    pub can_add_product: bool,
    pub can_add_order: bool,
    /// Refusal message when either flag is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub products: LimitInfo,
    pub orders: LimitInfo,
}

#[derive(Debug, Serialize)]
pub struct LimitInfo {
    pub used: i32,
    /// Absent when the store is not on trial (unlimited)
    pub limit: Option<i32>,
    pub remaining: Option<i32>,
}

impl From<LimitStatus> for LimitInfo {
    fn from(status: LimitStatus) -> Self {
        Self {
            used: status.used,
            limit: status.limit,
            remaining: status.remaining,
        }
    }
}

/// GET /merchant/limits
///
/// Advisory read; the binding check happens inside each write
pub async fn get_limits(
    State(state): State<AppState>,
    merchant: Merchant,
) -> ApiResult<Json<LimitsResponse>> {
    let usage = state.quota.usage(merchant.tenant_id).await?;

    Ok(Json(LimitsResponse {
        status: usage.status.to_string(),
        trial_ends_at: usage.trial_ends_at.to_rfc3339(),
        can_add_product: usage.can_add_product,
        can_add_order: usage.can_add_order,
        reason: usage.reason,
        products: usage.products.into(),
        orders: usage.orders.into(),
    }))
}
