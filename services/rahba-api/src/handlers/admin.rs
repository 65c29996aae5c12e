//! Platform admin handlers: payment review and tenant oversight

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

use rahba_db::{SubscriptionRepository, TenantRepository, TenantRow};

use crate::error::ApiResult;
use crate::extractors::Admin;
use crate::handlers::shared::{self, PageQuery, page_bounds};
use crate::handlers::subscription::{
    PaymentResponse, SubscriptionResponse, payment_to_response, subscription_to_response,
};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PaymentListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PaymentListResponse {
    pub payments: Vec<PaymentResponse>,
}

#[derive(Debug, Deserialize)]
pub struct RejectPaymentRequest {
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct TenantSummaryResponse {
    pub id: String,
    pub subdomain: String,
    pub name: String,
    pub status: String,
    pub trial_ends_at: String,
    pub product_count: i32,
    pub order_count: i32,
    pub created_at: String,
    pub subscription: Option<SubscriptionResponse>,
}

#[derive(Debug, Serialize)]
pub struct TenantListResponse {
    pub tenants: Vec<TenantSummaryResponse>,
}

fn tenant_to_summary(row: TenantRow, subscription: Option<SubscriptionResponse>) -> TenantSummaryResponse {
    TenantSummaryResponse {
        id: row.id.to_string(),
        subdomain: row.subdomain,
        name: row.name,
        status: row.status,
        trial_ends_at: row.trial_ends_at.to_rfc3339(),
        product_count: row.product_count,
        order_count: row.order_count,
        created_at: row.created_at.to_rfc3339(),
        subscription,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /admin/payments
pub async fn list_payments(
    State(state): State<AppState>,
    _admin: Admin,
    Query(q): Query<PaymentListQuery>,
) -> ApiResult<Json<PaymentListResponse>> {
    let start = Instant::now();
    let (limit, offset) = page_bounds(q.limit, q.offset);

    let result = state
        .billing
        .list_payments(q.status.as_deref(), limit, offset)
        .await;
    shared::record_op_duration("list_payments", start, result.is_ok());

    Ok(Json(PaymentListResponse {
        payments: result?.into_iter().map(payment_to_response).collect(),
    }))
}

/// POST /admin/payments/{id}/approve
///
/// Transactional: payment approved, subscription activated for a fresh
/// period, tenant reopened
pub async fn approve_payment(
    State(state): State<AppState>,
    admin: Admin,
    Path(payment_id): Path<Uuid>,
) -> ApiResult<Json<PaymentResponse>> {
    let start = Instant::now();

    let result = state.billing.approve_payment(payment_id, admin.user_id).await;
    shared::record_op_duration("approve_payment", start, result.is_ok());
    let payment = result?;

    metrics::counter!("payments_approved_total").increment(1);
    tracing::info!(
        payment_id = %payment.id,
        admin_id = %admin.user_id,
        "Payment approved"
    );

    Ok(Json(payment_to_response(payment)))
}

/// POST /admin/payments/{id}/reject
pub async fn reject_payment(
    State(state): State<AppState>,
    admin: Admin,
    Path(payment_id): Path<Uuid>,
    Json(req): Json<RejectPaymentRequest>,
) -> ApiResult<Json<PaymentResponse>> {
    let start = Instant::now();

    let result = state.billing.reject_payment(payment_id, &req.reason).await;
    shared::record_op_duration("reject_payment", start, result.is_ok());
    let payment = result?;

    metrics::counter!("payments_rejected_total").increment(1);
    tracing::info!(
        payment_id = %payment.id,
        admin_id = %admin.user_id,
        "Payment rejected"
    );

    Ok(Json(payment_to_response(payment)))
}

/// GET /admin/tenants
///
/// Tenants with their subscription state, newest first
pub async fn list_tenants(
    State(state): State<AppState>,
    _admin: Admin,
    Query(q): Query<PageQuery>,
) -> ApiResult<Json<TenantListResponse>> {
    let start = Instant::now();
    let (limit, offset) = page_bounds(q.limit, q.offset);

    let tenants = match state.repos.tenants.list(limit, offset).await {
        Ok(rows) => rows,
        Err(e) => {
            shared::record_op_duration("list_tenants", start, false);
            return Err(e.into());
        }
    };

    let mut summaries = Vec::with_capacity(tenants.len());
    for tenant in tenants {
        let subscription = state
            .repos
            .subscriptions
            .find_by_tenant(tenant.id)
            .await?
            .map(subscription_to_response);
        summaries.push(tenant_to_summary(tenant, subscription));
    }
    shared::record_op_duration("list_tenants", start, true);

    Ok(Json(TenantListResponse { tenants: summaries }))
}
