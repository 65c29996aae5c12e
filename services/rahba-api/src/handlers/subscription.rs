//! Subscription handlers: overview and BaridiMob payment submission

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use rahba_billing_core::{PlanPricing, SubmitPayment, plan_catalog};
use rahba_db::{PaymentRow, SubscriptionRow};
use rahba_types::Plan;

use crate::error::{ApiError, ApiResult};
use crate::extractors::Merchant;
use crate::handlers::shared;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub plan: String,
    pub status: String,
    pub current_period_start: String,
    pub current_period_end: String,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub subscription_id: String,
    pub amount: Decimal,
    pub payer_email: String,
    pub payment_proof: String,
    pub baridimob_ref: Option<String>,
    pub status: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionOverviewResponse {
    pub subscription: SubscriptionResponse,
    pub payments: Vec<PaymentResponse>,
    pub plans: Vec<PlanPricing>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPaymentRequest {
    pub plan: String,
    pub payer_email: String,
    pub payment_proof: String,
    pub baridimob_ref: Option<String>,
}

pub(super) fn subscription_to_response(row: SubscriptionRow) -> SubscriptionResponse {
    SubscriptionResponse {
        id: row.id.to_string(),
        plan: row.plan,
        status: row.status,
        current_period_start: row.current_period_start.to_rfc3339(),
        current_period_end: row.current_period_end.to_rfc3339(),
    }
}

pub(super) fn payment_to_response(row: PaymentRow) -> PaymentResponse {
    PaymentResponse {
        id: row.id.to_string(),
        subscription_id: row.subscription_id.to_string(),
        amount: row.amount,
        payer_email: row.payer_email,
        payment_proof: row.payment_proof,
        baridimob_ref: row.baridimob_ref,
        status: row.status,
        approved_by: row.approved_by.map(|id| id.to_string()),
        approved_at: row.approved_at.map(|t| t.to_rfc3339()),
        rejection_reason: row.rejection_reason,
        created_at: row.created_at.to_rfc3339(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /subscription
///
/// The store's subscription, its payment history and the plan price list
pub async fn get_subscription(
    State(state): State<AppState>,
    merchant: Merchant,
) -> ApiResult<Json<SubscriptionOverviewResponse>> {
    let start = Instant::now();

    let result = state.billing.overview(merchant.tenant_id).await;
    shared::record_op_duration("get_subscription", start, result.is_ok());
    let overview = result?;

    Ok(Json(SubscriptionOverviewResponse {
        subscription: subscription_to_response(overview.subscription),
        payments: overview
            .payments
            .into_iter()
            .map(payment_to_response)
            .collect(),
        plans: plan_catalog(),
    }))
}

/// POST /subscription/payment/submit
///
/// Submit BaridiMob transfer proof; the amount is the server-side plan
/// price, and the subscription moves to pending_payment
pub async fn submit_payment(
    State(state): State<AppState>,
    merchant: Merchant,
    Json(req): Json<SubmitPaymentRequest>,
) -> ApiResult<(StatusCode, Json<PaymentResponse>)> {
    let start = Instant::now();

    let plan: Plan = req
        .plan
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid plan: {}", req.plan)))?;

    let result = state
        .billing
        .submit_payment(
            merchant.tenant_id,
            SubmitPayment {
                plan,
                payer_email: req.payer_email,
                payment_proof: req.payment_proof,
                baridimob_ref: req.baridimob_ref,
            },
        )
        .await;
    shared::record_op_duration("submit_payment", start, result.is_ok());
    let payment = result?;

    metrics::counter!("payments_submitted_total").increment(1);
    tracing::info!(
        tenant_id = %merchant.tenant_id,
        payment_id = %payment.id,
        plan = %plan,
        "Payment proof submitted"
    );

    Ok((StatusCode::CREATED, Json(payment_to_response(payment))))
}
