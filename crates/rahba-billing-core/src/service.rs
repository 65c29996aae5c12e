//! Subscription overview, payment submission, and admin review
//!
//! BaridiMob transfers cannot be verified programmatically, so billing is
//! built around a manual review queue: merchants submit a transfer proof,
//! an admin approves or rejects it, and approval opens a fresh paid
//! period. Every amount is taken from the fixed plan table; nothing the
//! merchant sends can change what a plan costs.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use rahba_db::{
    ApprovePayment, CreatePayment, DbError, PaymentRepository, PaymentRow,
    SubscriptionRepository, SubscriptionRow,
};
use rahba_types::{PaymentStatus, Plan};

use crate::error::BillingError;

/// Length of a paid period opened by an approval, in days
pub const SUBSCRIPTION_PERIOD_DAYS: i64 = 30;

/// Hard cap on review queue page size
const MAX_PAGE_SIZE: i64 = 100;

const MAX_PROOF_LEN: usize = 2048;
const MAX_REF_LEN: usize = 100;

/// Payment proof submitted by a merchant
#[derive(Debug, Clone)]
pub struct SubmitPayment {
    /// Plan the merchant is paying for
    pub plan: Plan,
    /// Email the BaridiMob transfer was sent from
    pub payer_email: String,
    /// Proof of transfer, an uploaded screenshot URL or reference text
    pub payment_proof: String,
    /// Optional BaridiMob transaction reference
    pub baridimob_ref: Option<String>,
}

/// A subscription together with its payment history, newest first
#[derive(Debug, Clone)]
pub struct SubscriptionOverview {
    pub subscription: SubscriptionRow,
    pub payments: Vec<PaymentRow>,
}

/// A plan with its fixed monthly price
#[derive(Debug, Clone, Serialize)]
pub struct PlanPricing {
    pub plan: Plan,
    pub monthly_price: Decimal,
}

/// All purchasable plans, in ascending price order
pub fn plan_catalog() -> Vec<PlanPricing> {
    Plan::all()
        .iter()
        .map(|plan| PlanPricing {
            plan: *plan,
            monthly_price: plan.monthly_price(),
        })
        .collect()
}

/// Billing workflows over subscription and payment storage
pub struct BillingService<S: SubscriptionRepository, P: PaymentRepository> {
    subscriptions: Arc<S>,
    payments: Arc<P>,
}

impl<S: SubscriptionRepository, P: PaymentRepository> BillingService<S, P> {
    /// Create a new billing service
    pub fn new(subscriptions: Arc<S>, payments: Arc<P>) -> Self {
        Self {
            subscriptions,
            payments,
        }
    }

    // =========================================================================
    // Merchant Side
    // =========================================================================

    /// The tenant's subscription with its payment history.
    pub async fn overview(&self, tenant_id: Uuid) -> Result<SubscriptionOverview, BillingError> {
        let subscription = self
            .subscriptions
            .find_by_tenant(tenant_id)
            .await?
            .ok_or(BillingError::SubscriptionNotFound)?;

        let payments = self
            .payments
            .list_for_subscription(subscription.id)
            .await?;

        Ok(SubscriptionOverview {
            subscription,
            payments,
        })
    }

    /// Record a BaridiMob payment proof for review.
    ///
    /// The payment is stored pending with the plan's advertised price as
    /// its amount, and the subscription moves to pending_payment carrying
    /// the requested plan. Nothing is activated until an admin approves.
    #[instrument(skip(self, input), fields(plan = %input.plan))]
    pub async fn submit_payment(
        &self,
        tenant_id: Uuid,
        input: SubmitPayment,
    ) -> Result<PaymentRow, BillingError> {
        let payer_email = normalize_payer_email(&input.payer_email)?;
        let payment_proof = require_proof(&input.payment_proof)?;
        let baridimob_ref = normalize_ref(input.baridimob_ref.as_deref())?;

        let subscription = self
            .subscriptions
            .find_by_tenant(tenant_id)
            .await?
            .ok_or(BillingError::SubscriptionNotFound)?;

        // The plan table is the only source of the charged amount.
        let amount = input.plan.monthly_price();

        let payment = self
            .payments
            .create(CreatePayment {
                id: Uuid::new_v4(),
                subscription_id: subscription.id,
                amount,
                payer_email,
                payment_proof,
                baridimob_ref,
            })
            .await?;

        self.subscriptions
            .set_plan_pending(subscription.id, &input.plan.to_string())
            .await?;

        info!(
            payment_id = %payment.id,
            subscription_id = %subscription.id,
            plan = %input.plan,
            amount = %amount,
            "Payment proof submitted for review"
        );

        Ok(payment)
    }

    // =========================================================================
    // Admin Review
    // =========================================================================

    /// A single payment by ID.
    pub async fn get_payment(&self, payment_id: Uuid) -> Result<PaymentRow, BillingError> {
        self.payments
            .find_by_id(payment_id)
            .await?
            .ok_or(BillingError::PaymentNotFound)
    }

    /// The review queue, optionally filtered by status, newest first.
    pub async fn list_payments(
        &self,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PaymentRow>, BillingError> {
        let status = match status {
            Some(raw) => Some(
                raw.parse::<PaymentStatus>()
                    .map_err(|e| BillingError::Validation(e.to_string()))?,
            ),
            None => None,
        };

        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let offset = offset.max(0);

        let status = status.map(|s| s.to_string());
        let rows = self
            .payments
            .list(status.as_deref(), limit, offset)
            .await?;

        Ok(rows)
    }

    /// Approve a pending payment and activate its subscription.
    ///
    /// Opens a paid period starting now. The payment stamp, the
    /// subscription period, and the tenant reactivation commit as one
    /// transaction; a payment decided by another admin in the meantime
    /// surfaces as a conflict.
    #[instrument(skip(self))]
    pub async fn approve_payment(
        &self,
        payment_id: Uuid,
        admin_id: Uuid,
    ) -> Result<PaymentRow, BillingError> {
        let payment = self.require_decidable(payment_id).await?;

        let now = Utc::now();
        let approved = self
            .payments
            .approve(ApprovePayment {
                payment_id: payment.id,
                approved_by: admin_id,
                approved_at: now,
                period_start: now,
                period_end: now + Duration::days(SUBSCRIPTION_PERIOD_DAYS),
            })
            .await
            .map_err(decided_under_us)?;

        info!(
            payment_id = %approved.id,
            subscription_id = %approved.subscription_id,
            admin_id = %admin_id,
            "Payment approved, subscription activated"
        );

        Ok(approved)
    }

    /// Reject a pending payment with a reason for the merchant.
    #[instrument(skip(self, reason))]
    pub async fn reject_payment(
        &self,
        payment_id: Uuid,
        reason: &str,
    ) -> Result<PaymentRow, BillingError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(BillingError::Validation(
                "a rejection reason is required".to_string(),
            ));
        }

        self.require_decidable(payment_id).await?;

        let rejected = self
            .payments
            .reject(payment_id, reason)
            .await
            .map_err(decided_under_us)?;

        info!(
            payment_id = %rejected.id,
            subscription_id = %rejected.subscription_id,
            "Payment rejected"
        );

        Ok(rejected)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn require_decidable(&self, payment_id: Uuid) -> Result<PaymentRow, BillingError> {
        let payment = self
            .payments
            .find_by_id(payment_id)
            .await?
            .ok_or(BillingError::PaymentNotFound)?;

        let status: PaymentStatus = payment
            .status
            .parse()
            .map_err(|e: rahba_types::EnumParseError| BillingError::Internal(e.to_string()))?;

        if !status.is_decidable() {
            return Err(BillingError::PaymentAlreadyDecided);
        }

        Ok(payment)
    }
}

impl<S: SubscriptionRepository, P: PaymentRepository> std::fmt::Debug for BillingService<S, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BillingService").finish_non_exhaustive()
    }
}

/// The guarded decision update found no pending row.
fn decided_under_us(err: DbError) -> BillingError {
    match err {
        DbError::NotFound => BillingError::PaymentAlreadyDecided,
        other => other.into(),
    }
}

fn normalize_payer_email(raw: &str) -> Result<String, BillingError> {
    let email = raw.trim().to_lowercase();
    if email.len() < 3 || !email.contains('@') {
        return Err(BillingError::Validation(
            "payer email looks invalid".to_string(),
        ));
    }
    Ok(email)
}

fn require_proof(raw: &str) -> Result<String, BillingError> {
    let proof = raw.trim();
    if proof.is_empty() {
        return Err(BillingError::Validation(
            "a payment proof is required".to_string(),
        ));
    }
    if proof.len() > MAX_PROOF_LEN {
        return Err(BillingError::Validation(format!(
            "payment proof must be at most {MAX_PROOF_LEN} characters"
        )));
    }
    Ok(proof.to_string())
}

fn normalize_ref(raw: Option<&str>) -> Result<Option<String>, BillingError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let reference = raw.trim();
    if reference.is_empty() {
        return Ok(None);
    }
    if reference.len() > MAX_REF_LEN {
        return Err(BillingError::Validation(format!(
            "baridimob reference must be at most {MAX_REF_LEN} characters"
        )));
    }
    Ok(Some(reference.to_string()))
}
