//! Mock repositories and notifiers for testing

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use rahba_billing_core::{BillingError, Notifier};
use rahba_db::{
    ApprovePayment, CreatePayment, DbError, DbResult, PaymentRepository, PaymentRow,
    ProvisionMerchant, ProvisionedMerchant, SubscriptionRepository, SubscriptionRow,
    TenantRepository, TenantRow, UserRow,
};

/// In-memory tenant repository for testing
#[derive(Default, Clone)]
pub struct MockTenantRepository {
    tenants: Arc<DashMap<Uuid, TenantRow>>,
    by_subdomain: Arc<DashMap<String, Uuid>>,
}

impl MockTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and store a tenant with the given status and trial window
    pub fn seed(&self, status: &str, trial_ends_at: DateTime<Utc>) -> TenantRow {
        let id = Uuid::new_v4();
        let row = TenantRow {
            id,
            subdomain: format!("store-{}", &id.to_string()[..8]),
            name: "Boutique Test".to_string(),
            status: status.to_string(),
            trial_ends_at,
            product_count: 0,
            order_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.by_subdomain.insert(row.subdomain.clone(), id);
        self.tenants.insert(id, row.clone());
        row
    }

    /// Read back a stored tenant
    pub fn get(&self, id: Uuid) -> Option<TenantRow> {
        self.tenants.get(&id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl TenantRepository for MockTenantRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<TenantRow>> {
        Ok(self.tenants.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_subdomain(&self, subdomain: &str) -> DbResult<Option<TenantRow>> {
        Ok(self
            .by_subdomain
            .get(subdomain)
            .and_then(|id| self.tenants.get(id.value()).map(|r| r.value().clone())))
    }

    async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<TenantRow>> {
        let mut all: Vec<TenantRow> = self.tenants.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn provision(&self, input: ProvisionMerchant) -> DbResult<ProvisionedMerchant> {
        let now = Utc::now();
        let tenant = TenantRow {
            id: input.tenant_id,
            subdomain: input.subdomain.clone(),
            name: input.store_name.clone(),
            status: "trial".to_string(),
            trial_ends_at: input.trial_ends_at,
            product_count: 0,
            order_count: 0,
            created_at: now,
            updated_at: now,
        };
        self.by_subdomain.insert(tenant.subdomain.clone(), tenant.id);
        self.tenants.insert(tenant.id, tenant.clone());
        Ok(ProvisionedMerchant {
            tenant,
            subscription: SubscriptionRow {
                id: input.subscription_id,
                tenant_id: input.tenant_id,
                plan: input.plan,
                status: "trial".to_string(),
                current_period_start: input.period_start,
                current_period_end: input.trial_ends_at,
                created_at: now,
                updated_at: now,
            },
            user: UserRow {
                id: input.user_id,
                tenant_id: Some(input.tenant_id),
                email: input.email,
                password_hash: input.password_hash,
                full_name: input.full_name,
                role: input.role,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        })
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<()> {
        if let Some(mut tenant) = self.tenants.get_mut(&id) {
            tenant.status = status.to_string();
            tenant.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn try_reserve_product_slot(&self, id: Uuid, limit: i32) -> DbResult<bool> {
        let mut tenant = match self.tenants.get_mut(&id) {
            Some(t) => t,
            None => return Ok(false),
        };
        if tenant.status == "trial" && tenant.product_count >= limit {
            return Ok(false);
        }
        tenant.product_count += 1;
        Ok(true)
    }

    async fn try_reserve_order_slot(&self, id: Uuid, limit: i32) -> DbResult<bool> {
        let mut tenant = match self.tenants.get_mut(&id) {
            Some(t) => t,
            None => return Ok(false),
        };
        if tenant.status == "trial" && tenant.order_count >= limit {
            return Ok(false);
        }
        tenant.order_count += 1;
        Ok(true)
    }

    async fn release_product_slot(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut tenant) = self.tenants.get_mut(&id) {
            tenant.product_count = (tenant.product_count - 1).max(0);
        }
        Ok(())
    }

    async fn release_order_slot(&self, id: Uuid) -> DbResult<()> {
        if let Some(mut tenant) = self.tenants.get_mut(&id) {
            tenant.order_count = (tenant.order_count - 1).max(0);
        }
        Ok(())
    }

    async fn find_expired_trials(&self, now: DateTime<Utc>) -> DbResult<Vec<TenantRow>> {
        Ok(self
            .tenants
            .iter()
            .filter(|r| r.status == "trial" && r.trial_ends_at <= now)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn find_trials_ending_within(
        &self,
        now: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<Vec<TenantRow>> {
        Ok(self
            .tenants
            .iter()
            .filter(|r| r.status == "trial" && r.trial_ends_at > now && r.trial_ends_at <= until)
            .map(|r| r.value().clone())
            .collect())
    }
}

/// In-memory subscription repository for testing
///
/// Holds a tenant handle so the expiry methods can move both rows in one
/// step, like the transactions they stand in for.
#[derive(Clone)]
pub struct MockSubscriptionRepository {
    subscriptions: Arc<DashMap<Uuid, SubscriptionRow>>,
    by_tenant: Arc<DashMap<Uuid, Uuid>>,
    tenants: MockTenantRepository,
    fail_next_expire: Arc<AtomicBool>,
}

impl MockSubscriptionRepository {
    pub fn new(tenants: MockTenantRepository) -> Self {
        Self {
            subscriptions: Arc::new(DashMap::new()),
            by_tenant: Arc::new(DashMap::new()),
            tenants,
            fail_next_expire: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make the next expiry call fail like a lost connection
    #[allow(dead_code)]
    pub fn fail_next_expire(&self) {
        self.fail_next_expire.store(true, Ordering::SeqCst);
    }

    /// Build and store a subscription for a tenant
    pub fn seed_for(
        &self,
        tenant_id: Uuid,
        plan: &str,
        status: &str,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> SubscriptionRow {
        let row = SubscriptionRow {
            id: Uuid::new_v4(),
            tenant_id,
            plan: plan.to_string(),
            status: status.to_string(),
            current_period_start: period_start,
            current_period_end: period_end,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.by_tenant.insert(tenant_id, row.id);
        self.subscriptions.insert(row.id, row.clone());
        row
    }

    /// Read back a stored subscription
    pub fn get(&self, id: Uuid) -> Option<SubscriptionRow> {
        self.subscriptions.get(&id).map(|r| r.value().clone())
    }

    /// Activate a subscription and its tenant, as the approval
    /// transaction does
    fn activate(&self, id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> DbResult<()> {
        let tenant_id = {
            let mut sub = self.subscriptions.get_mut(&id).ok_or(DbError::NotFound)?;
            sub.status = "active".to_string();
            sub.current_period_start = start;
            sub.current_period_end = end;
            sub.updated_at = Utc::now();
            sub.tenant_id
        };
        if let Some(mut tenant) = self.tenants.tenants.get_mut(&tenant_id) {
            tenant.status = "active".to_string();
            tenant.updated_at = Utc::now();
        }
        Ok(())
    }

    fn expire_with_tenant_status(&self, id: Uuid, tenant_status: &str) -> DbResult<()> {
        let tenant_id = {
            let mut sub = self.subscriptions.get_mut(&id).ok_or(DbError::NotFound)?;
            sub.status = "expired".to_string();
            sub.updated_at = Utc::now();
            sub.tenant_id
        };
        if let Some(mut tenant) = self.tenants.tenants.get_mut(&tenant_id) {
            tenant.status = tenant_status.to_string();
            tenant.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepository for MockSubscriptionRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self.subscriptions.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_tenant(&self, tenant_id: Uuid) -> DbResult<Option<SubscriptionRow>> {
        Ok(self
            .by_tenant
            .get(&tenant_id)
            .and_then(|id| self.subscriptions.get(id.value()).map(|r| r.value().clone())))
    }

    async fn set_plan_pending(&self, id: Uuid, plan: &str) -> DbResult<()> {
        if let Some(mut sub) = self.subscriptions.get_mut(&id) {
            sub.plan = plan.to_string();
            sub.status = "pending_payment".to_string();
            sub.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn find_expired_active(&self, now: DateTime<Utc>) -> DbResult<Vec<SubscriptionRow>> {
        Ok(self
            .subscriptions
            .iter()
            .filter(|r| r.status == "active" && r.current_period_end <= now)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn expire_unpaid(&self, id: Uuid) -> DbResult<()> {
        if self.fail_next_expire.swap(false, Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let still_unpaid = self
            .subscriptions
            .get(&id)
            .map(|r| r.status == "trial" || r.status == "pending_payment")
            .unwrap_or(false);
        if !still_unpaid {
            return Err(DbError::NotFound);
        }
        self.expire_with_tenant_status(id, "expired")
    }

    async fn expire_lapsed(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<()> {
        if self.fail_next_expire.swap(false, Ordering::SeqCst) {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let still_lapsed = self
            .subscriptions
            .get(&id)
            .map(|r| r.status == "active" && r.current_period_end <= now)
            .unwrap_or(false);
        if !still_lapsed {
            return Err(DbError::NotFound);
        }
        self.expire_with_tenant_status(id, "suspended")
    }
}

/// In-memory payment repository for testing
///
/// Approval reaches through the subscription handle to activate the
/// subscription and tenant, mirroring the three-table transaction. A
/// forced failure leaves every row untouched.
#[derive(Clone)]
pub struct MockPaymentRepository {
    payments: Arc<DashMap<Uuid, PaymentRow>>,
    subscriptions: MockSubscriptionRepository,
    fail_next_approve: Arc<AtomicBool>,
}

impl MockPaymentRepository {
    pub fn new(subscriptions: MockSubscriptionRepository) -> Self {
        Self {
            payments: Arc::new(DashMap::new()),
            subscriptions,
            fail_next_approve: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make the next approve fail like a lost connection mid-transaction
    #[allow(dead_code)]
    pub fn fail_next_approve(&self) {
        self.fail_next_approve.store(true, Ordering::SeqCst);
    }

    /// Read back a stored payment
    pub fn get(&self, id: Uuid) -> Option<PaymentRow> {
        self.payments.get(&id).map(|r| r.value().clone())
    }
}

#[async_trait]
impl PaymentRepository for MockPaymentRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<PaymentRow>> {
        Ok(self.payments.get(&id).map(|r| r.value().clone()))
    }

    async fn create(&self, payment: CreatePayment) -> DbResult<PaymentRow> {
        let row = PaymentRow {
            id: payment.id,
            subscription_id: payment.subscription_id,
            amount: payment.amount,
            payer_email: payment.payer_email,
            payment_proof: payment.payment_proof,
            baridimob_ref: payment.baridimob_ref,
            status: "pending".to_string(),
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: Utc::now(),
        };
        self.payments.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list(
        &self,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<PaymentRow>> {
        let mut all: Vec<PaymentRow> = self
            .payments
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .map(|r| r.value().clone())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn list_for_subscription(&self, subscription_id: Uuid) -> DbResult<Vec<PaymentRow>> {
        let mut rows: Vec<PaymentRow> = self
            .payments
            .iter()
            .filter(|r| r.subscription_id == subscription_id)
            .map(|r| r.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn approve(&self, input: ApprovePayment) -> DbResult<PaymentRow> {
        if self.fail_next_approve.swap(false, Ordering::SeqCst) {
            // Fails before any write, like a rolled-back transaction.
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }

        let (row, subscription_id) = {
            let mut payment = self
                .payments
                .get_mut(&input.payment_id)
                .filter(|p| p.status == "pending")
                .ok_or(DbError::NotFound)?;
            payment.status = "approved".to_string();
            payment.approved_by = Some(input.approved_by);
            payment.approved_at = Some(input.approved_at);
            (payment.clone(), payment.subscription_id)
        };

        self.subscriptions
            .activate(subscription_id, input.period_start, input.period_end)?;

        Ok(row)
    }

    async fn reject(&self, id: Uuid, reason: &str) -> DbResult<PaymentRow> {
        let mut payment = self
            .payments
            .get_mut(&id)
            .filter(|p| p.status == "pending")
            .ok_or(DbError::NotFound)?;
        payment.status = "rejected".to_string();
        payment.rejection_reason = Some(reason.to_string());
        Ok(payment.clone())
    }
}

/// Notifier that records every message it is handed
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every (title, message) pair delivered so far
    pub fn delivered(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }

    /// Number of delivered notifications
    pub fn count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), BillingError> {
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        Ok(())
    }
}

/// Notifier that refuses every message
#[derive(Default, Clone)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _title: &str, _message: &str) -> Result<(), BillingError> {
        Err(BillingError::Notify("telegram unreachable".to_string()))
    }
}
