//! Mock repositories for testing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use rahba_db::{
    CreateSession, CreateUser, DbError, DbResult, ProvisionMerchant, ProvisionedMerchant,
    SessionRepository, SessionRow, SubscriptionRow, TenantRepository, TenantRow, UserRepository,
    UserRow,
};

/// In-memory user repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a test user directly
    pub fn insert_user(&self, user: UserRow) {
        self.by_email.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
    }

    /// Number of stored users
    #[allow(dead_code)]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Flip the is_active flag on a stored user
    #[allow(dead_code)]
    pub fn set_active(&self, id: Uuid, active: bool) {
        if let Some(mut user) = self.users.get_mut(&id) {
            user.is_active = active;
        }
    }

    /// Build a merchant user row for direct insertion
    #[allow(dead_code)]
    pub fn test_merchant(tenant_id: Uuid, email: &str, password_hash: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            tenant_id: Some(tenant_id),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            full_name: "Test Merchant".to_string(),
            role: "merchant".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<UserRow>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        if self.by_email.contains_key(&user.email) {
            return Err(DbError::UniqueViolation {
                constraint: "users_email_key".to_string(),
            });
        }
        let row = UserRow {
            id: user.id,
            tenant_id: user.tenant_id,
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            role: user.role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.insert_user(row.clone());
        Ok(row)
    }
}

/// In-memory session repository for testing
#[derive(Default, Clone)]
pub struct MockSessionRepository {
    sessions: Arc<DashMap<Uuid, SessionRow>>,
    by_token_hash: Arc<DashMap<String, Uuid>>,
}

impl MockSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session directly for testing
    #[allow(dead_code)]
    pub fn insert_session(&self, session: SessionRow) {
        self.by_token_hash
            .insert(session.token_hash.clone(), session.id);
        self.sessions.insert(session.id, session);
    }

    /// Number of stored sessions
    #[allow(dead_code)]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn find_by_token_hash(&self, hash: &str) -> DbResult<Option<SessionRow>> {
        Ok(self
            .by_token_hash
            .get(hash)
            .and_then(|id| self.sessions.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, session: CreateSession) -> DbResult<SessionRow> {
        let row = SessionRow {
            id: session.id,
            user_id: session.user_id,
            token_hash: session.token_hash.clone(),
            expires_at: session.expires_at,
            created_at: Utc::now(),
        };
        self.by_token_hash.insert(session.token_hash, session.id);
        self.sessions.insert(session.id, row.clone());
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        if let Some((_, session)) = self.sessions.remove(&id) {
            self.by_token_hash.remove(&session.token_hash);
        }
        Ok(())
    }
}

/// In-memory tenant repository for testing
///
/// Holds a handle to the user mock so provisioning lands the owner user in
/// the same store the auth service reads from, like the real database.
#[derive(Clone)]
pub struct MockTenantRepository {
    tenants: Arc<DashMap<Uuid, TenantRow>>,
    by_subdomain: Arc<DashMap<String, Uuid>>,
    subscriptions: Arc<DashMap<Uuid, SubscriptionRow>>,
    users: MockUserRepository,
}

impl MockTenantRepository {
    pub fn new(users: MockUserRepository) -> Self {
        Self {
            tenants: Arc::new(DashMap::new()),
            by_subdomain: Arc::new(DashMap::new()),
            subscriptions: Arc::new(DashMap::new()),
            users,
        }
    }

    /// Insert a tenant directly for testing
    #[allow(dead_code)]
    pub fn insert_tenant(&self, tenant: TenantRow) {
        self.by_subdomain.insert(tenant.subdomain.clone(), tenant.id);
        self.tenants.insert(tenant.id, tenant);
    }

    /// Number of stored tenants
    #[allow(dead_code)]
    pub fn tenant_count(&self) -> usize {
        self.tenants.len()
    }

    /// Number of stored subscriptions
    #[allow(dead_code)]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Read back a stored tenant
    #[allow(dead_code)]
    pub fn get_tenant(&self, id: Uuid) -> Option<TenantRow> {
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
        // All-or-nothing: uniqueness is checked before anything is written,
        // mirroring the real transaction aborting on the unique indexes.
        if self.by_subdomain.contains_key(&input.subdomain) {
            return Err(DbError::UniqueViolation {
                constraint: "tenants_subdomain_key".to_string(),
            });
        }
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(DbError::UniqueViolation {
                constraint: "users_email_key".to_string(),
            });
        }

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
        let subscription = SubscriptionRow {
            id: input.subscription_id,
            tenant_id: input.tenant_id,
            plan: input.plan.clone(),
            status: "trial".to_string(),
            current_period_start: input.period_start,
            current_period_end: input.trial_ends_at,
            created_at: now,
            updated_at: now,
        };
        let user = UserRow {
            id: input.user_id,
            tenant_id: Some(input.tenant_id),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            full_name: input.full_name.clone(),
            role: input.role.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.insert_tenant(tenant.clone());
        self.subscriptions
            .insert(subscription.id, subscription.clone());
        self.users.insert_user(user.clone());

        Ok(ProvisionedMerchant {
            tenant,
            subscription,
            user,
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
