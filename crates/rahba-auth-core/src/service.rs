//! Auth service - registration, login, refresh rotation, and token checks

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use rahba_db::{
    CreateSession, ProvisionMerchant as ProvisionMerchantRow, SessionRepository, SubscriptionRow,
    TenantRepository, TenantRow, UserRepository, UserRow,
};
use rahba_types::{Plan, Role, TRIAL_DAYS};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password::{hash_password, verify_password};
use crate::token::{
    decode_access_token, generate_refresh_token, hash_refresh_token, issue_access_token,
    AuthenticatedUser,
};

/// Subdomains that can never be claimed by a store.
pub const RESERVED_SUBDOMAINS: &[&str] = &["www", "api", "admin", "app"];

/// Merchant signup input.
#[derive(Debug, Clone)]
pub struct RegisterMerchant {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub store_name: String,
    pub subdomain: String,
}

/// Access + refresh token pair returned by login-shaped operations.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// A signed-in user together with fresh tokens.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub user: UserRow,
    pub tokens: TokenPair,
}

/// Everything created by a successful merchant registration.
#[derive(Debug, Clone)]
pub struct RegisteredMerchant {
    pub tenant: TenantRow,
    pub subscription: SubscriptionRow,
    pub user: UserRow,
    pub tokens: TokenPair,
}

/// Authentication service
///
/// Provides unified interface for:
/// - Merchant registration (tenant + trial subscription + owner user)
/// - Login and refresh-token rotation
/// - Access token verification for request handling
pub struct AuthService<U: UserRepository, S: SessionRepository, T: TenantRepository> {
    config: AuthConfig,
    users: Arc<U>,
    sessions: Arc<S>,
    tenants: Arc<T>,
}

impl<U: UserRepository, S: SessionRepository, T: TenantRepository> AuthService<U, S, T> {
    /// Create a new auth service
    pub fn new(config: AuthConfig, users: Arc<U>, sessions: Arc<S>, tenants: Arc<T>) -> Self {
        Self {
            config,
            users,
            sessions,
            tenants,
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Register a merchant: provision tenant, trial subscription and owner
    /// user atomically, then sign the owner in.
    ///
    /// New tenants start on the standard plan with a 7-day trial.
    pub async fn register_merchant(
        &self,
        input: RegisterMerchant,
    ) -> Result<RegisteredMerchant, AuthError> {
        let email = validate_email(&input.email)?;
        validate_password(&input.password)?;
        let full_name = require_text("full name", &input.full_name)?;
        let store_name = require_text("store name", &input.store_name)?;
        let subdomain = normalize_subdomain(&input.subdomain)?;

        // Friendly pre-checks; the unique indexes still decide races.
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        if self.tenants.find_by_subdomain(&subdomain).await?.is_some() {
            return Err(AuthError::SubdomainTaken);
        }

        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();

        let provisioned = self
            .tenants
            .provision(ProvisionMerchantRow {
                tenant_id: Uuid::new_v4(),
                subdomain: subdomain.clone(),
                store_name,
                trial_ends_at: now + Duration::days(TRIAL_DAYS),
                subscription_id: Uuid::new_v4(),
                plan: Plan::Standard.to_string(),
                period_start: now,
                user_id: Uuid::new_v4(),
                email: email.clone(),
                password_hash,
                full_name,
                role: Role::Merchant.to_string(),
            })
            .await?;

        let tokens = self.issue_token_pair(&provisioned.user).await?;

        tracing::info!(
            tenant_id = %provisioned.tenant.id,
            subdomain = %subdomain,
            "merchant registered"
        );

        Ok(RegisteredMerchant {
            tenant: provisioned.tenant,
            subscription: provisioned.subscription,
            user: provisioned.user,
            tokens,
        })
    }

    // =========================================================================
    // Login and Logout
    // =========================================================================

    /// Authenticate with email and password.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, AuthError> {
        let email = email.trim().to_lowercase();
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let tokens = self.issue_token_pair(&user).await?;
        tracing::debug!(user_id = %user.id, "login succeeded");

        Ok(AuthenticatedSession { user, tokens })
    }

    /// Revoke the session behind a refresh token. Unknown tokens are a
    /// no-op so logout never fails client-side.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let token_hash = hash_refresh_token(refresh_token);
        if let Some(session) = self.sessions.find_by_token_hash(&token_hash).await? {
            self.sessions.delete(session.id).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Refresh Rotation
    // =========================================================================

    /// Exchange a refresh token for a fresh token pair.
    ///
    /// Tokens are single-use: the presented session is deleted before a
    /// replacement is issued, so a replayed token finds nothing.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthenticatedSession, AuthError> {
        let token_hash = hash_refresh_token(refresh_token);
        let session = self
            .sessions
            .find_by_token_hash(&token_hash)
            .await?
            .ok_or_else(|| AuthError::InvalidToken("unknown refresh token".into()))?;

        if session.expires_at <= Utc::now() {
            self.sessions.delete(session.id).await?;
            return Err(AuthError::TokenExpired);
        }

        self.sessions.delete(session.id).await?;

        let user = self
            .users
            .find_by_id(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let tokens = self.issue_token_pair(&user).await?;
        Ok(AuthenticatedSession { user, tokens })
    }

    // =========================================================================
    // Token Verification and Lookup
    // =========================================================================

    /// Verify an access token and extract the caller's identity.
    pub fn verify_access_token(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        decode_access_token(&self.config, token)?.authenticated()
    }

    /// Load the profile of an authenticated user.
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserRow, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Issue an access token and a stored refresh session for a user.
    async fn issue_token_pair(&self, user: &UserRow) -> Result<TokenPair, AuthError> {
        let role = user
            .role
            .parse::<Role>()
            .map_err(|e| AuthError::Internal(format!("stored role is invalid: {}", e)))?;

        let access_token = issue_access_token(&self.config, user.id, user.tenant_id, role)?;
        let refresh_token = generate_refresh_token();

        self.sessions
            .create(CreateSession {
                id: Uuid::new_v4(),
                user_id: user.id,
                token_hash: hash_refresh_token(&refresh_token),
                expires_at: Utc::now()
                    + Duration::seconds(self.config.refresh_token_ttl_secs as i64),
            })
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.config.access_token_ttl_secs,
        })
    }
}

impl<U: UserRepository, S: SessionRepository, T: TenantRepository> std::fmt::Debug
    for AuthService<U, S, T>
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("config", &self.config)
            .finish()
    }
}

// =============================================================================
// Input validation
// =============================================================================

/// Normalize and validate a store subdomain.
///
/// Accepts 3-30 characters of lowercase letters, digits and hyphens (input
/// is lowercased first), rejects leading/trailing hyphens and the reserved
/// names used by the platform itself.
pub fn normalize_subdomain(raw: &str) -> Result<String, AuthError> {
    let subdomain = raw.trim().to_lowercase();

    if subdomain.len() < 3 || subdomain.len() > 30 {
        return Err(AuthError::InvalidInput(
            "subdomain must be 3-30 characters".into(),
        ));
    }
    if !subdomain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(AuthError::InvalidInput(
            "subdomain may only contain lowercase letters, digits and hyphens".into(),
        ));
    }
    if subdomain.starts_with('-') || subdomain.ends_with('-') {
        return Err(AuthError::InvalidInput(
            "subdomain cannot start or end with a hyphen".into(),
        ));
    }
    if RESERVED_SUBDOMAINS.contains(&subdomain.as_str()) {
        return Err(AuthError::InvalidInput(format!(
            "subdomain '{}' is reserved",
            subdomain
        )));
    }

    Ok(subdomain)
}

/// Normalize and minimally validate an email address.
fn validate_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid || email.contains(char::is_whitespace) {
        return Err(AuthError::InvalidInput("email address is not valid".into()));
    }
    Ok(email)
}

/// Enforce the minimum password length.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < 8 {
        return Err(AuthError::InvalidInput(
            "password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

/// Trim a required free-text field, rejecting empty values.
fn require_text(field: &str, value: &str) -> Result<String, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdomain_rules() {
        assert_eq!(normalize_subdomain("boutique-amina").unwrap(), "boutique-amina");
        assert_eq!(normalize_subdomain("  Boutique22 ").unwrap(), "boutique22");

        assert!(normalize_subdomain("ab").is_err());
        assert!(normalize_subdomain(&"a".repeat(31)).is_err());
        assert!(normalize_subdomain("has_underscore").is_err());
        assert!(normalize_subdomain("-leading").is_err());
        assert!(normalize_subdomain("trailing-").is_err());
        assert!(normalize_subdomain("boutique amina").is_err());
    }

    #[test]
    fn reserved_subdomains_are_rejected() {
        for name in ["www", "api", "admin", "app", "API"] {
            assert!(normalize_subdomain(name).is_err(), "{} should be reserved", name);
        }
    }

    #[test]
    fn email_validation() {
        assert_eq!(validate_email(" Amina@Example.COM ").unwrap(), "amina@example.com");
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("amina@nodot").is_err());
        assert!(validate_email("amina@.com").is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("longenough").is_ok());
    }
}
