//! Access token (JWT) and refresh token primitives.
//!
//! Access tokens are short-lived HS256 JWTs carrying the user id, tenant
//! and role. Refresh tokens are opaque random strings; only their SHA-256
//! hash is ever stored server-side.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use rahba_types::Role;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User id.
    pub sub: String,
    /// Tenant the user belongs to. Absent for super admins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Role name, e.g. "merchant".
    pub role: String,
    /// Issuer.
    pub iss: String,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
}

/// The identity extracted from a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
}

impl AccessTokenClaims {
    /// Parse the string claims into typed identity fields.
    pub fn authenticated(&self) -> Result<AuthenticatedUser, AuthError> {
        let user_id = Uuid::parse_str(&self.sub)
            .map_err(|_| AuthError::InvalidToken("malformed sub claim".into()))?;
        let tenant_id = match &self.tenant_id {
            Some(raw) => Some(
                Uuid::parse_str(raw)
                    .map_err(|_| AuthError::InvalidToken("malformed tenant_id claim".into()))?,
            ),
            None => None,
        };
        let role = self
            .role
            .parse::<Role>()
            .map_err(|_| AuthError::InvalidToken("unknown role claim".into()))?;
        Ok(AuthenticatedUser {
            user_id,
            tenant_id,
            role,
        })
    }
}

/// Issue a signed access token for the given identity.
pub fn issue_access_token(
    config: &AuthConfig,
    user_id: Uuid,
    tenant_id: Option<Uuid>,
    role: Role,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        tenant_id: tenant_id.map(|id| id.to_string()),
        role: role.to_string(),
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + config.access_token_ttl_secs as i64,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("failed to sign token: {}", e)))
}

/// Verify a token's signature, issuer and expiry, returning its claims.
pub fn decode_access_token(
    config: &AuthConfig,
    token: &str,
) -> Result<AccessTokenClaims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["exp", "iss"]);

    let data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Generate an opaque refresh token: 32 random bytes, URL-safe base64.
pub fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::Rng::random(&mut rand::rng());
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a refresh token for storage. SHA-256 is enough here: the input is
/// a full-entropy random string, not a human password.
pub fn hash_refresh_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig::new("0123456789abcdef0123456789abcdef")
    }

    #[test]
    fn issue_then_decode_round_trips() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();

        let token =
            issue_access_token(&config, user_id, Some(tenant_id), Role::Merchant).unwrap();
        let claims = decode_access_token(&config, &token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.tenant_id.as_deref(), Some(tenant_id.to_string().as_str()));
        assert_eq!(claims.role, "merchant");
        assert_eq!(claims.iss, "rahba");
        assert!(claims.exp > claims.iat);

        let identity = claims.authenticated().unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.tenant_id, Some(tenant_id));
        assert_eq!(identity.role, Role::Merchant);
    }

    #[test]
    fn super_admin_tokens_have_no_tenant() {
        let config = test_config();
        let token =
            issue_access_token(&config, Uuid::new_v4(), None, Role::SuperAdmin).unwrap();
        let claims = decode_access_token(&config, &token).unwrap();
        assert!(claims.tenant_id.is_none());
        assert!(claims.authenticated().unwrap().tenant_id.is_none());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let config = test_config();
        let other = AuthConfig::new("ffffffffffffffffffffffffffffffff");

        let token =
            issue_access_token(&other, Uuid::new_v4(), None, Role::Merchant).unwrap();
        let err = decode_access_token(&config, &token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn token_with_wrong_issuer_is_rejected() {
        let mut other = test_config();
        other.jwt_issuer = "someone-else".to_string();

        let token =
            issue_access_token(&other, Uuid::new_v4(), None, Role::Merchant).unwrap();
        let err = decode_access_token(&test_config(), &token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }

    #[test]
    fn refresh_tokens_are_unique_and_url_safe() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_ne!(a, b);
        // 32 bytes -> 43 base64 chars without padding.
        assert_eq!(a.len(), 43);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn refresh_token_hash_is_deterministic_hex() {
        let token = generate_refresh_token();
        let h1 = hash_refresh_token(&token);
        let h2 = hash_refresh_token(&token);
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
