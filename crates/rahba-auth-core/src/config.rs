//! Authentication configuration.

use crate::error::AuthError;

/// Minimum acceptable length for the JWT signing secret, in bytes.
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Default access token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 900;

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Settings that govern token issuance and verification.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret used to sign and verify access tokens (HS256).
    pub jwt_secret: String,
    /// Value of the `iss` claim on issued tokens.
    pub jwt_issuer: String,
    /// Access token lifetime in seconds.
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds.
    pub refresh_token_ttl_secs: u64,
}

impl AuthConfig {
    /// Build a config with the given secret and the default issuer and TTLs.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_issuer: "rahba".to_string(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
        }
    }

    /// Override both token lifetimes.
    pub fn with_ttls(mut self, access_secs: u64, refresh_secs: u64) -> Self {
        self.access_token_ttl_secs = access_secs;
        self.refresh_token_ttl_secs = refresh_secs;
        self
    }

    /// Reject secrets too short to sign tokens with. Called once at startup.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AuthError::InvalidInput(format!(
                "JWT secret must be at least {} bytes",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fifteen_minutes_and_seven_days() {
        let config = AuthConfig::new("a".repeat(32));
        assert_eq!(config.access_token_ttl_secs, 900);
        assert_eq!(config.refresh_token_ttl_secs, 604_800);
        assert_eq!(config.jwt_issuer, "rahba");
    }

    #[test]
    fn short_secret_is_rejected() {
        let config = AuthConfig::new("too-short");
        assert!(config.validate().is_err());

        let config = AuthConfig::new("a".repeat(32));
        assert!(config.validate().is_ok());
    }
}
