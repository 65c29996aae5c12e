//! Configuration for the Rahba API service.

use std::net::SocketAddr;
use std::time::Duration;

use rahba_auth_core::AuthConfig;
use rahba_store_core::CarrierConfig;

/// Rahba API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Optional separate listener for /metrics; when unset the endpoint
    /// is served on the main router
    pub metrics_addr: Option<SocketAddr>,
    /// Database URL
    pub database_url: String,
    /// Base domain storefront subdomains hang off, e.g. "rahba.dz"
    pub public_base_domain: String,
    /// Token issuance and verification settings
    pub auth: AuthConfig,
    /// Which delivery carrier the order flow talks to
    pub delivery: DeliveryProviderConfig,
    /// Telegram notifier credentials; notifications are a no-op without them
    pub telegram: Option<TelegramConfig>,
    /// Interval between sweep runs
    pub sweep_interval: Duration,
    /// Run embedded migrations at boot
    pub auto_migrate: bool,
    /// Upsert the delivery-zone table at boot
    pub auto_seed: bool,
    /// Super-admin account created at boot if absent
    pub bootstrap_admin: Option<BootstrapAdmin>,
    /// Allowed CORS origins; empty means any origin
    pub cors_origins: Vec<String>,
    /// Request timeout
    pub request_timeout: Duration,
}

/// Delivery carrier selection
///
/// The mock carrier must be asked for explicitly; a missing or incomplete
/// HTTP carrier configuration is a boot error, never a silent mock.
#[derive(Debug, Clone)]
pub enum DeliveryProviderConfig {
    /// No carrier: merchants enter tracking numbers by hand
    None,
    /// Deterministic mock carrier (`DELIVERY_PROVIDER=mock`)
    Mock,
    /// Real carrier over HTTP (`DELIVERY_PROVIDER=http`)
    Http(CarrierConfig),
}

/// Telegram bot credentials for billing notifications
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

/// Platform super-admin bootstrapped at startup
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Database
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        // Listeners
        let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("BIND_ADDR"))?;

        let metrics_addr = match std::env::var("METRICS_ADDR") {
            Ok(raw) => Some(raw.parse().map_err(|_| ConfigError::Invalid("METRICS_ADDR"))?),
            Err(_) => None,
        };

        // Tokens
        let jwt_secret =
            std::env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?;

        let access_ttl = env_u64(
            "ACCESS_TOKEN_TTL_SECS",
            rahba_auth_core::DEFAULT_ACCESS_TOKEN_TTL_SECS,
        )?;
        let refresh_ttl = env_u64(
            "REFRESH_TOKEN_TTL_SECS",
            rahba_auth_core::DEFAULT_REFRESH_TOKEN_TTL_SECS,
        )?;

        let auth = AuthConfig::new(jwt_secret).with_ttls(access_ttl, refresh_ttl);
        auth.validate().map_err(|_| ConfigError::Invalid("JWT_SECRET"))?;

        // Storefront domain
        let public_base_domain = std::env::var("PUBLIC_BASE_DOMAIN")
            .unwrap_or_else(|_| "rahba.dz".to_string())
            .trim()
            .trim_start_matches('.')
            .to_lowercase();

        // Delivery carrier
        let delivery = match std::env::var("DELIVERY_PROVIDER").ok().as_deref() {
            None | Some("") | Some("none") => DeliveryProviderConfig::None,
            Some("mock") => DeliveryProviderConfig::Mock,
            Some("http") => {
                let api_base = std::env::var("CARRIER_BASE_URL")
                    .map_err(|_| ConfigError::Missing("CARRIER_BASE_URL"))?;
                let api_token = std::env::var("CARRIER_API_KEY")
                    .map_err(|_| ConfigError::Missing("CARRIER_API_KEY"))?;
                DeliveryProviderConfig::Http(CarrierConfig {
                    api_base: api_base.trim_end_matches('/').to_string(),
                    api_token,
                })
            }
            Some(_) => return Err(ConfigError::Invalid("DELIVERY_PROVIDER")),
        };

        // Notifications: both halves or neither
        let telegram = match (
            std::env::var("TELEGRAM_BOT_TOKEN").ok(),
            std::env::var("TELEGRAM_CHAT_ID").ok(),
        ) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            (None, None) => None,
            _ => return Err(ConfigError::Invalid("TELEGRAM_BOT_TOKEN/TELEGRAM_CHAT_ID")),
        };

        // Background sweeps, daily by default
        let sweep_interval = Duration::from_secs(env_u64("SWEEP_INTERVAL_SECS", 86_400)?);

        // Boot-time maintenance
        let auto_migrate = env_bool("AUTO_MIGRATE", false)?;
        let auto_seed = env_bool("AUTO_SEED", false)?;

        let bootstrap_admin = match (
            std::env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            std::env::var("BOOTSTRAP_ADMIN_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid(
                    "BOOTSTRAP_ADMIN_EMAIL/BOOTSTRAP_ADMIN_PASSWORD",
                ))
            }
        };

        // CORS: "*" or unset allows anything, otherwise a comma list
        let cors_origins = match std::env::var("CORS_ORIGINS").ok().as_deref() {
            None | Some("") | Some("*") => Vec::new(),
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        };

        let request_timeout = Duration::from_secs(env_u64("REQUEST_TIMEOUT_SECS", 30)?);

        Ok(Self {
            bind_addr,
            metrics_addr,
            database_url,
            public_base_domain,
            auth,
            delivery,
            telegram,
            sweep_interval,
            auto_migrate,
            auto_seed,
            bootstrap_admin,
            cors_origins,
            request_timeout,
        })
    }
}

fn env_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

fn env_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid(name)),
        },
        Err(_) => Ok(default),
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
