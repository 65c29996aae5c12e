//! Admin notifications for billing events
//!
//! Payment submissions and sweep transitions are pushed to the platform
//! operators over Telegram. Delivery is best effort: callers log and
//! continue when a notification fails, so a Telegram outage never blocks
//! a payment or a sweep.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::error::BillingError;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Push notification channel for operator-facing billing events
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a titled plain-text message to the operator channel
    async fn notify(&self, title: &str, message: &str) -> Result<(), BillingError>;
}

/// Telegram bot notifier
#[derive(Clone)]
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

impl TelegramNotifier {
    /// Create a notifier for a bot token and operator chat
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Override the API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    #[instrument(skip(self, title, message))]
    async fn notify(&self, title: &str, message: &str) -> Result<(), BillingError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.bot_token);
        let text = format!("{title}\n{message}");
        let body = SendMessage {
            chat_id: &self.chat_id,
            text: &text,
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            error!(error = %e, "Telegram API request failed");
            BillingError::Notify(e.to_string())
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Telegram API error");
            return Err(BillingError::Notify(format!("Telegram API error: {status}")));
        }

        debug!("Telegram notification delivered");
        Ok(())
    }
}

/// Notifier that drops every message
///
/// Used when no Telegram credentials are configured.
#[derive(Clone, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, title: &str, _message: &str) -> Result<(), BillingError> {
        debug!(title = %title, "Notification suppressed (no notifier configured)");
        Ok(())
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_base", &self.api_base)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}
