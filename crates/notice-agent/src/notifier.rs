//! Outbound notifications over the Telegram Bot API.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

/// One outbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// HTML-formatted body
    pub text: String,
    /// Deliver without a notification sound
    pub silent: bool,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            silent: false,
        }
    }

    pub fn silent(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            silent: true,
        }
    }
}

/// Delivery channel for alerts, resolutions, and notice digests.
///
/// Returns whether the message was accepted. Failures are logged by the
/// implementation, never raised.
pub trait Notifier {
    fn send(&self, message: &Message) -> bool;
}

/// Posts messages to a Telegram chat through `sendMessage`.
pub struct TelegramNotifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, token: &str, chat_id: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build Telegram HTTP client")?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token),
            chat_id: chat_id.to_string(),
        })
    }
}

impl Notifier for TelegramNotifier {
    fn send(&self, message: &Message) -> bool {
        let silent = if message.silent { "true" } else { "false" };
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", message.text.as_str()),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", "false"),
            ("disable_notification", silent),
        ];

        match self.client.post(&self.endpoint).form(&form).send() {
            Ok(resp) if resp.status().is_success() => {
                info!(silent = message.silent, chars = message.text.len(), "Telegram message sent");
                true
            }
            Ok(resp) => {
                let status = resp.status().as_u16();
                let body = resp.text().unwrap_or_default();
                warn!(status, body = %body, "Telegram rejected message");
                false
            }
            Err(e) => {
                // reqwest errors embed the URL, which carries the bot token.
                warn!(error = %e.without_url(), "Failed to send Telegram message");
                false
            }
        }
    }
}
