//! Report delivery
//!
//! Delivery is best effort: [`Dispatcher::dispatch`] logs failures and
//! never returns an error, so a notifier outage cannot fail a run.

pub mod cli;
pub mod telegram;

pub use cli::ConsoleNotifier;
pub use telegram::{TelegramConfig, TelegramNotifier, split_message};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Send `text` to `destination` (chat id, channel, ...)
    async fn deliver(&self, destination: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub telegram_api_base: String,
    /// `None` sends plain text
    pub parse_mode: Option<String>,
    pub max_message_len: usize,
    pub request_timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            telegram_api_base: "https://api.telegram.org".to_string(),
            parse_mode: Some("Markdown".to_string()),
            max_message_len: 4096,
            request_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    Delivered,
    Failed,
}

pub struct Dispatcher {
    notifier: Box<dyn Notifier>,
    destination: String,
}

impl Dispatcher {
    pub fn new(notifier: Box<dyn Notifier>, destination: impl Into<String>) -> Self {
        Self {
            notifier,
            destination: destination.into(),
        }
    }

    pub fn console() -> Self {
        Self::new(Box::new(ConsoleNotifier), "stdout")
    }

    /// Telegram when `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID` are set, console otherwise
    pub fn from_env(config: &NotifyConfig) -> Self {
        Self::from_lookup(config, |key| std::env::var(key).ok())
    }

    pub fn from_lookup(config: &NotifyConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let Some(telegram) = TelegramConfig::from_lookup(lookup) else {
            tracing::warn!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID not set, falling back to console output");
            return Self::console();
        };

        match TelegramNotifier::new(&telegram.bot_token, config) {
            Ok(notifier) => Self::new(Box::new(notifier), telegram.chat_id),
            Err(e) => {
                tracing::warn!("Telegram notifier unavailable ({}), falling back to console output", e);
                Self::console()
            }
        }
    }

    pub fn channel(&self) -> &'static str {
        self.notifier.name()
    }

    pub fn is_console(&self) -> bool {
        self.channel() == cli::CONSOLE_CHANNEL
    }

    pub async fn dispatch(&self, text: &str) -> DeliveryStatus {
        match self.notifier.deliver(&self.destination, text).await {
            Ok(()) => {
                tracing::info!("Report delivered via {}", self.channel());
                DeliveryStatus::Delivered
            }
            Err(e) => {
                tracing::warn!("Report delivery via {} failed: {}", self.channel(), e);
                DeliveryStatus::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignalError;

    #[test]
    fn test_missing_secrets_fall_back_to_console() {
        let dispatcher = Dispatcher::from_lookup(&NotifyConfig::default(), |_| None);
        assert!(dispatcher.is_console());

        let dispatcher = Dispatcher::from_lookup(&NotifyConfig::default(), |key| {
            (key == "TELEGRAM_BOT_TOKEN").then(|| "123:abc".to_string())
        });
        assert!(dispatcher.is_console());
    }

    #[test]
    fn test_secrets_select_telegram() {
        let dispatcher = Dispatcher::from_lookup(&NotifyConfig::default(), |key| match key {
            "TELEGRAM_BOT_TOKEN" => Some("123:abc".to_string()),
            "TELEGRAM_CHAT_ID" => Some("42".to_string()),
            _ => None,
        });
        assert_eq!(dispatcher.channel(), "telegram");
        assert!(!dispatcher.is_console());
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let mut notifier = MockNotifier::new();
        notifier.expect_name().return_const("mock");
        notifier
            .expect_deliver()
            .times(1)
            .returning(|_, _| Err(SignalError::delivery("mock", "HTTP 502")));

        let dispatcher = Dispatcher::new(Box::new(notifier), "chat");
        assert_eq!(dispatcher.dispatch("report").await, DeliveryStatus::Failed);
    }

    #[tokio::test]
    async fn test_delivery_passes_destination() {
        let mut notifier = MockNotifier::new();
        notifier.expect_name().return_const("mock");
        notifier
            .expect_deliver()
            .withf(|destination, text| destination == "42" && text == "report")
            .times(1)
            .returning(|_, _| Ok(()));

        let dispatcher = Dispatcher::new(Box::new(notifier), "42");
        assert_eq!(dispatcher.dispatch("report").await, DeliveryStatus::Delivered);
    }
}
