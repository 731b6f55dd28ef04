//! Telegram Bot API notifier

use super::{Notifier, NotifyConfig};
use crate::error::{Result, SignalError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

pub const TELEGRAM_CHANNEL: &str = "telegram";

/// Secrets read from the environment
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

impl TelegramConfig {
    /// Both `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID` must be non-empty
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Some(Self {
            bot_token: non_empty("TELEGRAM_BOT_TOKEN")?,
            chat_id: non_empty("TELEGRAM_CHAT_ID")?,
        })
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

pub struct TelegramNotifier {
    client: Client,
    send_url: String,
    parse_mode: Option<String>,
    max_message_len: usize,
}

impl TelegramNotifier {
    pub fn new(bot_token: &str, config: &NotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            send_url: format!(
                "{}/bot{}/sendMessage",
                config.telegram_api_base.trim_end_matches('/'),
                bot_token
            ),
            parse_mode: config.parse_mode.clone(),
            max_message_len: config.max_message_len.max(1),
        })
    }

    async fn post(&self, chat_id: &str, text: &str, parse_mode: Option<&str>) -> Result<(StatusCode, String)> {
        let payload = SendMessage {
            chat_id,
            text,
            parse_mode,
        };
        let response = self
            .client
            .post(&self.send_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SignalError::delivery(TELEGRAM_CHANNEL, e.without_url().to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }

    async fn send_chunk(&self, chat_id: &str, text: &str) -> Result<()> {
        let (status, body) = self.post(chat_id, text, self.parse_mode.as_deref()).await?;
        if status.is_success() {
            return Ok(());
        }

        // Report text may contain stray Markdown characters (tickers like BRK_B)
        if status == StatusCode::BAD_REQUEST && self.parse_mode.is_some() && body.contains("can't parse entities") {
            tracing::warn!("Telegram rejected markup, retrying as plain text: {}", body);
            let (status, body) = self.post(chat_id, text, None).await?;
            if status.is_success() {
                return Ok(());
            }
            return Err(SignalError::delivery(TELEGRAM_CHANNEL, format!("HTTP {status}: {body}")));
        }

        Err(SignalError::delivery(TELEGRAM_CHANNEL, format!("HTTP {status}: {body}")))
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        TELEGRAM_CHANNEL
    }

    async fn deliver(&self, destination: &str, text: &str) -> Result<()> {
        let chunks = split_message(text, self.max_message_len);
        tracing::debug!("Sending {} Telegram message(s)", chunks.len());
        for chunk in &chunks {
            self.send_chunk(destination, chunk).await?;
        }
        Ok(())
    }
}

/// Split `text` into chunks of at most `max_chars` characters, on line
/// boundaries where possible. Lines longer than the limit are hard-split.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > max_chars {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
