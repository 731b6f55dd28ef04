//! Error types for scoring and macro analysis

use thiserror::Error;

/// Errors raised while fetching, scoring, reporting or notifying
#[derive(Debug, Error)]
pub enum SignalError {
    /// A required numeric input is missing or out of domain (e.g. price <= 0)
    #[error("Invalid input for {symbol}: {reason}")]
    InvalidInput { symbol: String, reason: String },

    /// A metric the selected strategy cannot do without is unavailable
    #[error("{metric} unavailable for {symbol}")]
    MetricUnavailable { symbol: String, metric: String },

    /// Data provider unreachable or returned nothing usable
    #[error("{provider} fetch failed: {reason}")]
    UpstreamFetch { provider: String, reason: String },

    /// Not enough overlapping history to compute a statistic
    #[error("Insufficient history: {0}")]
    InsufficientHistory(String),

    /// Best-effort delivery to a chat endpoint failed
    #[error("Delivery via {channel} failed: {reason}")]
    NotificationDelivery { channel: String, reason: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// CSV parsing error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Config file parsing error
    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SignalError {
    pub fn invalid_input(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            symbol: symbol.into(),
            reason: reason.into(),
        }
    }

    pub fn upstream(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    pub fn delivery(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotificationDelivery {
            channel: channel.into(),
            reason: reason.into(),
        }
    }

    /// Short reason used on per-ticker skip lines
    pub fn skip_reason(&self) -> String {
        match self {
            Self::InvalidInput { reason, .. } => reason.clone(),
            Self::MetricUnavailable { metric, .. } => format!("{metric} unavailable"),
            other => other.to_string(),
        }
    }
}

/// Result type alias for signal operations
pub type Result<T> = std::result::Result<T, SignalError>;
