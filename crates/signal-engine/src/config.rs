//! Configuration for scoring, macro analysis and delivery

use crate::error::{Result, SignalError};
use crate::model::{HistoryConfig, SecurityRole, TickerSpec};
use crate::platforms::NotifyConfig;
use crate::regime::MacroConfig;
use crate::score::{CompositeConfig, RelativeConfig, ScoreEngine, Strategy};
use serde::{Deserialize, Serialize};

/// HTTP settings shared by the data-provider clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Timeout for a single HTTP request, in seconds
    pub request_timeout_secs: u64,
    /// Per client; both Yahoo and FRED get their own limiter
    pub rate_limit_per_minute: u32,
    /// Sent with every FRED request
    pub user_agent: String,
    /// FRED JSON API, used when `FRED_API_KEY` is set
    pub fred_api_base: String,
    /// Public FRED CSV download, used without a key
    pub fred_graph_base: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 15,
            rate_limit_per_minute: 60,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0 Safari/537.36"
                .to_string(),
            fred_api_base: "https://api.stlouisfed.org/fred".to_string(),
            fred_graph_base: "https://fred.stlouisfed.org/graph/fredgraph.csv".to_string(),
        }
    }
}

fn default_tickers() -> Vec<TickerSpec> {
    let mut tickers = vec![
        TickerSpec::new("SPY", SecurityRole::Benchmark),
        TickerSpec::new("GLD", SecurityRole::Commodity),
    ];
    tickers.extend(["GOOGL", "AAPL", "MSFT", "AMZN", "NVDA", "META"].map(TickerSpec::equity));
    tickers
}

/// Top-level configuration, usually read from `signals.toml`.
///
/// Every field has a default, so an empty file is a valid configuration.
/// Secrets (bot token, FRED key) are never read from here, only from the
/// environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    /// Scoring strategy applied to every ticker
    pub strategy: Strategy,
    /// Tickers to score, at most one with the benchmark role
    pub tickers: Vec<TickerSpec>,
    /// Snapshot assembly (all-time-high proxy, split adjustment)
    pub history: HistoryConfig,
    /// Benchmark-relative strategy parameters
    pub relative: RelativeConfig,
    /// Fundamentals composite strategy parameters
    pub composite: CompositeConfig,
    /// Macro regime thresholds and series, `[macro]` in TOML
    #[serde(rename = "macro")]
    pub macro_regime: MacroConfig,
    /// Data-provider HTTP settings
    pub provider: ProviderConfig,
    /// Report delivery settings
    pub notify: NotifyConfig,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            tickers: default_tickers(),
            history: HistoryConfig::default(),
            relative: RelativeConfig::default(),
            composite: CompositeConfig::default(),
            macro_regime: MacroConfig::default(),
            provider: ProviderConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl SignalConfig {
    /// Create a new configuration builder
    pub fn builder() -> SignalConfigBuilder {
        SignalConfigBuilder::default()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Score engine for the configured strategy
    pub fn engine(&self) -> ScoreEngine {
        ScoreEngine::new(self.strategy, self.relative.clone(), self.composite.clone())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.tickers.is_empty() {
            return Err(SignalError::ConfigError("at least one ticker is required".to_string()));
        }

        let benchmarks: Vec<&str> = self
            .tickers
            .iter()
            .filter(|t| t.role == SecurityRole::Benchmark)
            .map(|t| t.symbol.as_str())
            .collect();
        if benchmarks.len() > 1 {
            return Err(SignalError::ConfigError(format!(
                "only one benchmark ticker is allowed, found {}",
                benchmarks.join(", ")
            )));
        }

        if let Some(blank) = self.tickers.iter().find(|t| t.symbol.trim().is_empty()) {
            return Err(SignalError::ConfigError(format!("blank ticker symbol with role {}", blank.role)));
        }

        let relative = &self.relative;
        for (name, value) in [
            ("relative.benchmark.trailing_pe", relative.benchmark.trailing_pe),
            ("relative.benchmark.n_ratio", relative.benchmark.n_ratio),
            ("relative.benchmark.peg_ratio", relative.benchmark.peg_ratio),
            ("relative.peg_default", relative.peg_default),
            ("relative.peg_numerator", relative.peg_numerator),
            ("relative.pe_scale", relative.pe_scale),
            ("relative.simple_scale", relative.simple_scale),
            ("history.short_history_multiplier", self.history.short_history_multiplier),
        ] {
            ensure_positive(name, value)?;
        }
        // Keeps `peg + peg_offset` above zero for every positive PEG
        if !(relative.peg_offset.is_finite() && relative.peg_offset >= 0.0) {
            return Err(SignalError::ConfigError(format!(
                "relative.peg_offset must be zero or positive, got {}",
                relative.peg_offset
            )));
        }

        let allocation = &self.composite.allocation;
        for (name, value) in [
            ("base_daily_amount", allocation.base_daily_amount),
            ("max_multiplier", allocation.max_multiplier),
            ("investment_ceiling", allocation.investment_ceiling),
        ] {
            ensure_positive(&format!("composite.allocation.{name}"), value)?;
        }
        if !(0.0..=100.0).contains(&allocation.score_floor) {
            return Err(SignalError::ConfigError(format!(
                "composite.allocation.score_floor must be within 0-100, got {}",
                allocation.score_floor
            )));
        }

        let macro_cfg = &self.macro_regime;
        if macro_cfg.zscore_window == 0 {
            return Err(SignalError::ConfigError("macro.zscore_window must be greater than 0".to_string()));
        }
        if macro_cfg.zscore_min_periods > macro_cfg.zscore_window {
            return Err(SignalError::ConfigError(format!(
                "macro.zscore_min_periods ({}) exceeds macro.zscore_window ({})",
                macro_cfg.zscore_min_periods, macro_cfg.zscore_window
            )));
        }
        if macro_cfg.market_cap_proxies.is_empty() {
            return Err(SignalError::ConfigError("macro.market_cap_proxies is empty".to_string()));
        }

        if self.provider.rate_limit_per_minute == 0 {
            return Err(SignalError::ConfigError(
                "provider.rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }
        if self.notify.max_message_len == 0 {
            return Err(SignalError::ConfigError("notify.max_message_len must be greater than 0".to_string()));
        }

        Ok(())
    }
}

fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SignalError::ConfigError(format!("{name} must be positive, got {value}")))
    }
}

/// Builder for SignalConfig
#[derive(Debug, Default)]
pub struct SignalConfigBuilder {
    strategy: Option<Strategy>,
    tickers: Option<Vec<TickerSpec>>,
    history: Option<HistoryConfig>,
    relative: Option<RelativeConfig>,
    composite: Option<CompositeConfig>,
    macro_regime: Option<MacroConfig>,
    provider: Option<ProviderConfig>,
    notify: Option<NotifyConfig>,
}

impl SignalConfigBuilder {
    /// Start from an existing configuration (e.g. one loaded from file)
    pub fn from_config(config: SignalConfig) -> Self {
        Self {
            strategy: Some(config.strategy),
            tickers: Some(config.tickers),
            history: Some(config.history),
            relative: Some(config.relative),
            composite: Some(config.composite),
            macro_regime: Some(config.macro_regime),
            provider: Some(config.provider),
            notify: Some(config.notify),
        }
    }

    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn tickers(mut self, tickers: Vec<TickerSpec>) -> Self {
        self.tickers = Some(tickers);
        self
    }

    pub fn history(mut self, history: HistoryConfig) -> Self {
        self.history = Some(history);
        self
    }

    pub fn relative(mut self, relative: RelativeConfig) -> Self {
        self.relative = Some(relative);
        self
    }

    pub fn composite(mut self, composite: CompositeConfig) -> Self {
        self.composite = Some(composite);
        self
    }

    pub fn macro_regime(mut self, macro_regime: MacroConfig) -> Self {
        self.macro_regime = Some(macro_regime);
        self
    }

    pub fn provider(mut self, provider: ProviderConfig) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn notify(mut self, notify: NotifyConfig) -> Self {
        self.notify = Some(notify);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<SignalConfig> {
        let defaults = SignalConfig::default();
        let config = SignalConfig {
            strategy: self.strategy.unwrap_or(defaults.strategy),
            tickers: self.tickers.unwrap_or(defaults.tickers),
            history: self.history.unwrap_or(defaults.history),
            relative: self.relative.unwrap_or(defaults.relative),
            composite: self.composite.unwrap_or(defaults.composite),
            macro_regime: self.macro_regime.unwrap_or(defaults.macro_regime),
            provider: self.provider.unwrap_or(defaults.provider),
            notify: self.notify.unwrap_or(defaults.notify),
        };

        config.validate()?;
        Ok(config)
    }
}
