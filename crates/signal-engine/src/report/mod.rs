//! Rendering of score batches and macro reports

pub mod formatter;

pub use formatter::{CliFormatter, Formatter, FormatterFactory, ReportPlatform, TelegramFormatter, money};

use crate::error::{Result, SignalError};
use crate::pipeline::{MacroReport, ScoreBatch};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "table" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(SignalError::ConfigError(format!("unknown output format '{other}'"))),
        }
    }
}

/// Everything one invocation produced
#[derive(Debug, Default, Serialize)]
pub struct RunReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<&'a ScoreBatch>,
    #[serde(rename = "macro", skip_serializing_if = "Option::is_none")]
    pub macro_report: Option<&'a MacroReport>,
}

impl<'a> RunReport<'a> {
    pub fn new(score: Option<&'a ScoreBatch>, macro_report: Option<&'a MacroReport>) -> Self {
        Self { score, macro_report }
    }

    pub fn render(&self, formatter: &dyn Formatter) -> String {
        let mut sections = Vec::new();
        if let Some(batch) = self.score {
            sections.push(formatter.format_batch(batch));
        }
        if let Some(report) = self.macro_report {
            sections.push(formatter.format_macro(report));
        }
        sections.join("\n\n")
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render in `format`; JSON ignores the formatter
    pub fn to_format(&self, format: OutputFormat, formatter: &dyn Formatter) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(self.render(formatter)),
            OutputFormat::Json => self.to_json(),
        }
    }
}
