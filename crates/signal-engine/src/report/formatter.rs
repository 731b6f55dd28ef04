//! Report formatting for the console and for Telegram

use crate::metrics::PegSource;
use crate::model::Lookback;
use crate::pipeline::{MacroReport, ScoreBatch, TickerFailure, TickerOutcome};
use crate::regime::MacroAssessment;
use crate::score::{BenchmarkReference, BenchmarkSource, Metric, ScoreResult, Strategy};
use chrono::Utc;
use comfy_table::{ContentArrangement, Table, presets};
use serde::{Deserialize, Serialize};

const SUMMARY_HEADERS: [&str; 6] = ["Ticker", "Role", "Score", "Daily $", "Drawdown", "Verdict"];
const RULE_WIDTH: usize = 55;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPlatform {
    #[default]
    Cli,
    Telegram,
}

pub trait Formatter: Send + Sync {
    fn platform(&self) -> ReportPlatform;
    fn format_score(&self, result: &ScoreResult, lookback: Lookback) -> String;
    fn format_table(&self, headers: &[&str], rows: &[Vec<String>]) -> String;
    fn format_macro(&self, report: &MacroReport) -> String;
    fn format_title(&self, title: &str) -> String;

    fn format_failure(&self, failure: &TickerFailure) -> String {
        format!("{}: skipped ({})", failure.symbol, failure.reason)
    }

    fn format_batch(&self, batch: &ScoreBatch) -> String {
        let mut output = self.format_title(&format!(
            "Stock Signals: {} strategy ({})",
            batch.strategy,
            batch.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));
        output.push('\n');
        output.push_str(&self.format_table(&SUMMARY_HEADERS, &summary_rows(batch)));
        output.push('\n');

        for outcome in &batch.outcomes {
            output.push('\n');
            match outcome {
                TickerOutcome::Scored(result) => output.push_str(&self.format_score(result, batch.lookback)),
                TickerOutcome::Skipped(failure) => output.push_str(&self.format_failure(failure)),
            }
            output.push('\n');
        }

        if batch.strategy == Strategy::Relative {
            output.push('\n');
            output.push_str(&benchmark_line(&batch.benchmark));
            output.push('\n');
        }
        output
    }
}

/// `1234567.891` -> `1,234,567.89`
pub fn money(value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }
    let digits = format!("{:.2}", value.abs());
    let (int, frac) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 && digits != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac}")
}

fn benchmark_line(benchmark: &BenchmarkReference) -> String {
    let values = format!(
        "P/E {:.2}, n {:.4}, PEG {:.2}",
        benchmark.trailing_pe, benchmark.n_ratio, benchmark.peg_ratio
    );
    match &benchmark.source {
        BenchmarkSource::Captured(symbol) => format!("Benchmark {symbol}: {values}"),
        BenchmarkSource::Default => format!("Benchmark unavailable, default baseline used ({values})"),
    }
}

fn opt2(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2}"))
}

fn score_text(result: &ScoreResult) -> String {
    match result.strategy {
        Strategy::Relative => format!("{:.2}", result.score),
        Strategy::Composite => format!("{:.1}", result.score),
    }
}

fn verdict(result: &ScoreResult) -> String {
    match result.grade {
        Some(grade) => grade.label().to_string(),
        None => format!("n {:.4}", result.n_ratio),
    }
}

fn summary_rows(batch: &ScoreBatch) -> Vec<Vec<String>> {
    batch
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            TickerOutcome::Scored(r) => vec![
                r.symbol.clone(),
                r.role.to_string(),
                score_text(r),
                r.daily_investment_amount.map_or_else(|| "-".to_string(), |a| format!("${a:.2}")),
                r.drawdown_pct.map_or_else(|| "N/A".to_string(), |d| format!("{d:.1}%")),
                verdict(r),
            ],
            TickerOutcome::Skipped(f) => vec![
                f.symbol.clone(),
                f.role.to_string(),
                "skipped".to_string(),
                "-".to_string(),
                "-".to_string(),
                f.reason.clone(),
            ],
        })
        .collect()
}

/// Label/value lines shared by both formatters
fn detail_lines(result: &ScoreResult, lookback: Lookback) -> Vec<(String, String)> {
    let mut lines = vec![("Current Price".to_string(), money(result.current_price))];
    // Over the full history the window high is the all-time high printed below
    if result.strategy == Strategy::Relative || lookback != Lookback::Max {
        lines.push((format!("{} High", lookback.label()), money(result.historical_high)));
    }
    if result.strategy == Strategy::Composite {
        lines.push((
            "All-Time High".to_string(),
            format!("{} ({})", money(result.all_time_high.price), result.all_time_high.date),
        ));
    }
    lines.push(("n (High/Current)".to_string(), format!("{:.4}", result.n_ratio)));
    lines.push(("Trailing P/E".to_string(), opt2(result.trailing_pe)));
    lines.push(("Forward P/E".to_string(), opt2(result.forward_pe)));
    let peg = match result.peg_source {
        Some(source) if source != PegSource::Reported && result.peg.is_some() => {
            format!("{} ({})", opt2(result.peg), source.label())
        }
        _ => opt2(result.peg),
    };
    lines.push(("PEG".to_string(), peg));
    if let Some(drawdown) = result.drawdown_pct {
        lines.push(("Drawdown".to_string(), format!("{drawdown:.1}%")));
    }

    let score = match result.strategy {
        Strategy::Relative => score_text(result),
        Strategy::Composite => format!("{}/100 {}", score_text(result), result.score_bucket().emoji()),
    };
    lines.push(("Score".to_string(), score));
    if let Some(amount) = result.daily_investment_amount {
        lines.push(("Daily Invest".to_string(), format!("${amount:.2}")));
    }
    if let Some(grade) = result.grade {
        lines.push(("Verdict".to_string(), grade.label().to_string()));
    }
    lines
}

fn component_lines(result: &ScoreResult) -> Vec<String> {
    result
        .components
        .iter()
        .map(|(metric, component)| {
            let contribution = match result.strategy {
                Strategy::Relative => format!("x{:.3}", component.contribution),
                Strategy::Composite => format!("{:+.1}", component.contribution),
            };
            format!(
                "{:<17} {:>9} {:>7}  {}",
                metric.label(),
                metric.format_value(component.value),
                contribution,
                component.bucket.label()
            )
        })
        .collect()
}

fn macro_lines(assessment: &MacroAssessment) -> Vec<String> {
    let zscore = assessment
        .inputs
        .buffett_zscore
        .map_or_else(|| "N/A (limited history)".to_string(), |z| format!("{z:.2}"));
    vec![
        format!(" [VALUATION] Buffett Z-Score:  {zscore}"),
        format!(" [LIQUIDITY] 10Y-2Y Spread:    {:.2}%", assessment.inputs.yield_spread),
        format!(" [CURRENCY]  S&P/Gold Ratio:   {:.2}", assessment.sp_gold_ratio),
    ]
}

fn allocation_lines(assessment: &MacroAssessment) -> Vec<String> {
    vec![
        format!("   > Equities: {}%", assessment.allocation.equities),
        format!("   > Gold:     {}%", assessment.allocation.hedge),
        format!("   > Cash:     {}%", assessment.allocation.cash),
    ]
}

fn render_table(preset: &str, headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table
        .load_preset(preset)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers.to_vec());
    for row in rows {
        table.add_row(row.clone());
    }
    table.to_string()
}

pub struct CliFormatter;

impl Formatter for CliFormatter {
    fn platform(&self) -> ReportPlatform {
        ReportPlatform::Cli
    }

    fn format_title(&self, title: &str) -> String {
        format!("{}\n{title}\n{}", "=".repeat(RULE_WIDTH), "=".repeat(RULE_WIDTH))
    }

    fn format_score(&self, result: &ScoreResult, lookback: Lookback) -> String {
        let mut output = format!("--- {} ({}) ---\n", result.symbol, result.role);
        for (label, value) in detail_lines(result, lookback) {
            output.push_str(&format!("  {:<18} {value}\n", format!("{label}:")));
        }
        output.push_str("  Components:\n");
        for line in component_lines(result) {
            output.push_str(&format!("    {line}\n"));
        }
        output
    }

    fn format_table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        render_table(presets::UTF8_FULL_CONDENSED, headers, rows)
    }

    fn format_macro(&self, report: &MacroReport) -> String {
        let assessment = match report {
            MacroReport::Assessed(assessment) => assessment,
            MacroReport::Failed { reason } => return format!("Macro report unavailable: {reason}"),
        };

        let mut output = self.format_title(&format!(
            "        GLOBAL MACRO DASHBOARD ({})",
            Utc::now().format("%Y-%m-%d")
        ));
        output.push('\n');
        for line in macro_lines(assessment) {
            output.push_str(&line);
            output.push('\n');
        }
        output.push_str(&"-".repeat(RULE_WIDTH));
        output.push('\n');
        output.push_str(&format!(" MARKET REGIME: {}\n", assessment.regime));
        output.push_str(" RECOMMENDED ALLOCATION:\n");
        for line in allocation_lines(assessment) {
            output.push_str(&line);
            output.push('\n');
        }
        output.push_str(&"=".repeat(RULE_WIDTH));
        output
    }
}

/// Markdown for the Telegram Bot API; aligned parts go in monospace blocks
pub struct TelegramFormatter;

impl Formatter for TelegramFormatter {
    fn platform(&self) -> ReportPlatform {
        ReportPlatform::Telegram
    }

    fn format_title(&self, title: &str) -> String {
        format!("*{title}*")
    }

    fn format_score(&self, result: &ScoreResult, lookback: Lookback) -> String {
        let mut output = format!("*{}* ({})\n```\n", result.symbol, result.role);
        for (label, value) in detail_lines(result, lookback) {
            output.push_str(&format!("{:<18} {value}\n", format!("{label}:")));
        }
        for line in component_lines(result) {
            output.push_str(&line);
            output.push('\n');
        }
        output.push_str("```");
        output
    }

    fn format_failure(&self, failure: &TickerFailure) -> String {
        format!("⛔ {}: skipped ({})", failure.symbol, failure.reason)
    }

    fn format_table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        format!("```\n{}\n```", render_table(presets::ASCII_MARKDOWN, headers, rows))
    }

    fn format_macro(&self, report: &MacroReport) -> String {
        let assessment = match report {
            MacroReport::Assessed(assessment) => assessment,
            MacroReport::Failed { reason } => return format!("⚠️ *Macro report unavailable:* {reason}"),
        };

        let mut output = format!("*Market Regime: {}*\n```\n", assessment.regime);
        for line in macro_lines(assessment).into_iter().chain(allocation_lines(assessment)) {
            output.push_str(line.trim_start());
            output.push('\n');
        }
        output.push_str("```");
        output
    }
}

pub struct FormatterFactory;

impl FormatterFactory {
    pub fn create(platform: ReportPlatform) -> Box<dyn Formatter> {
        match platform {
            ReportPlatform::Cli => Box::new(CliFormatter),
            ReportPlatform::Telegram => Box::new(TelegramFormatter),
        }
    }
}
