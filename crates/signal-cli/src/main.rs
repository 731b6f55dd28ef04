//! Command-line interface for stock-signals

use anyhow::Context;
use clap::{Parser, Subcommand};
use signal_engine::report::CliFormatter;
use signal_engine::{
    Dispatcher, FormatterFactory, FredClient, MacroRunner, OutputFormat, ReportPlatform, RunReport,
    ScoreRunner, SignalConfig, SignalConfigBuilder, Strategy, TickerSpec, YahooFinanceClient,
};
use signal_utils::LogFormat;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "stock-signals", version)]
#[command(about = "Daily stock scores and macro regime signals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// TOML config file (default: ./signals.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Scoring strategy: relative or composite
    #[arg(short, long, global = true)]
    strategy: Option<Strategy>,

    /// Tickers as SYM[:role], comma separated (e.g. SPY:benchmark,GLD:commodity,MSFT)
    #[arg(short, long, global = true, value_delimiter = ',')]
    tickers: Option<Vec<TickerSpec>>,

    /// Output format: text or json
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Send the report to Telegram (console when credentials are missing)
    #[arg(long, global = true)]
    notify: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Score the configured tickers
    Score,
    /// Classify the macro regime
    Macro,
    /// Scores followed by the macro dashboard (default)
    All,
}

impl Commands {
    fn includes_score(self) -> bool {
        matches!(self, Self::Score | Self::All)
    }

    fn includes_macro(self) -> bool {
        matches!(self, Self::Macro | Self::All)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // .env may set RUST_LOG, so it is read before the subscriber and reported after
    let dotenv = signal_utils::load_dotenv();
    let log_format = if cli.json_logs { LogFormat::Json } else { LogFormat::Text };
    signal_utils::init_tracing_with(log_format, "info");
    dotenv.log();

    let config = load_config(&cli)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    runtime.block_on(run(&cli, &config))
}

/// File (or defaults) first, then command-line overrides, then validation
fn load_config(cli: &Cli) -> anyhow::Result<SignalConfig> {
    let base = match signal_utils::resolve_config_path(cli.config.as_deref()) {
        Some(path) => {
            info!("Loading config from {}", path.display());
            signal_utils::load_toml::<SignalConfig>(&path)?
        }
        None => SignalConfig::default(),
    };

    let mut builder = SignalConfigBuilder::from_config(base);
    if let Some(strategy) = cli.strategy {
        builder = builder.strategy(strategy);
    }
    if let Some(tickers) = &cli.tickers {
        builder = builder.tickers(tickers.clone());
    }
    builder.build().context("Invalid configuration")
}

async fn run(cli: &Cli, config: &SignalConfig) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Commands::All);
    let yahoo = YahooFinanceClient::new(&config.provider);

    let batch = if command.includes_score() {
        info!("Scoring {} tickers with the {} strategy", config.tickers.len(), config.strategy);
        let runner = ScoreRunner::new(yahoo.clone(), config.engine(), config.history.clone());
        let batch = runner.run(&config.tickers).await;
        info!(
            "Scored {}/{} tickers ({:.0}%)",
            batch.scored().count(),
            batch.outcomes.len(),
            batch.success_rate() * 100.0
        );
        Some(batch)
    } else {
        None
    };

    let macro_report = if command.includes_macro() {
        let fred = FredClient::from_env(&config.provider).context("Failed to create FRED client")?;
        if !fred.has_api_key() {
            info!("FRED_API_KEY not set, using the public CSV download");
        }
        let runner = MacroRunner::new(yahoo, fred, config.macro_regime.clone());
        Some(runner.run().await)
    } else {
        None
    };

    let report = RunReport::new(batch.as_ref(), macro_report.as_ref());
    let output = report.to_format(cli.format, &CliFormatter)?;

    let dispatcher = cli.notify.then(|| Dispatcher::from_env(&config.notify));
    match dispatcher {
        // The console notifier prints the report itself
        Some(dispatcher) if dispatcher.is_console() => {
            dispatcher.dispatch(&output).await;
        }
        Some(dispatcher) => {
            println!("{output}");
            let formatter = FormatterFactory::create(ReportPlatform::Telegram);
            dispatcher.dispatch(&report.render(formatter.as_ref())).await;
        }
        None => println!("{output}"),
    }

    Ok(())
}
