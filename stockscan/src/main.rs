//! Stockscan - fundamental + quant stock scanner.
//!
//! Scans a ticker universe, prints the passing candidates ranked by alpha,
//! and optionally exports them to CSV or a Google Sheet.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use stockscan::data::{
    parse_ticker_list, ConstituentsUniverse, StaticUniverse, UniverseSource, YahooAdapter,
};
use stockscan::export::{self, ExportError, ServiceAccountKey, SheetsUploader};
use stockscan::screener::{PassingRow, ReportFormat, ScanEngine, ScanReport, ScreenerConfig};
use stockscan_common::config::{Config, ThresholdConfig};
use stockscan_common::logging::init_logging;
use stockscan_common::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "stockscan")]
#[command(version)]
#[command(about = "Screen equities on valuation, growth, Sortino, alpha and CROCI.", long_about = None)]
struct Cli {
    /// Config file (default: ~/.stockscan/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scan and print the passing tickers
    Scan(ScanArgs),

    /// Print the default ticker universe
    Universe,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Tickers separated by spaces, commas or newlines (default: index constituents)
    #[arg(short, long)]
    tickers: Option<String>,

    /// File with tickers, same separators as --tickers
    #[arg(long)]
    tickers_file: Option<PathBuf>,

    #[command(flatten)]
    thresholds: ThresholdArgs,

    /// Concurrent ticker evaluations
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-ticker timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Output format (text, markdown, json)
    #[arg(short, long, default_value = "text")]
    format: ReportFormat,

    /// Write passing rows to a CSV file
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Google Sheet to overwrite with passing rows
    #[arg(long)]
    sheet_url: Option<String>,

    /// Service-account JSON for --sheet-url
    #[arg(long)]
    sheets_credentials: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ThresholdArgs {
    /// Max PE
    #[arg(long, allow_negative_numbers = true)]
    max_pe: Option<f64>,

    /// Max EV/EBITDA
    #[arg(long, allow_negative_numbers = true)]
    max_ev_ebitda: Option<f64>,

    /// Min revenue YoY %
    #[arg(long, allow_negative_numbers = true)]
    min_revenue_growth: Option<f64>,

    /// Min EPS YoY %
    #[arg(long, allow_negative_numbers = true)]
    min_eps_growth: Option<f64>,

    /// Min Sortino
    #[arg(long, allow_negative_numbers = true)]
    min_sortino: Option<f64>,

    /// Min alpha (annualised)
    #[arg(long, allow_negative_numbers = true)]
    min_alpha: Option<f64>,

    /// Min CROCI %
    #[arg(long, allow_negative_numbers = true)]
    min_croci: Option<f64>,
}

impl ThresholdArgs {
    fn apply(&self, base: ThresholdConfig) -> ThresholdConfig {
        ThresholdConfig {
            max_pe: self.max_pe.unwrap_or(base.max_pe),
            max_ev_ebitda: self.max_ev_ebitda.unwrap_or(base.max_ev_ebitda),
            min_revenue_growth_pct: self.min_revenue_growth.unwrap_or(base.min_revenue_growth_pct),
            min_eps_growth_pct: self.min_eps_growth.unwrap_or(base.min_eps_growth_pct),
            min_sortino: self.min_sortino.unwrap_or(base.min_sortino),
            min_alpha: self.min_alpha.unwrap_or(base.min_alpha),
            min_croci_pct: self.min_croci.unwrap_or(base.min_croci_pct),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            let code = e.downcast_ref::<Error>().map_or(1, Error::exit_code);
            ExitCode::from(code as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply_env_overrides();
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
    }

    init_logging(&config.observability.log_level, &config.observability.log_format);
    tracing::debug!("Stockscan v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Scan(args) => scan(config, args).await,
        Commands::Universe => {
            let universe = ConstituentsUniverse::from_config(&config);
            let tickers = universe
                .get_default_universe()
                .await
                .context("Failed to load default universe")?;
            for ticker in tickers {
                println!("{}", ticker);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn resolve_tickers(args: &ScanArgs, config: &Config) -> Result<Vec<String>> {
    let source: Box<dyn UniverseSource> = if args.tickers.is_some() || args.tickers_file.is_some() {
        let mut input = args.tickers.clone().unwrap_or_default();
        if let Some(path) = &args.tickers_file {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read tickers from {}", path.display()))?;
            input.push('\n');
            input.push_str(&text);
        }
        Box::new(StaticUniverse::new(parse_ticker_list(&input)))
    } else {
        Box::new(ConstituentsUniverse::from_config(config))
    };

    info!(source = source.name(), "Resolving tickers");
    source
        .get_default_universe()
        .await
        .with_context(|| format!("Failed to load tickers from {} source", source.name()))
}

async fn scan(mut config: Config, args: ScanArgs) -> Result<ExitCode> {
    config.thresholds = args.thresholds.apply(config.thresholds);
    if let Some(n) = args.concurrency {
        config.scanner.concurrency = n;
    }
    if let Some(secs) = args.timeout {
        config.scanner.ticker_timeout_secs = secs;
    }
    config.validate()?;

    let sheet_url = args.sheet_url.clone().or_else(|| config.export.sheet_url.clone());
    let credentials = args
        .sheets_credentials
        .clone()
        .or_else(|| config.export.sheets_credentials_path.clone());
    if sheet_url.is_some() && credentials.is_none() {
        return Err(Error::InvalidInput(
            "--sheet-url needs --sheets-credentials (or export.sheets_credentials_path)".into(),
        )
        .into());
    }

    let tickers = resolve_tickers(&args, &config).await?;
    if tickers.is_empty() {
        return Err(Error::InvalidInput("please specify at least one ticker".into()).into());
    }

    let provider = Arc::new(YahooAdapter::from_config(&config));
    let engine = ScanEngine::new(provider, ScreenerConfig::from_config(&config));

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing tickers in flight");
            on_interrupt.cancel();
        }
    });

    let result = engine.run_with_cancel(&tickers, &cancel).await?;
    let report = ScanReport::new(&result);
    println!("{}", report.generate(args.format));

    let rows = report.rows();
    if rows.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    let mut failures = Vec::new();

    if let Some(path) = &args.csv {
        match export::write_csv(path, rows) {
            Ok(()) => info!(path = %path.display(), rows = rows.len(), "CSV written"),
            Err(e) => failures.push(("CSV", e)),
        }
    }

    if let (Some(url), Some(path)) = (&sheet_url, &credentials) {
        if let Err(e) = upload(url, path, rows).await {
            failures.push(("Google Sheets", e));
        }
    }

    if failures.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    for (sink, error) in &failures {
        eprintln!("{} export error: {}", sink, error);
    }
    Ok(ExitCode::FAILURE)
}

async fn upload(
    sheet_url: &str,
    credentials: &std::path::Path,
    rows: &[PassingRow],
) -> Result<usize, ExportError> {
    let key = ServiceAccountKey::from_file(credentials)?;
    SheetsUploader::new(key).upload(sheet_url, rows).await
}
