use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use querylog_analyzer::cache::RecordCache;
use querylog_analyzer::config::{parse_window, Config, DeliveryConfig, ScopeChoice};
use querylog_analyzer::display::{DeliveryStatus, DisplayManager};
use querylog_analyzer::logging::{init_logging, run_span};
use querylog_analyzer::{LocalFileSource, QueryLogAnalyzer, Window};
use std::path::{Path, PathBuf};
use std::process;
use tracing::Instrument;

#[derive(Parser)]
#[command(name = "querylog-analyzer")]
#[command(about = "Daily spreadsheet reports from AdGuard Home query logs")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse the query log and write an .xlsx report (default)
    Report(ReportArgs),
    /// Write the resolved configuration to a TOML file
    InitConfig {
        /// Destination file
        #[arg(long, default_value = "querylog-analyzer.toml")]
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Clone)]
struct ReportArgs {
    /// Query log to analyse (JSON Lines)
    #[arg(long)]
    log: Option<PathBuf>,
    /// Hour window: peak (07:00-14:00) or full
    #[arg(long, value_parser = parse_window)]
    window: Option<Window>,
    /// Only analyse this client IP
    #[arg(long, conflicts_with = "all")]
    client: Option<String>,
    /// Analyse every client
    #[arg(long)]
    all: bool,
    /// Day to analyse instead of the most recent one (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
    /// Directory the report is written to
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Parse the log even if a cached parse exists
    #[arg(long)]
    no_cache: bool,
    /// Upload the report to the configured delivery endpoint
    #[arg(long)]
    deliver: bool,
    /// Output in JSON format
    #[arg(long)]
    json: bool,
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {}. Use YYYY-MM-DD", value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::InitConfig { path, force }) => {
            match init_config(&path, force) {
                Ok(()) => {
                    println!("Configuration written to {}", path.display());
                    Ok(())
                }
                Err(e) => handle_error(e, false),
            }
        }
        Some(Commands::Report(args)) => run_report(args).await,
        None => run_report(cli.report).await,
    }
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{} already exists, use --force to overwrite", path.display());
    }
    Config::load()?.save_to_file(path)
}

async fn run_report(args: ReportArgs) -> Result<()> {
    let json = args.json;

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => return handle_error(e, json),
    };

    let _guard = init_logging(&config.logging, &config.paths.log_directory);
    let span = run_span();

    let options = match config.analysis_options() {
        Ok(options) => options,
        Err(e) => return handle_error(e, json),
    };

    let mut analyzer = QueryLogAnalyzer::new(&config.paths.output_dir);
    if config.cache.enabled {
        analyzer = analyzer.with_cache(RecordCache::new(&config.paths.cache_file));
    }

    let source = LocalFileSource::new(&config.paths.log_file);
    let run = match span.in_scope(|| analyzer.run(&source, &options)) {
        Ok(run) => run,
        Err(e) => return handle_error(e.into(), json),
    };

    let delivery = match run.outcome.report_path() {
        Some(path) if config.delivery.enabled => Some(
            deliver_report(&config.delivery, path)
                .instrument(span.clone())
                .await,
        ),
        _ => None,
    };

    DisplayManager::new(json).display_run(&run, delivery.as_ref());
    Ok(())
}

/// Configuration file and environment, then command line flags on top.
fn load_config(args: &ReportArgs) -> Result<Config> {
    let mut config = Config::load()?;

    if let Some(log) = &args.log {
        config.paths.log_file = log.clone();
    }
    if let Some(window) = args.window {
        config.analysis.window = window;
    }
    if let Some(client) = &args.client {
        config.analysis.scope = ScopeChoice::Single;
        config.analysis.target_ip = Some(client.clone());
    }
    if args.all {
        config.analysis.scope = ScopeChoice::All;
    }
    if args.date.is_some() {
        config.analysis.date = args.date;
    }
    if let Some(output_dir) = &args.output_dir {
        config.paths.output_dir = output_dir.clone();
    }
    if args.no_cache {
        config.cache.enabled = false;
    }
    if args.deliver {
        config.delivery.enabled = true;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(feature = "delivery")]
async fn deliver_report(config: &DeliveryConfig, path: &Path) -> DeliveryStatus {
    use querylog_analyzer::delivery::HttpDelivery;

    let result = match HttpDelivery::new(&config.endpoint, config.timeout()) {
        Ok(delivery) => delivery.deliver(path).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(receipt) => DeliveryStatus::Delivered {
            url: receipt.url,
            bytes: receipt.bytes,
        },
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "Report delivery failed");
            DeliveryStatus::Failed {
                error: e.to_string(),
            }
        }
    }
}

#[cfg(not(feature = "delivery"))]
async fn deliver_report(_config: &DeliveryConfig, _path: &Path) -> DeliveryStatus {
    DeliveryStatus::Failed {
        error: "built without the `delivery` feature".to_string(),
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> Result<(), anyhow::Error> {
    if json {
        println!("{}", serde_json::json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
