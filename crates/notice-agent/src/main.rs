use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use notice_agent::{
    summary, HttpFetcher, Orchestrator, RunnerContext, TableParser, TelegramNotifier, WatchConfig,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file (all keys optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Notice board URL (overrides NOTICE_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Notice store snapshot (overrides NOTICE_CACHE_FILE)
    #[arg(long, global = true)]
    cache_file: Option<PathBuf>,

    /// Error ledger snapshot (overrides NOTICE_ERROR_FILE)
    #[arg(long, global = true)]
    error_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one poll cycle (default)
    Check,
    /// Record that the scheduled run itself failed
    RunnerFailed {
        #[arg(long, env = "GITHUB_WORKFLOW")]
        workflow: Option<String>,
        #[arg(long, env = "GITHUB_RUN_ID")]
        run_id: Option<String>,
        #[arg(long, env = "GITHUB_REPOSITORY")]
        repository: Option<String>,
        #[arg(long, env = "GITHUB_SERVER_URL")]
        server_url: Option<String>,
    },
}

fn build_config(args: &Args) -> Result<WatchConfig> {
    let mut config = WatchConfig::load(args.config.as_deref())?;
    if let Some(url) = &args.url {
        config.source_url = url.clone();
    }
    if let Some(path) = &args.cache_file {
        config.cache_path = path.clone();
    }
    if let Some(path) = &args.error_file {
        config.error_state_path = path.clone();
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let started = Local::now();
    let clock = Instant::now();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e:#}");
            return Err(e);
        }
    };
    info!(
        url = %config.source_url,
        cache = %config.cache_path.display(),
        errors = %config.error_state_path.display(),
        "Notice monitor starting"
    );

    let fetcher = HttpFetcher::new(&config.user_agent, config.fetch_timeout)?;
    // validate() guarantees both credentials are present.
    let notifier = TelegramNotifier::new(
        &config.telegram_api_base,
        config.telegram_token.as_deref().unwrap_or_default(),
        config.telegram_chat_id.as_deref().unwrap_or_default(),
        config.notify_timeout,
    )
    .context("Failed to set up Telegram notifier")?;
    let orchestrator = Orchestrator::new(config, fetcher, TableParser::new(), notifier);

    let report = match args.command.unwrap_or(Command::Check) {
        Command::Check => orchestrator.run_cycle(),
        Command::RunnerFailed {
            workflow,
            run_id,
            repository,
            server_url,
        } => {
            let ctx = RunnerContext::default()
                .with_overrides(workflow, run_id, repository, server_url);
            orchestrator.report_runner_failure(&ctx)
        }
    };

    let config = orchestrator.config();
    summary::record_run(
        config.log_path.as_deref(),
        config.step_summary_path.as_deref(),
        started,
        clock.elapsed(),
        &report.to_string(),
    );
    println!("{report}");

    Ok(())
}
