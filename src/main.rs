//! oddsapi - command line client for The Odds API
//!
//! Requests are dry-run unless `--live` is passed or the configuration
//! disables dry-run mode.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use oddsapi::api::ApiResponse;
use oddsapi::config::LoggingConfig;
use oddsapi::{Config, OddsApi, QueryParams, credentials};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "oddsapi")]
#[command(version, about = "Quota-aware client for The Odds API", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to a .env file (default: ./.env when present)
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Send requests instead of logging them (consumes quota)
    #[arg(long, global = true)]
    live: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Call an endpoint, e.g. `get /sports -p all=true`
    Get {
        /// Endpoint path appended to the base URL
        endpoint: String,

        /// Query parameter as KEY=VALUE (repeatable)
        #[arg(short = 'p', long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// List sports
    Sports {
        /// Include out-of-season sports
        #[arg(long)]
        all: bool,
    },

    /// Current odds for a sport key, e.g. `americanfootball_nfl`
    Odds {
        /// Sport key
        sport: String,

        /// Comma-separated bookmaker regions
        #[arg(long, default_value = "us")]
        regions: String,

        /// Comma-separated markets
        #[arg(long, default_value = "h2h")]
        markets: String,
    },

    /// Check that the API key is available without printing it
    CheckEnv,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    load_env_file(cli.env_file.as_deref())?;

    let mut config = Config::load(cli.config.clone()).context("failed to load configuration")?;
    if cli.live {
        config.api.dry_run = false;
    }

    let _log_guard = init_logging(&config.logging)?;

    if let Command::CheckEnv = cli.command {
        let check = credentials::check_environment(&config.api.api_key_env);
        if !check.is_ready() {
            bail!("{check}");
        }
        println!("✓ {check}");
        return Ok(());
    }

    let api = OddsApi::from_env(config.api).context("failed to create Odds API client")?;

    let response = match cli.command {
        Command::Get { endpoint, params } => {
            let params: QueryParams = params.into_iter().collect();
            api.execute(&endpoint, &params).await?
        }
        Command::Sports { all } => api.sports(all).await?,
        Command::Odds {
            sport,
            regions,
            markets,
        } => api.odds(&sport, &regions, &markets).await?,
        Command::CheckEnv => return Ok(()),
    };

    print_response(response)
}

fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => {
            // A missing ./.env is fine; the variable may already be exported.
            let _ = dotenvy::dotenv();
        }
    }
    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter.as_str()));
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    if !logging.file {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .init();
        return Ok(None);
    }

    let appender = tracing_appender::rolling::daily(oddsapi::config::log_dir()?, "oddsapi.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();
    Ok(Some(guard))
}

fn print_response((body, quota): ApiResponse) -> Result<()> {
    match body {
        Some(body) => println!("{}", serde_json::to_string_pretty(&body)?),
        None => info!("Dry run, nothing sent (pass --live to call the API)"),
    }

    if let Some(quota) = quota {
        info!(
            "Quota: last={} used={} remaining={}",
            quota.last.as_deref().unwrap_or("-"),
            quota.used.as_deref().unwrap_or("-"),
            quota.remaining.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}
