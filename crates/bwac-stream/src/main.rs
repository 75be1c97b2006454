//! `bwac`, the BarentsWatch AIS client.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use bwac_auth::AccessTokenManager;
use bwac_models::parse_msgtime;
use bwac_storage::TrackWriter;
use bwac_stream::logging::init_tracing;
use bwac_stream::signal::spawn_shutdown_listener;
use bwac_stream::{HistoricClient, ReconnectSupervisor, StreamConfig, StreamIngestor};
use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(name = "bwac", version, about = "bwac - barentswatch apiclient")]
struct Cli {
    /// Log level for the bwac crates (RUST_LOG still applies to others)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print the full error chain on failure
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Connect to the live stream and write daily CSV files
    Live(LiveArgs),
    /// Download vessel tracks from the historic interface
    Historic(HistoricArgs),
}

#[derive(Args)]
struct LiveArgs {
    /// Output directory to use
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Args)]
struct HistoricArgs {
    /// From time (default: one day before now)
    #[arg(long, value_parser = parse_cli_time)]
    from_date: Option<DateTime<Utc>>,

    /// To time (default: now)
    #[arg(long, value_parser = parse_cli_time)]
    to_date: Option<DateTime<Utc>>,

    /// The output directory
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

fn parse_cli_time(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_msgtime(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Command::Live(args) => run_live(args).await,
        Command::Historic(args) => run_historic(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if cli.verbose => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_live(args: LiveArgs) -> anyhow::Result<()> {
    let config = StreamConfig::from_env();
    let tokens = AccessTokenManager::from_env().context("loading BarentsWatch credentials")?;
    let ingestor = StreamIngestor::new(&config)?;
    let shutdown = spawn_shutdown_listener();

    info!(
        output_dir = %args.output_dir.display(),
        live_url = %config.live_url,
        "Starting consumer"
    );

    let mut supervisor = ReconnectSupervisor::new(tokens, ingestor, &config, shutdown);
    supervisor
        .run_forever(&args.output_dir)
        .await
        .context("live ingestion failed")?;
    Ok(())
}

async fn run_historic(args: HistoricArgs) -> anyhow::Result<()> {
    let now = Utc::now();
    let to = args.to_date.unwrap_or(now);
    let from = args.from_date.unwrap_or(to - Duration::days(1));
    if from >= to {
        bail!("--from-date ({}) must be before --to-date ({})", from, to);
    }

    let config = StreamConfig::from_env();
    let tokens = AccessTokenManager::from_env().context("loading BarentsWatch credentials")?;
    let mut client = HistoricClient::new(&config, tokens)?;
    let writer = TrackWriter::new(&args.output_dir).await?;

    info!(%from, %to, output_dir = %args.output_dir.display(), "Starting historic download");
    client
        .download(&writer, from, to)
        .await
        .context("historic download failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_historic_dates_accept_offsets_and_naive() {
        let cli = Cli::try_parse_from([
            "bwac",
            "historic",
            "--from-date",
            "2025-07-24T02:00:00+02:00",
            "--to-date",
            "2025-07-25T00:00:00",
        ])
        .unwrap();

        let Command::Historic(args) = cli.command else {
            panic!("expected historic");
        };
        assert_eq!(args.from_date.unwrap().to_rfc3339(), "2025-07-24T00:00:00+00:00");
        assert_eq!(args.to_date.unwrap().to_rfc3339(), "2025-07-25T00:00:00+00:00");
        assert_eq!(args.output_dir, PathBuf::from("."));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["bwac", "live", "--output-dir", "/data", "--log-level", "debug"])
                .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(!cli.verbose);
    }

    #[test]
    fn test_invalid_date_is_rejected() {
        assert!(Cli::try_parse_from(["bwac", "historic", "--from-date", "yesterday"]).is_err());
    }
}
