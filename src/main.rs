//! Pracuj-Harvest main entry point
//!
//! This is the command-line interface for the two-phase job-offer harvester.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use pracuj_harvest::config::{load_config_with_hash, Config};
use pracuj_harvest::crawler::{run_details, run_listing};
use pracuj_harvest::output::{print_detail_report, print_listing_report};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Pracuj-Harvest: a two-phase job-offer harvester
///
/// The listing phase paginates every category's search results and saves each page.
/// The details phase downloads every offer found in the saved listings, skipping
/// offers that were already downloaded.
#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(version)]
#[command(about = "A two-phase job-offer harvester", long_about = None)]
struct Cli {
    /// Phases to run; when both are given, listing runs before details
    #[arg(value_enum, required = true, num_args = 1..)]
    modes: Vec<Mode>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "harvest.toml")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Mode {
    /// Paginate category search results
    Listing,
    /// Download offer detail pages
    Details,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let mut modes = cli.modes.clone();
    modes.sort();
    modes.dedup();

    for mode in modes {
        match mode {
            Mode::Listing => handle_listing(&config, cancel.clone()).await?,
            Mode::Details => handle_details(&config, &cancel).await?,
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pracuj_harvest=info,harvest=info,warn"),
            1 => EnvFilter::new("pracuj_harvest=debug,harvest=debug,info"),
            2 => EnvFilter::new("pracuj_harvest=trace,harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels the run on Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current operation");
            cancel.cancel();
        }
    });
}

async fn handle_listing(config: &Config, cancel: CancellationToken) -> anyhow::Result<()> {
    tracing::info!(
        "Starting listing phase into {}",
        config.paths.listing_dir.display()
    );
    let report = run_listing(config, cancel)
        .await
        .context("Listing phase failed")?;
    print_listing_report(&report);
    Ok(())
}

async fn handle_details(config: &Config, cancel: &CancellationToken) -> anyhow::Result<()> {
    tracing::info!(
        "Starting details phase from {} into {}",
        config.paths.listing_dir.display(),
        config.paths.details_dir.display()
    );
    let report = run_details(config, cancel)
        .await
        .context("Details phase failed")?;
    print_detail_report(&report);
    Ok(())
}
