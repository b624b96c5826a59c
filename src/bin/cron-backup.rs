//! # cron-backup CLI
//!
//! Archives a directory into `<dist>/<YYYY-MM-DD HH:MM:SS>.zip` right away and
//! then every `--interval` seconds until stopped. Any failed run prints the
//! error and exits with status 1.
//!
//! ## Usage
//! ```bash
//! # Hourly snapshots of ./data into ./backups
//! cron-backup -s ./data -d ./backups
//!
//! # Every five minutes, with debug logging
//! cron-backup -s ./data -d ./backups -i 300 --verbose
//!
//! # A single snapshot
//! cron-backup -s ./data -d ./backups --once
//! ```

use clap::Parser;
use colored::*;
use cron_backup::{
    Archiver, ArchiveProgress, BackupConfig, Result, Scheduler, DEFAULT_INTERVAL_SECS,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Periodically archive a directory into timestamped zip files
#[derive(Parser)]
#[command(name = "cron-backup")]
#[command(version)]
#[command(about = "Periodically compress a directory into timestamped zip archives")]
#[command(long_about = None)]
struct Cli {
    /// Source directory to archive
    #[arg(short = 's', long = "src", value_name = "DIR")]
    src: PathBuf,

    /// Destination directory for the archives (created if missing)
    #[arg(short = 'd', long = "dist", value_name = "DIR")]
    dist: PathBuf,

    /// Seconds between two archives (minimum 1)
    #[arg(short = 'i', long = "interval", value_name = "SECS", default_value_t = DEFAULT_INTERVAL_SECS)]
    interval: u64,

    /// Archive once and exit
    #[arg(long)]
    once: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}: cannot start runtime: {}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(cli)) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main command runner
async fn run(cli: Cli) -> Result<()> {
    let config = BackupConfig::new(cli.src, cli.dist, cli.interval);
    config.validate()?;
    config.prepare_destination()?;

    let archiver = Archiver::new().with_progress(Arc::new(print_progress));
    let mut scheduler = Scheduler::with_runner(config, archiver);

    if cli.once {
        for summary in scheduler.run_bounded(1).await? {
            println!(
                "{} {} ({} entries, {} bytes)",
                "✓ Created".green().bold(),
                summary.destination.display().to_string().cyan(),
                summary.entries,
                summary.bytes_copied
            );
        }
        return Ok(());
    }

    match scheduler.run().await {
        Ok(never) => match never {},
        Err(e) => Err(e),
    }
}

fn print_progress(progress: ArchiveProgress) {
    println!(
        "Archived {}: {} bytes written",
        progress.path.display(),
        progress.bytes
    );
}
