//! # roomsync
//!
//! CLI tool for synchronizing a room's users and streams.
//!
//! ## Commands
//!
//! - `snapshot`: Fetch the whole room
//! - `sync`: Fetch changes since the last committed mark
//! - `status`: Show stored marks
//!
//! ## Example
//!
//! ```bash
//! # Full listing as JSON
//! roomsync --config roomsync.toml snapshot --json
//!
//! # Refresh every `interval_secs` until Ctrl-C
//! roomsync sync --watch
//!
//! # Show what has been committed
//! roomsync status
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod state;

use commands::sync::Listing;
use commands::{snapshot, status, sync};
use config::Config;

/// CLI tool for roomsync.
#[derive(Parser, Debug)]
#[command(name = "roomsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, short, global = true, default_value = "roomsync.toml")]
    config: PathBuf,

    /// Data directory for storing sync state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the whole room from scratch
    Snapshot {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch changes since the last committed mark
    Sync {
        /// Listing to walk
        #[arg(long, value_enum, default_value_t = Listing::UserStreams)]
        listing: Listing,

        /// Keep syncing every `interval_secs` until interrupted
        #[arg(long)]
        watch: bool,
    },

    /// Show stored marks
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    match cli.command {
        Commands::Snapshot { json } => {
            let config = Config::from_file(&cli.config)?;
            snapshot::run(&config, json).await?;
        }
        Commands::Sync { listing, watch } => {
            let config = Config::from_file(&cli.config)?;
            sync::run(&config, &data_dir, listing, watch).await?;
        }
        Commands::Status => {
            let config = Config::from_file(&cli.config).ok();
            status::run(config.as_ref(), &data_dir).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::new("info"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Get the default data directory for roomsync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "roomsync", "roomsync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
