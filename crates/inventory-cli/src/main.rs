//! Inventory CLI
//!
//! Command-line interface for the device inventory

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use inventory_core::errors::ExError;
use inventory_core::logging_facility::{init, Profile};
use inventory_core::CancelToken;
use inventory_store::SqliteStore;

mod commands;
mod config;

use config::{Config, FlagOverrides, LogFormat};

/// Exit status for a run stopped by Ctrl-C
const EXIT_CANCELLED: u8 = 130;

/// Exit status for any other failure
const EXIT_FAILURE: u8 = 1;

#[derive(Debug, Parser)]
#[command(name = "inventory")]
#[command(about = "Device inventory - discovery snapshot reconciler", long_about = None)]
struct Cli {
    /// Config file (default: ./.inventory.yaml, then ~/.inventory.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding inventory.db
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Discovery snapshot operations
    Snapshot(commands::snapshot::SnapshotArgs),
    /// Device operations
    Device(commands::device::DeviceArgs),
    /// Print the version
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let flags = FlagOverrides {
        data_dir: cli.data_dir.clone(),
        debug: cli.debug,
    };
    let config = match Config::load(cli.config.as_deref(), &flags) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init(profile_for(&config));

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(exit_status(e.as_ref()))
        }
    }
}

/// Process exit status for a failed run
fn exit_status(err: &(dyn std::error::Error + 'static)) -> u8 {
    let cancelled = err
        .downcast_ref::<ExError>()
        .is_some_and(ExError::is_cancelled);
    if cancelled {
        EXIT_CANCELLED
    } else {
        EXIT_FAILURE
    }
}

fn profile_for(config: &Config) -> Profile {
    match (config.debug, config.log_format) {
        (true, LogFormat::Text) => Profile::Development,
        (_, LogFormat::Json) => Profile::Production,
        (false, LogFormat::Text) => Profile::Console,
    }
}

fn run(command: Commands, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let Commands::Version = command {
        println!("inventory {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    tracing::debug!(db = %config.db_path().display(), "opening inventory store");
    let store = SqliteStore::open(config.db_path())?;

    match command {
        Commands::Snapshot(args) => commands::snapshot::execute(args, &store, &cancel),
        Commands::Device(args) => commands::device::execute(args, &store),
        Commands::Version => Ok(()),
    }
}
