//! Guia CLI - Command-line interface
//!
//! Resolves positions to street addresses with the Guia library, either one
//! coordinate at a time or continuously from a stream of readings.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use guia::config::default_log_path;
use guia::logging::{init_logging, LoggingGuard, DEFAULT_LOG_FILTER};

mod commands;
mod error;
mod output;

use commands::config::ConfigCommands;
use commands::locate::LocateArgs;
use commands::track::TrackArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "guia", version)]
#[command(about = "Follow your position and see where you are, as a street address", long_about = None)]
struct Cli {
    /// Configuration file [default: ~/.guia/config.ini]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file [default: ~/.guia/guia.log]
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log debug detail and show skipped readings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a single coordinate to an address
    Locate(LocateArgs),

    /// Track positions read as JSON lines from stdin
    Track(TrackArgs),

    /// Manage the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Config(command) => commands::config::run(command, cli.config.as_deref()),
        Commands::Locate(args) => {
            let _guard = start_logging(cli.log_file.as_deref(), cli.verbose)?;
            let config = commands::common::load_app_config(cli.config.as_deref())?;
            commands::locate::run(args, &config)
        }
        Commands::Track(args) => {
            let _guard = start_logging(cli.log_file.as_deref(), cli.verbose)?;
            let config = commands::common::load_app_config(cli.config.as_deref())?;
            commands::track::run(args, config, cli.verbose)
        }
    }
}

fn start_logging(log_file: Option<&Path>, verbose: bool) -> Result<LoggingGuard, CliError> {
    let path = log_file.map(Path::to_path_buf).unwrap_or_else(default_log_path);
    let filter = if verbose { "debug" } else { DEFAULT_LOG_FILTER };
    init_logging(&path, filter).map_err(|e| CliError::LoggingInit(e.to_string()))
}
