mod cli;
mod commands;
mod config;
mod error;
mod input;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::config::PartialProcessingConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("🚀 molkit CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    if let Some(num_threads) = cli.threads {
        info!("Setting Rayon global thread pool to {} threads.", num_threads);
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .map_err(|e| {
                CliError::Other(anyhow::anyhow!("Failed to build global thread pool: {}", e))
            })?;
    }

    let config = PartialProcessingConfig::load(cli.config.as_deref())?.merge_with_cli(&cli.set_values)?;
    debug!(?config, "Processing configuration resolved.");
    let progress = CliProgressHandler::new(!cli.quiet);

    let command_result = match cli.command {
        Commands::Select(args) => {
            info!("Dispatching to 'select' command.");
            commands::select::run(args, &config, &progress)
        }
        Commands::Parse(args) => {
            info!("Dispatching to 'parse' command.");
            commands::parse::run(args)
        }
        Commands::Inspect(args) => {
            info!("Dispatching to 'inspect' command.");
            commands::inspect::run(args, &config, &progress)
        }
        Commands::Align(args) => {
            info!("Dispatching to 'align' command.");
            commands::align::run(args, &config)
        }
        Commands::Superpose(args) => {
            info!("Dispatching to 'superpose' command.");
            commands::superpose::run(args, &config, &progress)
        }
    };

    match &command_result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }
    command_result
}
