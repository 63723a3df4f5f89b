mod cli;
mod commands;
mod config;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::config::{ConfigOverrides, PartialSessionConfig};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("zeo CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let mut overrides = ConfigOverrides {
        set_values: cli.set_values.clone(),
        ..Default::default()
    };
    match &cli.command {
        Commands::Convert(args) => overrides.gzip_level = args.gzip_level,
        Commands::Edit(args) => {
            overrides.max_undo = args.max_undo;
            overrides.gzip_level = args.gzip_level;
        }
        Commands::Show(_) => {}
    }
    let config = PartialSessionConfig::load(cli.config.as_deref())?.merge_with_cli(&overrides)?;
    debug!(?config, "Session configuration resolved");

    let command_result = match cli.command {
        Commands::Show(args) => {
            info!("Dispatching to 'show' command.");
            commands::show::run(args, config)
        }
        Commands::Convert(args) => {
            info!("Dispatching to 'convert' command.");
            commands::convert::run(args, config)
        }
        Commands::Edit(args) => {
            info!("Dispatching to 'edit' command.");
            commands::edit::run(args, config)
        }
    };

    if let Err(e) = &command_result {
        error!("Command failed: {}", e);
    } else {
        info!("Command completed successfully.");
    }
    command_result
}
