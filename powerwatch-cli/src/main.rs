//! Powerwatch CLI entry point
//!
//! Parses arguments, loads the configuration, initializes logging and
//! dispatches to the subcommand handlers in [`commands`].

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;

use powerwatch_core::config::{GeneralConfig, PowerwatchConfig};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            use colored::Colorize;
            eprintln!("{} {err}", "error:".red().bold());
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let loaded = PowerwatchConfig::load_or_default(&cli.config).await;

    // An invalid file still gets logging so `config validate` can report it.
    let mut general = loaded
        .as_ref()
        .map(|c| c.general.clone())
        .unwrap_or_else(|_| GeneralConfig::default());
    if let Some(level) = cli.log_level {
        general.log_level = level;
    }
    logging::init_tracing(&general).map_err(|e| CliError::Config(e.to_string()))?;
    powerwatch_core::metrics::describe_all();

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
        Commands::Verify(args) => commands::verify::execute(args, &loaded?, &writer).await,
        Commands::Detect(args) => commands::detect::execute(args, &loaded?, &writer).await,
        Commands::Run(args) => commands::run::execute(args, &loaded?, &writer).await,
        Commands::UserData(args) => commands::user_data::execute(args, &loaded?, &writer),
        Commands::Cases => commands::cases::execute(&loaded?, &writer),
    }
}
