//! Voltlearn CLI - Command-line interface
//!
//! Provides command-line access to the Voltlearn catalog and playback core.

mod commands;

use clap::Parser;
use voltlearn_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "voltlearn")]
#[command(about = "EV & electrical-safety training content tools")]
struct Cli {
    /// Console log level
    #[arg(long, value_enum, default_value_t = CliLogLevel::Warn)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), None)?;

    commands::handle_command(cli.command).await?;

    Ok(())
}
