//! aniwatch - how many episodes of that anime are actually out?
//!
//! # Usage
//!
//! ```bash
//! aniwatch search "frieren"
//! aniwatch episodes 52991
//! aniwatch episodes 21 52991 --json
//! aniwatch available 52991
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use aniwatch::cli::{Cli, Command, ExitCode, Output};
use aniwatch::commands;
use aniwatch::config::Config;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    run_cli(cli).await.into()
}

/// Log to stderr; RUST_LOG wins over the -v/-q flags
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli) -> ExitCode {
    let output = Output::new(&cli);
    let config = match &cli.config {
        Some(path) => match Config::load_from(path) {
            Ok(config) => config,
            Err(e) => return output.error(format!("{:#}", e), ExitCode::InvalidArgs),
        },
        None => Config::load(),
    };

    match cli.command {
        Command::Search(cmd) => commands::search_cmd(cmd, &config, &output).await,
        Command::Episodes(cmd) => commands::episodes_cmd(cmd, &config, &output).await,
        Command::Available(cmd) => commands::available_cmd(cmd, &config, &output).await,
        Command::Overrides(cmd) => commands::overrides_cmd(cmd, &config, &output).await,
    }
}
