//! Rateguard CLI binary entry point.

use std::process::ExitCode;

use clap::Parser;
use rateguard::cli::{Cli, Commands};
use rateguard::error::RateguardError;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Parse(args) => rateguard::cli::handle_parse(args),
        Commands::Render(args) => rateguard::cli::handle_render(args),
    };

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(RateguardError::Parse(e)) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
