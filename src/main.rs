//! Main entry point for the encunzip CLI application.

use anyhow::Result;
use clap::Parser;

use encunzip::Cli;

/// Application entry point.
///
/// Parses command-line arguments, validates them (codecs included) before
/// anything touches the filesystem, then runs the requested operation.
/// Any error ends the process with a non-zero exit code.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let invocation = cli.invocation()?;
    encunzip::run(&invocation).await
}
