//! Geppetto CLI - dependency-aware monorepo builder
//!
//! Entry point for the geppetto command-line application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use geppetto::cli::output::display_error;
use geppetto::cli::Cli;
use geppetto::config::defaults::EXIT_UNITS_FAILED;
use geppetto::core::version;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output_config = cli.output();

    // RUST_LOG overrides the -v/-q derived level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(output_config.log_level().into()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("geppetto {}", version::long_version());

    // Run the command and handle errors
    match cli.run().await {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(EXIT_UNITS_FAILED),
        Err(e) => {
            display_error(&e);
            std::process::exit(1);
        }
    }
}
