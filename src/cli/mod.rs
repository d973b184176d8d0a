//! Command-line interface module
//!
//! This module handles argument parsing and output formatting.
//! It contains no business logic - that belongs in the [`crate::core`] module.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use commands::Commands;
use output::OutputConfig;

/// Geppetto - dependency-aware builder for NPM, Helm and Go monorepos
///
/// Scans a directory for packages, charts and modules and builds them in
/// dependency order, as many at once as the graph allows.
#[derive(Parser, Debug)]
#[command(name = "geppetto")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Directory to scan for units
    #[arg(short, long, global = true, env = "GEPPETTO_TARGET", default_value = ".")]
    pub target: PathBuf,

    /// Config file (defaults to <target>/.geppetto.toml)
    #[arg(short, long, global = true, env = "GEPPETTO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Output settings derived from the global flags
    pub fn output(&self) -> OutputConfig {
        OutputConfig::new(self.quiet, self.verbose)
    }

    /// Execute the CLI command
    ///
    /// Returns `Ok(false)` when the command ran but some unit failed.
    pub async fn run(self) -> Result<bool> {
        let output = self.output();
        if let Some(cmd) = self.command {
            cmd.run(&self.target, self.config.as_deref(), output).await
        } else {
            // No subcommand provided, show help
            use clap::CommandFactory;
            let mut cmd = Self::command();
            cmd.print_help()?;
            Ok(true)
        }
    }
}
