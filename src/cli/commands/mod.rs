//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod list;

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use crate::cli::output::OutputConfig;
use crate::core::config::ProjectConfig;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build every unit in dependency order
    Build {
        /// Maximum number of units building at once
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Reinstall dependencies before building
        #[arg(short, long)]
        reinstall: bool,

        /// Print the final unit states as JSON
        #[arg(long)]
        json: bool,
    },

    /// List discovered units and their dependencies
    List {
        /// Output in JSON format for scripting
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Execute the command against a target directory
    pub async fn run(
        self,
        target: &Path,
        config_path: Option<&Path>,
        output: OutputConfig,
    ) -> Result<bool> {
        let config = load_config(target, config_path)?;
        match self {
            Self::Build {
                jobs,
                reinstall,
                json,
            } => {
                let options = build::BuildOptions {
                    jobs,
                    reinstall,
                    json,
                };
                build::execute(target, &config, options, output).await
            }
            Self::List { json } => list::execute(target, &config, json).map(|()| true),
        }
    }
}

/// Load the project config, from `config_path` when given
pub fn load_config(target: &Path, config_path: Option<&Path>) -> Result<ProjectConfig> {
    let config = match config_path {
        Some(path) if !path.exists() => bail!("Config file {} not found", path.display()),
        Some(path) => ProjectConfig::load_from_path(path),
        None => ProjectConfig::load(target),
    };
    config.with_context(|| format!("Failed to load configuration for {}", target.display()))
}
