//! Build command implementation
//!
//! Implements `geppetto build`: scan the target, schedule every unit and
//! render progress until the run settles.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use crate::cli::output::{self, OutputConfig};
use crate::core::config::ProjectConfig;
use crate::core::scheduler::{Scheduler, SchedulerOptions, Snapshot};
use crate::infra::commander::ShellRunner;
use crate::scanner::Scanner;
use crate::workers;

/// Build options
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Number of units building at once
    pub jobs: Option<usize>,
    /// Run install phases
    pub reinstall: bool,
    /// Print the final snapshot as JSON
    pub json: bool,
}

/// Execute the build command
///
/// Returns whether every unit was built or skipped.
pub async fn execute(
    target: &Path,
    config: &ProjectConfig,
    options: BuildOptions,
    output: OutputConfig,
) -> Result<bool> {
    let units = Scanner::from_config(config)
        .scan(target)
        .with_context(|| format!("Failed to scan {}", target.display()))?;

    if units.is_empty() {
        if !output.quiet && !options.json {
            println!("No units found in {}", target.display());
        }
        return Ok(true);
    }

    let registry = workers::default_registry(config, target, Arc::new(ShellRunner));
    let scheduler = Scheduler::new(registry).with_options(SchedulerOptions {
        max_parallel: options.jobs.or(config.build.jobs),
        reinstall: options.reinstall || config.reinstall(),
        ..SchedulerOptions::default()
    });

    let cancel = scheduler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling build");
            cancel.cancel();
        }
    });

    let show_progress = output.show_progress() && !options.json;
    let (progress_tx, renderer) = if show_progress {
        let (tx, rx) = mpsc::unbounded_channel();
        let bar = output::create_build_bar(units.len().try_into().unwrap_or(u64::MAX));
        (Some(tx), Some(tokio::spawn(render(bar, rx))))
    } else {
        (None, None)
    };

    let result = scheduler.run(&units, progress_tx.as_ref()).await;
    drop(progress_tx);
    if let Some(renderer) = renderer {
        renderer.await.context("Progress renderer failed")?;
    }
    let report = result.context("Build failed")?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report.units)?);
    } else if !output.quiet {
        print!("{}", output::format_summary(&report));
    }

    Ok(report.is_success())
}

async fn render(bar: indicatif::ProgressBar, mut rx: mpsc::UnboundedReceiver<Snapshot>) {
    while let Some(snapshot) = rx.recv().await {
        output::render_snapshot(&bar, &snapshot);
    }
    bar.finish_and_clear();
}
