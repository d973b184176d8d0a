//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying the live build progress,
//! the final summary and error chains.

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::scheduler::{RunReport, Snapshot};
use crate::core::state::State;

/// Output settings from the global flags
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Suppress everything except errors
    pub quiet: bool,
    /// Verbosity level (-v count)
    pub verbose: u8,
}

impl OutputConfig {
    pub fn new(quiet: bool, verbose: u8) -> Self {
        Self { quiet, verbose }
    }

    /// Log filter directive for these settings
    pub fn log_level(&self) -> tracing::Level {
        match (self.quiet, self.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, _) => tracing::Level::DEBUG,
        }
    }

    /// Whether to draw a live progress bar
    ///
    /// Verbose runs print logs instead, which would tear the bar.
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.verbose == 0
    }
}

/// Create a progress bar for a build run
pub fn create_build_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} units {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb
}

/// Update a build bar from a snapshot
pub fn render_snapshot(bar: &ProgressBar, snapshot: &Snapshot) {
    let done = snapshot.iter().filter(|u| u.state.is_terminal()).count();
    bar.set_position(done.try_into().unwrap_or(u64::MAX));
    bar.set_message(building_message(snapshot));
}

/// `name (phase)` for every building unit
pub fn building_message(snapshot: &Snapshot) -> String {
    snapshot
        .iter()
        .filter(|u| u.state == State::Building)
        .map(|u| match &u.phase {
            Some(phase) => format!("{} ({phase})", u.name),
            None => u.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Icon shown next to a unit in the summary
pub fn state_icon(state: State) -> &'static str {
    match state {
        State::Built => status::SUCCESS,
        State::Skipped => status::SKIPPED,
        State::Errored => status::ERROR,
        State::Blocked => status::WARNING,
        State::None | State::Building => status::INFO,
    }
}

/// Final summary: one line per unit, then the error text of failed units
pub fn format_summary(report: &RunReport) -> String {
    let mut out = String::new();

    for unit in &report.units {
        out.push_str(&format!(
            "{} {:<6} {} ({})\n",
            state_icon(unit.state),
            unit.kind.to_string(),
            unit.name,
            unit.state
        ));
    }

    for unit in &report.units {
        if let Some(error) = &unit.error {
            out.push_str(&format!("\n{} {}:\n{error}\n", status::ERROR, unit.name));
        }
    }

    out.push_str(&format!(
        "\n{} built, {} skipped, {} errored, {} blocked\n",
        report.count(State::Built),
        report.count(State::Skipped),
        report.count(State::Errored),
        report.count(State::Blocked)
    ));
    out
}

/// Print an error with its cause chain to stderr
pub fn display_error(err: &anyhow::Error) {
    eprintln!("{} Error: {err}", status::ERROR);
    for cause in err.chain().skip(1) {
        eprintln!("  Caused by: {cause}");
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Skipped prefix
    pub const SKIPPED: &str = "↷";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
