//! List command implementation
//!
//! Implements `geppetto list` to show what a build would schedule.

use std::path::Path;

use anyhow::{Context, Result};

use crate::core::config::ProjectConfig;
use crate::core::resolver::DependencyGraph;
use crate::core::unit::Unit;
use crate::scanner::Scanner;

/// Execute the list command
pub fn execute(target: &Path, config: &ProjectConfig, json: bool) -> Result<()> {
    let units = Scanner::from_config(config)
        .scan(target)
        .with_context(|| format!("Failed to scan {}", target.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&units)?);
        return Ok(());
    }

    if units.is_empty() {
        println!("No units found in {}", target.display());
        return Ok(());
    }

    for unit in &units {
        println!("{}", format_unit(unit, target));
    }

    if let Err(e) = DependencyGraph::from_units(&units).and_then(|graph| graph.validate()) {
        println!("\nWarning: {e}");
    }
    Ok(())
}

/// `<kind> <name> (<path>) -> deps`
fn format_unit(unit: &Unit, target: &Path) -> String {
    let path = unit.path.strip_prefix(target).unwrap_or(&unit.path);
    let mut line = format!("{:<5} {} ({})", unit.kind.to_string(), unit.name, path.display());
    if unit.application {
        line.push_str(" [app]");
    }
    if !unit.depends_on.is_empty() {
        line.push_str(" -> ");
        line.push_str(&unit.depends_on.join(", "));
    }
    line
}
