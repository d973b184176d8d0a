//! Unit discovery
//!
//! Walks a directory tree and turns every directory holding a recognised
//! manifest into a [`Unit`]. Classification stops descent, so nested
//! manifests (vendored packages, sub-charts) belong to their parent.
//! Dependencies are linked only between units of the same kind.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::config::ProjectConfig;
use crate::core::unit::{Unit, UnitKind};
use crate::error::{BuildError, ScanError};
use crate::infra::{golang, helm, npm};

/// A classified directory before dependency linking
#[derive(Debug)]
struct Discovered {
    unit: Unit,
    wanted: Vec<String>,
}

/// Directory scanner
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    ignored: Vec<String>,
    exclude: Vec<String>,
}

impl Scanner {
    /// Scanner skipping directories named in `ignored`
    pub fn new(ignored: Vec<String>) -> Self {
        Self {
            ignored,
            exclude: Vec::new(),
        }
    }

    /// Scanner configured from `.geppetto.toml`
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self::new(config.ignored_dirs()).exclude(config.units.exclude.clone())
    }

    /// Drop units with these names; edges to them are dropped too
    #[must_use]
    pub fn exclude(mut self, names: Vec<String>) -> Self {
        self.exclude = names;
        self
    }

    fn is_ignored(&self, name: &str) -> bool {
        self.ignored.iter().any(|i| i == name)
    }

    /// Find and link every unit below `root`, in directory order
    pub fn scan(&self, root: &Path) -> Result<Vec<Unit>, ScanError> {
        let mut found = Vec::new();

        let mut walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !self.is_ignored(&e.file_name().to_string_lossy())
            });

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| ScanError::Walk {
                path: e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf),
                error: e.to_string(),
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }

            if let Some(discovered) = classify(entry.path())? {
                tracing::info!(
                    "{}: {} ({})",
                    discovered.unit.kind,
                    discovered.unit.name,
                    entry.path().display()
                );
                found.push(discovered);
                walker.skip_current_dir();
            } else {
                tracing::debug!("Unrecognised: {}", entry.path().display());
            }
        }

        found.retain(|d| {
            let keep = !self.exclude.contains(&d.unit.name);
            if !keep {
                tracing::info!("Excluding unit {}", d.unit.name);
            }
            keep
        });

        Ok(link(found))
    }
}

/// Classify a directory by the manifest it holds
fn classify(dir: &Path) -> Result<Option<Discovered>, ScanError> {
    let manifest_error = |path: PathBuf| move |e: BuildError| ScanError::Manifest {
        path,
        error: e.to_string(),
    };

    if dir.join(helm::MANIFEST).is_file() {
        let chart = helm::read_chart(dir).map_err(manifest_error(dir.join(helm::MANIFEST)))?;
        return Ok(Some(Discovered {
            wanted: chart.local_dependencies(),
            unit: Unit::new(chart.name, UnitKind::Helm, dir),
        }));
    }

    if dir.join(npm::MANIFEST).is_file() {
        let package = npm::read_package(dir).map_err(manifest_error(dir.join(npm::MANIFEST)))?;
        let mut unit = Unit::new(package.name.clone(), UnitKind::Npm, dir);
        unit.application = package.is_application();
        return Ok(Some(Discovered {
            wanted: package.dependency_names(),
            unit,
        }));
    }

    if dir.join(golang::MANIFEST).is_file() {
        let module =
            golang::read_go_mod(dir).map_err(manifest_error(dir.join(golang::MANIFEST)))?;
        let mut unit = Unit::new(module.module, UnitKind::Go, dir);
        unit.application = dir.join(golang::MAIN_FILE).is_file();
        return Ok(Some(Discovered {
            wanted: module.requires,
            unit,
        }));
    }

    Ok(None)
}

/// Resolve wanted names against units of the same kind
fn link(found: Vec<Discovered>) -> Vec<Unit> {
    let known: BTreeSet<(UnitKind, String)> = found
        .iter()
        .map(|d| (d.unit.kind, d.unit.name.clone()))
        .collect();

    found
        .into_iter()
        .map(|Discovered { mut unit, wanted }| {
            let mut seen = BTreeSet::new();
            unit.depends_on = wanted
                .into_iter()
                .filter(|name| *name != unit.name)
                .filter(|name| known.contains(&(unit.kind, name.clone())))
                .filter(|name| seen.insert(name.clone()))
                .collect();
            if !unit.depends_on.is_empty() {
                tracing::debug!("Dependencies for {}: {:?}", unit.name, unit.depends_on);
            }
            unit
        })
        .collect()
}
