//! Build unit descriptors

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The toolchain that builds a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// NPM package (`package.json`)
    Npm,
    /// Go module (`go.mod`)
    Go,
    /// Helm chart (`Chart.yaml`)
    Helm,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Npm => "NPM",
            Self::Go => "Go",
            Self::Helm => "Helm",
        };
        f.write_str(name)
    }
}

/// One independently buildable artifact, immutable for a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unique name
    pub name: String,
    /// Selects the worker
    pub kind: UnitKind,
    /// Directory holding the unit's sources
    pub path: PathBuf,
    /// Names of units that must succeed before this one starts
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Built as an application rather than published as a library
    #[serde(default)]
    pub application: bool,
}

impl Unit {
    /// Create a unit with no dependencies
    pub fn new(name: impl Into<String>, kind: UnitKind, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            path: path.into(),
            depends_on: Vec::new(),
            application: false,
        }
    }

    /// Set the dependencies
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the unit as an application
    #[must_use]
    pub fn as_application(mut self) -> Self {
        self.application = true;
        self
    }
}
