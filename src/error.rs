//! Error types for geppetto
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::core::state::State;
use crate::core::unit::UnitKind;

/// Illegal operations on the build ledger
///
/// These indicate a bug in whoever drives the ledger (normally the
/// scheduler dispatching a unit twice), never a failed build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The unit has no ledger entry
    #[error("Unit '{unit}' is not part of this run")]
    UnknownUnit { unit: String },

    /// The requested transition is not an edge of the state machine
    #[error("Cannot put unit '{unit}' into {target} state when already in {current}")]
    Illegal {
        unit: String,
        current: State,
        target: State,
    },

    /// Phase updates are only accepted while building
    #[error("Cannot record phase '{phase}' for unit '{unit}' in {current} state")]
    NotBuilding {
        unit: String,
        phase: String,
        current: State,
    },
}

/// Failures reported by a worker for the unit it was building
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// An external command exited unsuccessfully
    #[error("Command `{command}` failed: {error}\nOutput:\n{output}")]
    CommandFailed {
        command: String,
        error: String,
        output: String,
    },

    /// A manifest (package.json, Chart.yaml, go.mod) could not be used
    #[error("Invalid manifest '{path}': {error}")]
    Manifest { path: PathBuf, error: String },

    /// Filesystem error while building
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// The run was cancelled while this unit was building
    #[error("Build cancelled")]
    Cancelled,

    /// The worker panicked before reporting an outcome
    #[error("Worker panicked: {message}")]
    Panicked { message: String },
}

/// Errors running an external command
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The shell could not be started
    #[error("Failed to start `{command}`: {error}")]
    Spawn { command: String, error: String },

    /// The command exited with a non-zero status
    #[error("Command `{command}` exited with {status}")]
    Failed {
        command: String,
        status: String,
        output: String,
    },

    /// The command was interrupted by cancellation
    #[error("Command `{command}` cancelled")]
    Cancelled { command: String },
}

impl From<CommandError> for BuildError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Cancelled { .. } => Self::Cancelled,
            CommandError::Spawn { command, error } => Self::CommandFailed {
                command,
                error,
                output: String::new(),
            },
            CommandError::Failed {
                command,
                status,
                output,
            } => Self::CommandFailed {
                command,
                error: format!("exited with {status}"),
                output,
            },
        }
    }
}

/// Dependency graph validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// Circular dependency detected
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Missing dependency
    #[error("Missing dependency: '{dependency}' required by '{unit}'")]
    MissingDependency { unit: String, dependency: String },

    /// Two units share a name
    #[error("Duplicate unit name: '{name}'")]
    DuplicateUnit { name: String },
}

/// Fatal scheduler errors
///
/// Per-unit build failures never surface here; they end up in the ledger.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// No worker registered for a unit's kind
    #[error("No worker registered for unit '{unit}' of kind {kind}")]
    UnknownKind { unit: String, kind: UnitKind },

    /// The scheduler attempted an illegal ledger transition
    #[error("Scheduler bug: {0}")]
    Transition(#[from] TransitionError),

    /// The unit graph is not schedulable
    #[error("Invalid unit graph: {0}")]
    Graph(#[from] ResolverError),

    /// Every signal sender was dropped while units were still building
    #[error("Signal channel closed with {building} units still building")]
    SignalsClosed { building: usize },
}

/// Repository scanning errors
#[derive(Error, Debug)]
pub enum ScanError {
    /// Directory walk failed
    #[error("Failed to walk '{path}': {error}")]
    Walk { path: PathBuf, error: String },

    /// A recognised manifest could not be read
    #[error("Invalid manifest '{path}': {error}")]
    Manifest { path: PathBuf, error: String },
}

/// Filesystem errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilesystemError {
    /// Failed to write file
    #[error("Failed to write file '{path}': {error}")]
    WriteFile { path: PathBuf, error: String },

    /// Failed to read file
    #[error("Failed to read file '{path}': {error}")]
    ReadFile { path: PathBuf, error: String },

    /// File contents could not be parsed or serialized
    #[error("Failed to parse {format} in '{path}': {error}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        error: String,
    },
}
