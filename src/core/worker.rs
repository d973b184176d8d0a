//! Worker boundary
//!
//! One [`Worker`] implementation exists per [`UnitKind`]. The scheduler looks
//! workers up in a [`WorkerRegistry`], so new unit types plug in without
//! touching the scheduling loop.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::signal::{Outcome, PhaseReporter};
use crate::core::unit::{Unit, UnitKind};
use crate::error::BuildError;

/// Everything a worker receives besides the unit itself
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Run install phases (dependency refresh) before building
    pub reinstall: bool,
    /// Cancelled when the run is aborted
    pub cancel: CancellationToken,
    /// Phase reporting for this unit
    pub progress: PhaseReporter,
}

/// Builds units of one kind
///
/// Implementations report phases through [`BuildContext::progress`] and
/// return the outcome; the scheduler turns the returned value into the
/// unit's single terminal signal.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Build one unit to completion
    async fn build(&self, unit: &Unit, ctx: &BuildContext) -> Result<Outcome, BuildError>;
}

/// Registry of workers (kind -> worker)
///
/// Filled during initialization and read-only once a run starts.
#[derive(Default, Clone)]
pub struct WorkerRegistry {
    workers: HashMap<UnitKind, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the worker for a kind, returning any worker it replaces
    pub fn register(&mut self, kind: UnitKind, worker: Arc<dyn Worker>) -> Option<Arc<dyn Worker>> {
        self.workers.insert(kind, worker)
    }

    /// Builder-style registration
    #[must_use]
    pub fn with(mut self, kind: UnitKind, worker: Arc<dyn Worker>) -> Self {
        self.register(kind, worker);
        self
    }

    /// Worker for a kind
    pub fn get(&self, kind: UnitKind) -> Option<Arc<dyn Worker>> {
        self.workers.get(&kind).cloned()
    }

    /// Whether a worker is registered for the kind
    pub fn contains(&self, kind: UnitKind) -> bool {
        self.workers.contains_key(&kind)
    }

    /// Registered kinds, sorted
    pub fn kinds(&self) -> Vec<UnitKind> {
        let mut kinds: Vec<UnitKind> = self.workers.keys().copied().collect();
        kinds.sort();
        kinds
    }
}

impl fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
