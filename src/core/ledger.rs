//! Build ledger
//!
//! The in-memory table of per-unit build state for one run. Entries are
//! created at [`State::None`] and only ever move along the edges of the
//! state machine; an operation whose precondition fails returns an error
//! and leaves the ledger untouched.

use crate::core::state::State;
use crate::error::{BuildError, TransitionError};

/// Ledger record for one unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Unit name
    pub name: String,
    /// Current lifecycle state
    pub state: State,
    /// Current sub-step while building
    pub phase: Option<String>,
    /// Failure, only present when errored
    pub error: Option<BuildError>,
}

impl LedgerEntry {
    fn new(name: String) -> Self {
        Self {
            name,
            state: State::None,
            phase: None,
            error: None,
        }
    }
}

/// Answer of the readiness predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Pending and every dependency succeeded
    Ready,
    /// Pending and at least one dependency failed
    Blocked,
    /// Already dispatched or finished, or a dependency is undecided
    Waiting,
}

impl Readiness {
    /// The `ready` half of the `(ready, blocked)` pair
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }

    /// The `blocked` half of the `(ready, blocked)` pair
    pub fn is_blocked(self) -> bool {
        self == Self::Blocked
    }
}

/// Ordered collection of unit states for one run
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Create a ledger with one pending entry per name
    ///
    /// Repeated names keep a single entry at the first position.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entries: Vec<LedgerEntry> = Vec::new();
        for name in names {
            let name = name.into();
            if !entries.iter().any(|e| e.name == name) {
                entries.push(LedgerEntry::new(name));
            }
        }
        Self { entries }
    }

    /// All entries in creation order
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Look up a unit's entry
    pub fn entry(&self, name: &str) -> Option<&LedgerEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// State of a unit; unknown units report [`State::None`]
    pub fn get_state(&self, name: &str) -> State {
        self.entry(name).map_or(State::None, |e| e.state)
    }

    /// Number of units in the given state
    pub fn count(&self, state: State) -> usize {
        self.entries.iter().filter(|e| e.state == state).count()
    }

    /// `None` -> `Building`
    pub fn build(&mut self, name: &str) -> Result<(), TransitionError> {
        self.transition(name, State::Building).map(|_| ())
    }

    /// `None | Building` -> `Built`
    pub fn complete(&mut self, name: &str) -> Result<(), TransitionError> {
        self.transition(name, State::Built).map(|_| ())
    }

    /// `None | Building` -> `Blocked`
    pub fn block(&mut self, name: &str) -> Result<(), TransitionError> {
        self.transition(name, State::Blocked).map(|_| ())
    }

    /// `None | Building` -> `Skipped`
    pub fn skip(&mut self, name: &str) -> Result<(), TransitionError> {
        self.transition(name, State::Skipped).map(|_| ())
    }

    /// `None | Building` -> `Errored`, retaining the failure
    pub fn error(&mut self, name: &str, error: BuildError) -> Result<(), TransitionError> {
        let entry = self.transition(name, State::Errored)?;
        entry.error = Some(error);
        Ok(())
    }

    /// Record the current phase of a building unit
    pub fn progress(&mut self, name: &str, phase: &str) -> Result<(), TransitionError> {
        let entry = self.entry_mut(name)?;
        if entry.state != State::Building {
            return Err(TransitionError::NotBuilding {
                unit: name.to_string(),
                phase: phase.to_string(),
                current: entry.state,
            });
        }
        entry.phase = Some(phase.to_string());
        Ok(())
    }

    /// Readiness predicate
    ///
    /// A failed dependency wins over an undecided one, so the answer does
    /// not depend on the order of `dependencies`.
    pub fn can_build(&self, name: &str, dependencies: &[String]) -> Readiness {
        let state = self.get_state(name);
        if state != State::None {
            tracing::trace!("Not building {name} because state is {state}");
            return Readiness::Waiting;
        }

        let mut waiting = false;
        for dep in dependencies {
            let dep_state = self.get_state(dep);
            if dep_state.is_failure() {
                tracing::debug!("Blocking {name} because dependency {dep} is {dep_state}");
                return Readiness::Blocked;
            }
            if !dep_state.is_success() {
                tracing::trace!("Not building {name} because dependency {dep} is {dep_state}");
                waiting = true;
            }
        }

        if waiting {
            Readiness::Waiting
        } else {
            Readiness::Ready
        }
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut LedgerEntry, TransitionError> {
        self.entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| TransitionError::UnknownUnit {
                unit: name.to_string(),
            })
    }

    fn transition(
        &mut self,
        name: &str,
        target: State,
    ) -> Result<&mut LedgerEntry, TransitionError> {
        let entry = self.entry_mut(name)?;
        if !entry.state.can_transition_to(target) {
            return Err(TransitionError::Illegal {
                unit: name.to_string(),
                current: entry.state,
                target,
            });
        }
        entry.state = target;
        if target.is_terminal() {
            entry.phase = None;
        }
        Ok(entry)
    }
}
