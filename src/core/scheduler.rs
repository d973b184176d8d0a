//! Build scheduler
//!
//! The control loop that drives every unit from `None` to a terminal state.
//! It is the only writer of the [`Ledger`]; workers run on their own tasks
//! and talk back exclusively through the shared signal channel.
//!
//! Each iteration scans all units, dispatches the ready ones, blocks the
//! ones with a failed dependency, publishes a snapshot and then waits for
//! the next worker signal. Blocking spreads one dependency level per scan;
//! when nothing is building the loop rescans until a pass changes nothing.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::defaults::SIGNAL_CHANNEL_CAPACITY;
use crate::core::ledger::{Ledger, Readiness};
use crate::core::resolver::DependencyGraph;
use crate::core::signal::{PhaseReporter, Signal};
use crate::core::state::State;
use crate::core::unit::{Unit, UnitKind};
use crate::core::worker::{BuildContext, WorkerRegistry};
use crate::error::{BuildError, SchedulerError, TransitionError};

/// UI-facing status of one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitStatus {
    pub name: String,
    pub kind: UnitKind,
    pub state: State,
    pub phase: Option<String>,
    pub error: Option<String>,
}

/// Full progress snapshot, in unit order
pub type Snapshot = Vec<UnitStatus>;

/// Receiving end for progress snapshots
///
/// Unbounded so a slow renderer can never stall the scheduler.
pub type ProgressSender = mpsc::UnboundedSender<Snapshot>;

/// Scheduler tuning
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Maximum units building at once; `None` dispatches every ready unit
    pub max_parallel: Option<usize>,
    /// Passed through to every worker
    pub reinstall: bool,
    /// Buffer size of the worker signal channel
    pub signal_capacity: usize,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_parallel: None,
            reinstall: false,
            signal_capacity: SIGNAL_CHANNEL_CAPACITY,
        }
    }
}

/// Final outcome of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub units: Vec<UnitStatus>,
}

impl RunReport {
    /// Final state of a unit
    pub fn state_of(&self, name: &str) -> Option<State> {
        self.units.iter().find(|u| u.name == name).map(|u| u.state)
    }

    /// Number of units that ended in the given state
    pub fn count(&self, state: State) -> usize {
        self.units.iter().filter(|u| u.state == state).count()
    }

    /// True when every unit was built or skipped
    pub fn is_success(&self) -> bool {
        self.units.iter().all(|u| u.state.is_success())
    }

    /// Units that errored or were blocked
    pub fn failures(&self) -> impl Iterator<Item = &UnitStatus> {
        self.units.iter().filter(|u| u.state.is_failure())
    }
}

/// Dependency-aware build scheduler
#[derive(Debug)]
pub struct Scheduler {
    registry: WorkerRegistry,
    options: SchedulerOptions,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Create a scheduler with default options
    pub fn new(registry: WorkerRegistry) -> Self {
        Self {
            registry,
            options: SchedulerOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Set the options
    #[must_use]
    pub fn with_options(mut self, options: SchedulerOptions) -> Self {
        self.options = options;
        self
    }

    /// Token that aborts the run when cancelled
    ///
    /// Running workers see the cancellation through their context; units
    /// not yet started end up `Blocked`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Build all units, returning once every unit is terminal
    ///
    /// Per-unit failures are reported in the returned [`RunReport`]. An
    /// error is only returned for an unschedulable input (unknown kind,
    /// invalid graph) or an illegal ledger transition.
    pub async fn run(
        &self,
        units: &[Unit],
        progress: Option<&ProgressSender>,
    ) -> Result<RunReport, SchedulerError> {
        DependencyGraph::from_units(units)?.validate()?;
        if let Some(unit) = units.iter().find(|u| !self.registry.contains(u.kind)) {
            return Err(SchedulerError::UnknownKind {
                unit: unit.name.clone(),
                kind: unit.kind,
            });
        }

        let mut ledger = Ledger::new(units.iter().map(|u| u.name.clone()));
        let (signals_tx, mut signals_rx) = mpsc::channel(self.options.signal_capacity.max(1));

        // Stops in-flight workers if the loop exits early
        let cancel = self.cancel.child_token();
        let _abort_on_exit = cancel.clone().drop_guard();

        tracing::info!("Scheduling {} units", units.len());

        loop {
            let blocked = self.scan(units, &mut ledger, &signals_tx, &cancel)?;
            publish(progress, &ledger, units);

            let building = ledger.count(State::Building);
            if building == 0 {
                if blocked > 0 {
                    continue;
                }
                break;
            }
            tracing::debug!("Building {building} units");

            let Some(signal) = signals_rx.recv().await else {
                return Err(SchedulerError::SignalsClosed { building });
            };
            apply(&mut ledger, signal)?;
        }

        tracing::info!(
            "Run finished: {} built, {} skipped, {} errored, {} blocked",
            ledger.count(State::Built),
            ledger.count(State::Skipped),
            ledger.count(State::Errored),
            ledger.count(State::Blocked)
        );

        Ok(RunReport {
            units: snapshot(&ledger, units),
        })
    }

    /// One pass over all units; returns how many were blocked
    fn scan(
        &self,
        units: &[Unit],
        ledger: &mut Ledger,
        signals: &mpsc::Sender<Signal>,
        cancel: &CancellationToken,
    ) -> Result<usize, SchedulerError> {
        let mut blocked = 0;

        for unit in units {
            match ledger.can_build(&unit.name, &unit.depends_on) {
                Readiness::Waiting => {}
                Readiness::Blocked => {
                    tracing::info!("Unit blocked: {}", unit.name);
                    ledger.block(&unit.name)?;
                    blocked += 1;
                }
                Readiness::Ready if cancel.is_cancelled() => {
                    tracing::info!("Unit blocked by cancellation: {}", unit.name);
                    ledger.block(&unit.name)?;
                    blocked += 1;
                }
                Readiness::Ready => {
                    if let Some(limit) = self.options.max_parallel {
                        if ledger.count(State::Building) >= limit.max(1) {
                            continue;
                        }
                    }
                    tracing::info!("Unit building: {}", unit.name);
                    ledger.build(&unit.name)?;
                    self.dispatch(unit, signals, cancel)?;
                }
            }
        }

        Ok(blocked)
    }

    /// Spawn the worker for a unit that just entered `Building`
    fn dispatch(
        &self,
        unit: &Unit,
        signals: &mpsc::Sender<Signal>,
        cancel: &CancellationToken,
    ) -> Result<(), SchedulerError> {
        let worker = self
            .registry
            .get(unit.kind)
            .ok_or_else(|| SchedulerError::UnknownKind {
                unit: unit.name.clone(),
                kind: unit.kind,
            })?;

        let ctx = BuildContext {
            reinstall: self.options.reinstall,
            cancel: cancel.child_token(),
            progress: PhaseReporter::new(unit.name.clone(), signals.clone()),
        };
        let unit = unit.clone();

        tokio::spawn(async move {
            let result = AssertUnwindSafe(worker.build(&unit, &ctx))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| {
                    Err(BuildError::Panicked {
                        message: panic_message(panic.as_ref()),
                    })
                });
            ctx.progress.finish(result).await;
        });

        Ok(())
    }
}

/// Apply one worker signal to the ledger
fn apply(ledger: &mut Ledger, signal: Signal) -> Result<(), TransitionError> {
    let current = ledger.get_state(signal.unit());
    if signal.is_terminal() && current != State::Building {
        // A terminal signal for a unit nobody dispatched means double dispatch
        return Err(TransitionError::Illegal {
            unit: signal.unit().to_string(),
            current,
            target: match &signal {
                Signal::Skip { .. } => State::Skipped,
                Signal::Error { .. } => State::Errored,
                _ => State::Built,
            },
        });
    }

    match signal {
        Signal::Progress { unit, phase } => ledger.progress(&unit, &phase),
        Signal::Skip { unit } => {
            tracing::info!("Skipping unit: {unit}");
            ledger.skip(&unit)
        }
        Signal::Error { unit, error } => {
            tracing::error!("Failed to build {unit}: {error}");
            ledger.error(&unit, error)
        }
        Signal::Finished { unit } => {
            tracing::info!("Finished building unit: {unit}");
            ledger.complete(&unit)
        }
    }
}

fn snapshot(ledger: &Ledger, units: &[Unit]) -> Snapshot {
    units
        .iter()
        .filter_map(|unit| {
            ledger.entry(&unit.name).map(|entry| UnitStatus {
                name: entry.name.clone(),
                kind: unit.kind,
                state: entry.state,
                phase: entry.phase.clone(),
                error: entry.error.as_ref().map(ToString::to_string),
            })
        })
        .collect()
}

fn publish(progress: Option<&ProgressSender>, ledger: &Ledger, units: &[Unit]) {
    if let Some(tx) = progress {
        if tx.send(snapshot(ledger, units)).is_err() {
            tracing::trace!("Progress receiver dropped");
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
