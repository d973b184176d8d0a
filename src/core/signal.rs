//! Worker signal protocol
//!
//! A worker emits any number of [`Signal::Progress`] messages followed by
//! exactly one terminal signal for its unit. Workers never touch the ledger;
//! the scheduler applies signals in the order they arrive.

use tokio::sync::mpsc;

use crate::error::BuildError;

/// Message from a worker to the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    /// The unit moved to a new phase
    Progress { unit: String, phase: String },
    /// The unit's published output is already up to date
    Skip { unit: String },
    /// The unit's build failed
    Error { unit: String, error: BuildError },
    /// Every phase succeeded
    Finished { unit: String },
}

impl Signal {
    /// The unit this signal is about
    pub fn unit(&self) -> &str {
        match self {
            Self::Progress { unit, .. }
            | Self::Skip { unit }
            | Self::Error { unit, .. }
            | Self::Finished { unit } => unit,
        }
    }

    /// True for signals that end a unit's lifecycle
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }
}

/// Successful outcome of a worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// All phases ran
    Built,
    /// Nothing changed since the last publish
    Skipped,
}

impl Outcome {
    /// Terminal signal for this outcome
    pub fn into_signal(self, unit: &str) -> Signal {
        let unit = unit.to_string();
        match self {
            Self::Built => Signal::Finished { unit },
            Self::Skipped => Signal::Skip { unit },
        }
    }
}

/// Terminal signal for a worker result
pub fn terminal_signal(unit: &str, result: Result<Outcome, BuildError>) -> Signal {
    match result {
        Ok(outcome) => outcome.into_signal(unit),
        Err(error) => Signal::Error {
            unit: unit.to_string(),
            error,
        },
    }
}

/// Per-unit handle on the shared signal channel
///
/// Handed to a worker so it can report phases for the unit it is building.
#[derive(Debug, Clone)]
pub struct PhaseReporter {
    unit: String,
    sender: mpsc::Sender<Signal>,
}

impl PhaseReporter {
    /// Create a reporter for one unit
    pub fn new(unit: impl Into<String>, sender: mpsc::Sender<Signal>) -> Self {
        Self {
            unit: unit.into(),
            sender,
        }
    }

    /// Unit this reporter belongs to
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Announce the phase the worker is entering
    pub async fn phase(&self, phase: &str) {
        tracing::debug!("{} phase: {phase}", self.unit);
        let signal = Signal::Progress {
            unit: self.unit.clone(),
            phase: phase.to_string(),
        };
        // Only fails once the scheduler is gone, which makes progress moot
        let _ = self.sender.send(signal).await;
    }

    pub(crate) async fn finish(&self, result: Result<Outcome, BuildError>) {
        let signal = terminal_signal(&self.unit, result);
        if self.sender.send(signal).await.is_err() {
            tracing::warn!("Scheduler stopped before {} finished", self.unit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_signal_mapping() {
        assert_eq!(
            terminal_signal("a", Ok(Outcome::Built)),
            Signal::Finished {
                unit: "a".to_string()
            }
        );
        assert_eq!(
            terminal_signal("a", Ok(Outcome::Skipped)),
            Signal::Skip {
                unit: "a".to_string()
            }
        );

        let signal = terminal_signal("a", Err(BuildError::Cancelled));
        assert!(signal.is_terminal());
        assert_eq!(signal.unit(), "a");
    }

    #[tokio::test]
    async fn test_reporter_sends_progress_then_terminal() {
        let (tx, mut rx) = mpsc::channel(4);
        let reporter = PhaseReporter::new("a", tx);

        reporter.phase("lint").await;
        reporter.finish(Ok(Outcome::Built)).await;

        let first = rx.recv().await.unwrap();
        assert_eq!(
            first,
            Signal::Progress {
                unit: "a".to_string(),
                phase: "lint".to_string()
            }
        );
        assert!(!first.is_terminal());
        assert!(rx.recv().await.unwrap().is_terminal());
    }
}
