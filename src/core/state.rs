//! Build unit lifecycle states
//!
//! A unit starts at [`State::None`], enters [`State::Building`] at most once
//! and ends the run in exactly one terminal state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle state of a single build unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum State {
    /// Pending, not yet dispatched
    #[default]
    None,
    /// A worker is currently building the unit
    Building,
    /// The unit's own build failed
    Errored,
    /// A dependency failed, so the unit was never built
    Blocked,
    /// The unit built successfully
    Built,
    /// The unit's output was already up to date
    Skipped,
}

impl State {
    /// All states, in lifecycle order
    pub const ALL: [State; 6] = [
        State::None,
        State::Building,
        State::Errored,
        State::Blocked,
        State::Built,
        State::Skipped,
    ];

    /// True once the unit's outcome for the run is decided
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Errored | Self::Blocked | Self::Built | Self::Skipped
        )
    }

    /// True for outcomes that satisfy dependents
    pub fn is_success(self) -> bool {
        matches!(self, Self::Built | Self::Skipped)
    }

    /// True for outcomes that block dependents
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Errored | Self::Blocked)
    }

    /// Whether the state machine has an edge from `self` to `target`
    pub fn can_transition_to(self, target: State) -> bool {
        match target {
            Self::None => false,
            Self::Building => self == Self::None,
            Self::Errored | Self::Blocked | Self::Built | Self::Skipped => {
                matches!(self, Self::None | Self::Building)
            }
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Building => "Building",
            Self::Errored => "Errored",
            Self::Blocked => "Blocked",
            Self::Built => "Built",
            Self::Skipped => "Skipped",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_partition_into_success_and_failure() {
        for state in State::ALL {
            if state.is_terminal() {
                assert_ne!(state.is_success(), state.is_failure(), "{state}");
            } else {
                assert!(!state.is_success() && !state.is_failure(), "{state}");
            }
        }
    }

    #[test]
    fn test_no_edge_between_terminal_states() {
        for from in State::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in State::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_nothing_reenters_none() {
        for from in State::ALL {
            assert!(!from.can_transition_to(State::None));
        }
    }

    #[test]
    fn test_building_only_from_none() {
        assert!(State::None.can_transition_to(State::Building));
        assert!(!State::Building.can_transition_to(State::Building));
    }

    #[test]
    fn test_skip_allowed_before_and_during_build() {
        assert!(State::None.can_transition_to(State::Skipped));
        assert!(State::Building.can_transition_to(State::Skipped));
    }
}
