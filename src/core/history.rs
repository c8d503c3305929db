//! Transition history tracking.
//!
//! Each attendance record keeps an immutable trail of the lanes it moved
//! through during the day; the end-of-day wizard keeps one for its steps.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of a single state transition.
///
/// `confirmed` is set when the move needed an explicit confirmation
/// (backward moves, lane skips, replicated check-ins).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateTransition<S: State> {
    /// The state being left
    pub from: S,
    /// The state being entered
    pub to: S,
    /// When the transition happened
    pub timestamp: DateTime<Utc>,
    /// Whether the transition went through a confirmation
    pub confirmed: bool,
}

/// Ordered history of state transitions.
///
/// History is immutable: [`StateHistory::record`] returns a new history with
/// the transition appended and leaves the receiver untouched.
///
/// # Example
///
/// ```rust
/// use clinic_flow::attendance::Lane;
/// use clinic_flow::core::{StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let history = StateHistory::new().record(StateTransition {
///     from: Lane::Scheduled,
///     to: Lane::CheckedIn,
///     timestamp: Utc::now(),
///     confirmed: false,
/// });
///
/// assert_eq!(history.get_path(), vec![&Lane::Scheduled, &Lane::CheckedIn]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct StateHistory<S: State> {
    transitions: Vec<StateTransition<S>>,
}

impl<S: State> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> StateHistory<S> {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self {
            transitions: Vec::new(),
        }
    }

    /// Record a transition, returning a new history.
    pub fn record(&self, transition: StateTransition<S>) -> Self {
        let mut transitions = self.transitions.clone();
        transitions.push(transition);
        Self { transitions }
    }

    /// States traversed in order: the first `from`, then every `to`.
    pub fn get_path(&self) -> Vec<&S> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.first() {
            path.push(&first.from);
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the first and the last transition.
    ///
    /// Returns `None` when nothing was recorded.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.first(), self.transitions.last()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Number of transitions that went through a confirmation.
    pub fn confirmed_count(&self) -> usize {
        self.transitions.iter().filter(|t| t.confirmed).count()
    }

    /// All transitions in order.
    pub fn transitions(&self) -> &[StateTransition<S>] {
        &self.transitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    enum Stage {
        Waiting,
        Treating,
        Done,
    }

    impl State for Stage {
        fn name(&self) -> &str {
            match self {
                Self::Waiting => "Waiting",
                Self::Treating => "Treating",
                Self::Done => "Done",
            }
        }

        fn is_final(&self) -> bool {
            matches!(self, Self::Done)
        }
    }

    fn step(from: Stage, to: Stage, confirmed: bool) -> StateTransition<Stage> {
        StateTransition {
            from,
            to,
            timestamp: Utc::now(),
            confirmed,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<Stage> = StateHistory::new();
        assert!(history.transitions().is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
    }

    #[test]
    fn record_is_immutable() {
        let history = StateHistory::new();
        let new_history = history.record(step(Stage::Waiting, Stage::Treating, false));

        assert_eq!(history.transitions().len(), 0);
        assert_eq!(new_history.transitions().len(), 1);
    }

    #[test]
    fn get_path_returns_state_sequence() {
        let history = StateHistory::new()
            .record(step(Stage::Waiting, Stage::Treating, false))
            .record(step(Stage::Treating, Stage::Done, false));

        assert_eq!(
            history.get_path(),
            vec![&Stage::Waiting, &Stage::Treating, &Stage::Done]
        );
    }

    #[test]
    fn confirmed_transitions_are_counted() {
        let history = StateHistory::new()
            .record(step(Stage::Waiting, Stage::Treating, false))
            .record(step(Stage::Treating, Stage::Waiting, true));

        assert_eq!(history.confirmed_count(), 1);
    }

    #[test]
    fn history_serializes_correctly() {
        let history = StateHistory::new().record(step(Stage::Waiting, Stage::Treating, false));

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory<Stage> = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.get_path(), history.get_path());
    }
}
