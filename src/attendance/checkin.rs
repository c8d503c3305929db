//! Merging unscheduled walk-ins into the board.

use crate::attendance::progression::{LaneChange, ProgressionStateMachine};
use crate::attendance::types::{AttendanceType, Priority};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A check-in coming from outside the board (reception desk, kiosk).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCheckIn {
    pub name: String,
    pub types: Vec<AttendanceType>,
    pub priority: Option<Priority>,
}

impl ExternalCheckIn {
    fn fingerprint(&self, default_priority: Priority) -> CheckInFingerprint {
        let mut types = self.types.clone();
        types.sort();
        types.dedup();
        CheckInFingerprint {
            name: self.name.clone(),
            types,
            priority: self.priority.unwrap_or(default_priority),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CheckInFingerprint {
    name: String,
    types: Vec<AttendanceType>,
    priority: Priority,
}

/// What a merge call did.
#[derive(Clone, Debug, PartialEq)]
pub enum MergeOutcome {
    /// Lane changes applied for this event (possibly none).
    Merged(Vec<LaneChange>),
    /// This event was already merged earlier.
    AlreadyProcessed,
}

/// Folds walk-ins into `checkedIn` lanes, once per event.
#[derive(Debug)]
pub struct ExternalCheckInMerger {
    default_priority: Priority,
    processed: HashSet<CheckInFingerprint>,
}

impl Default for ExternalCheckInMerger {
    fn default() -> Self {
        Self::new(Priority::Standard)
    }
}

impl ExternalCheckInMerger {
    pub fn new(default_priority: Priority) -> Self {
        Self {
            default_priority,
            processed: HashSet::new(),
        }
    }

    pub fn merge(
        &mut self,
        machine: &mut ProgressionStateMachine,
        check_in: &ExternalCheckIn,
    ) -> MergeOutcome {
        let fingerprint = check_in.fingerprint(self.default_priority);
        if self.processed.contains(&fingerprint) {
            debug!(name = %check_in.name, "Walk-in already merged");
            return MergeOutcome::AlreadyProcessed;
        }

        let mut changes = Vec::new();
        for attendance_type in &fingerprint.types {
            let outcome = machine.check_in(*attendance_type, &check_in.name, fingerprint.priority);
            changes.extend_from_slice(outcome.changes());
        }

        // A finalized day merges nothing; the event may be retried after reopening.
        if !machine.is_finalized() {
            self.processed.insert(fingerprint);
        }
        MergeOutcome::Merged(changes)
    }

    /// Forget merged events, e.g. when the board switches to another date.
    pub fn reset(&mut self) {
        self.processed.clear();
    }
}
