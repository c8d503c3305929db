//! Daily attendance board and its progression rules.
//!
//! - [`AttendanceBoard`]: per-date aggregate, partitioned by type and lane
//! - [`ProgressionStateMachine`]: the only writer of the board
//! - [`ExternalCheckInMerger`]: folds walk-ins into `checkedIn` lanes
//! - selectors: flat, type-tagged read views

mod board;
mod checkin;
mod progression;
mod selectors;
mod sync;
mod types;

pub use board::{AttendanceBoard, TypeLanes};
pub use checkin::{ExternalCheckIn, ExternalCheckInMerger, MergeOutcome};
pub use progression::{
    Confirmation, Decision, LaneChange, MoveOutcome, PendingMove, ProgressionStateMachine,
};
pub use selectors::{
    get_completed_attendances, get_incomplete_attendances, get_scheduled_absences, AttendanceKey,
    TaggedAttendance,
};
pub use sync::{sync_lane_changes, SyncFailure};
pub use types::{AttendanceRecord, AttendanceType, Lane, LaneTimes, Movement, Priority};
