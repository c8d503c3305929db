//! Crate-level error taxonomy.

use crate::attendance::{AttendanceType, Lane};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced to callers of the engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClinicError {
    /// A precondition failed before any side effect took place.
    #[error("{message}")]
    Validation { message: String },

    /// The backend rejected an appointment (e.g. the slot is taken).
    #[error("{0}")]
    Conflict(String),

    /// The appointment exists but could not be linked to its session.
    #[error("{0}")]
    Link(String),

    #[error(transparent)]
    State(#[from] StateError),

    /// Several failures collected over one batch, one per line.
    #[error("{0}")]
    Aggregate(String),

    #[error("Backend error: {0}")]
    Backend(String),

    /// A wizard step cannot be left yet.
    #[error("{0}")]
    Gate(String),
}

/// Actions that cannot apply to the current board.
///
/// These are logged and treated as no-ops by the progression machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Day {date} is finalized; board is read-only")]
    DayFinalized { date: NaiveDate },

    #[error("No {attendance_type:?} record for '{name}' in lane {lane:?}")]
    RecordNotFound {
        attendance_type: AttendanceType,
        name: String,
        lane: Option<Lane>,
    },

    #[error("Another move is waiting for confirmation")]
    ConfirmationPending,

    #[error("Nothing is waiting for confirmation")]
    NothingToConfirm,

    #[error("Finalization already in progress")]
    SubmissionInFlight,

    #[error("Workflow is for {workflow} but the board holds {board}")]
    DateMismatch { workflow: NaiveDate, board: NaiveDate },
}
