//! End-of-day finalization wizard.
//!
//! Reads the board through the attendance selectors, gates each step with
//! accumulated validation, and locks the day through the finalization store.

mod gate;
mod step;
mod summary;
mod wizard;

pub use gate::{check_gate, GateInput, GateViolation};
pub use step::WorkflowStep;
pub use summary::{AbsenceJustification, CompletionSummary, DayPreview, MissedAttendance};
pub use wizard::EndOfDayWorkflow;
