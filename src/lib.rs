//! Clinic Flow: attendance progression and day closing for treatment clinics
//!
//! A day's patients sit on an [`attendance::AttendanceBoard`], one set of
//! lanes per attendance type. The board only changes through the
//! [`attendance::ProgressionStateMachine`], a pure core that returns the lane
//! changes it applied; syncing those changes with the backend is the caller's
//! imperative shell.
//!
//! # Core Concepts
//!
//! - **Lanes**: `scheduled → checkedIn → onGoing → completed`, one lane per
//!   patient and type
//! - **Confirmations**: skips, backward moves and replicated check-ins wait
//!   for an explicit accept or decline
//! - **Recurrence**: a treatment recommendation becomes weekly appointments
//!   linked to numbered session records
//! - **End of day**: a gated three-step wizard that closes absences and
//!   locks the day
//!
//! # Example
//!
//! ```rust
//! use clinic_flow::attendance::{
//!     AttendanceBoard, AttendanceRecord, AttendanceType, Lane, MoveOutcome, Priority,
//!     ProgressionStateMachine,
//! };
//! use chrono::NaiveDate;
//!
//! let date = NaiveDate::from_ymd_opt(2025, 9, 17).unwrap();
//! let mut machine = ProgressionStateMachine::new(AttendanceBoard::new(date));
//! machine.schedule(AttendanceRecord::scheduled(
//!     "Ana",
//!     Priority::Standard,
//!     AttendanceType::Spiritual,
//! ));
//!
//! let outcome = machine.request_move(AttendanceType::Spiritual, "Ana", Lane::CheckedIn);
//! assert!(outcome.is_applied());
//!
//! // Skipping a lane needs confirmation
//! let outcome = machine.request_move(AttendanceType::Spiritual, "Ana", Lane::Completed);
//! assert!(matches!(outcome, MoveOutcome::AwaitingConfirmation));
//! ```

pub mod api;
pub mod attendance;
pub mod config;
pub mod core;
pub mod error;
pub mod finalization;
pub mod recurrence;
pub mod snapshot;
pub mod workflow;

// Re-export commonly used types
pub use attendance::{AttendanceBoard, AttendanceType, Lane, ProgressionStateMachine};
pub use config::ClinicConfig;
pub use core::{State, StateHistory, StateTransition};
pub use error::{ClinicError, StateError};
pub use finalization::DayFinalizationStore;
pub use recurrence::SessionRecurrenceGenerator;
pub use workflow::EndOfDayWorkflow;
