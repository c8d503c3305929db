//! Treatment session recurrence.
//!
//! A recommendation becomes one treatment session per location spec and a
//! weekly series of appointments, each linked to a numbered session record.
//! Batches report partial success: failures are accumulated in a
//! [`RecurrenceOutcome`] next to everything that was created.

mod generator;
mod outcome;
mod progress;
mod types;
mod validation;

pub use generator::SessionRecurrenceGenerator;
pub use outcome::{CreatedOccurrence, FailureKind, OccurrenceFailure, RecurrenceOutcome};
pub use progress::{cancel_treatment_session, record_session_completion};
pub use types::{LightBathSpec, RodSpec, TreatmentRecommendation};
pub use validation::{check_recommendation, validate_recommendation, ValidationIssue};
