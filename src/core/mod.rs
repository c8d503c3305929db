//! Core state machine types.
//!
//! - State definitions via the `State` trait
//! - Immutable history tracking
//!
//! Everything here is pure; side effects live in the collaborator traits of
//! [`crate::api`].

mod history;
mod state;

pub use history::{StateHistory, StateTransition};
pub use state::State;
