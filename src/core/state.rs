//! State trait shared by every state machine in the crate.
//!
//! Attendance lanes and end-of-day wizard steps both implement this trait,
//! which gives them a stable display name and terminal/error markers that the
//! history and logging code can rely on without knowing the concrete type.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for state machine states.
///
/// All methods are pure. States are small immutable values describing where
/// something currently sits: a patient's lane, or the wizard's step.
///
/// # Required Traits
///
/// - `Clone`: states are copied into history records
/// - `PartialEq`: transition logic compares states
/// - `Debug`: diagnostics and tracing fields
/// - `Serialize` + `Deserialize`: board snapshots persist history
///
/// # Example
///
/// ```rust
/// use clinic_flow::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum RoomState {
///     Free,
///     Occupied,
///     Closed,
/// }
///
/// impl State for RoomState {
///     fn name(&self) -> &str {
///         match self {
///             Self::Free => "Free",
///             Self::Occupied => "Occupied",
///             Self::Closed => "Closed",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Closed)
///     }
/// }
///
/// assert!(RoomState::Closed.is_final());
/// ```
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync
{
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Whether no further transitions are expected from this state.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }

    /// Whether this state represents a failure.
    ///
    /// Default implementation returns `false`.
    fn is_error(&self) -> bool {
        false
    }
}
