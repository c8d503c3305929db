//! Pushing applied lane changes to the attendance backend.

use crate::api::{AttendanceApi, AttendanceStatus};
use crate::attendance::progression::LaneChange;
use tracing::{debug, warn};

/// A lane change the backend refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncFailure {
    pub change: LaneChange,
    pub message: String,
}

/// Send `updateAttendanceStatus` for every change that moved a record with a
/// backend id. Calls go out one at a time, in order; failures are collected
/// and never stop the remaining calls.
pub async fn sync_lane_changes<A>(api: &A, changes: &[LaneChange]) -> Vec<SyncFailure>
where
    A: AttendanceApi + ?Sized,
{
    let mut failures = Vec::new();
    for change in changes.iter().filter(|c| c.from != c.to) {
        let Some(id) = change.attendance_id else {
            debug!(name = %change.name, "Lane change has no backend attendance");
            continue;
        };
        let status = AttendanceStatus::from(change.to);
        if let Err(error) = api.update_attendance_status(id, status).await {
            warn!(attendance_id = id, ?status, %error, "Status update rejected");
            failures.push(SyncFailure {
                change: change.clone(),
                message: error.message,
            });
        }
    }
    failures
}
