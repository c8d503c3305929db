//! Read-only views over an [`AttendanceBoard`].
//!
//! Each selector returns a flat list tagged with the originating attendance
//! type. They feed rendering and the end-of-day gates.

use crate::attendance::board::AttendanceBoard;
use crate::attendance::types::{AttendanceRecord, AttendanceType, Lane};
use serde::{Deserialize, Serialize};

/// A record together with the type lane it was read from.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggedAttendance {
    pub attendance_type: AttendanceType,
    pub record: AttendanceRecord,
}

impl TaggedAttendance {
    /// Identity of the record within a day.
    pub fn key(&self) -> AttendanceKey {
        AttendanceKey {
            attendance_type: self.attendance_type,
            name: self.record.name.clone(),
        }
    }
}

/// `(type, name)` pair identifying a record within one board.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceKey {
    pub attendance_type: AttendanceType,
    pub name: String,
}

impl AttendanceKey {
    pub fn new(attendance_type: AttendanceType, name: impl Into<String>) -> Self {
        Self {
            attendance_type,
            name: name.into(),
        }
    }
}

fn collect(board: &AttendanceBoard, lanes: &[Lane]) -> Vec<TaggedAttendance> {
    AttendanceType::ALL
        .into_iter()
        .flat_map(move |attendance_type| {
            lanes.iter().flat_map(move |lane| {
                board
                    .bucket(attendance_type, *lane)
                    .iter()
                    .map(move |record| TaggedAttendance {
                        attendance_type,
                        record: record.clone(),
                    })
            })
        })
        .collect()
}

/// Records checked in or in progress.
pub fn get_incomplete_attendances(board: &AttendanceBoard) -> Vec<TaggedAttendance> {
    collect(board, &[Lane::CheckedIn, Lane::OnGoing])
}

pub fn get_completed_attendances(board: &AttendanceBoard) -> Vec<TaggedAttendance> {
    collect(board, &[Lane::Completed])
}

/// Records that never left `scheduled`.
pub fn get_scheduled_absences(board: &AttendanceBoard) -> Vec<TaggedAttendance> {
    collect(board, &[Lane::Scheduled])
}
