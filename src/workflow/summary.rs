//! Absence justifications and day summaries.

use crate::attendance::{AttendanceKey, AttendanceType, TaggedAttendance};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Step-2 decision for one scheduled absence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbsenceJustification {
    pub attendance_type: AttendanceType,
    pub name: String,
    pub patient_id: Option<u64>,
    pub justified: bool,
    pub notes: Option<String>,
}

impl AbsenceJustification {
    pub fn justified(absence: &TaggedAttendance, notes: Option<String>) -> Self {
        Self::new(absence, true, notes)
    }

    pub fn unjustified(absence: &TaggedAttendance) -> Self {
        Self::new(absence, false, None)
    }

    fn new(absence: &TaggedAttendance, justified: bool, notes: Option<String>) -> Self {
        Self {
            attendance_type: absence.attendance_type,
            name: absence.record.name.clone(),
            patient_id: absence.record.patient_id,
            justified,
            notes,
        }
    }

    pub fn key(&self) -> AttendanceKey {
        AttendanceKey::new(self.attendance_type, self.name.clone())
    }
}

/// How one absence was closed at finalize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissedAttendance {
    pub key: AttendanceKey,
    pub attendance_id: Option<u64>,
    pub justified: bool,
    pub notes: Option<String>,
}

/// Counts shown on the confirmation step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPreview {
    pub total: usize,
    pub completed: usize,
    pub incomplete: usize,
    pub absences: usize,
    pub justified: usize,
    pub unjustified: usize,
}

/// Result of a successful finalize.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub total_patients: usize,
    pub completed_patients: usize,
    pub missed_patients: usize,
    pub completion_time: DateTime<Utc>,
    pub missed: Vec<MissedAttendance>,
}
