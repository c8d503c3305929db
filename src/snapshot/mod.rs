//! Save and restore a day's attendance board.
//!
//! A snapshot carries every record with its lane times and lane history, so a
//! board can be reloaded after a restart without asking the backend again.
//! Both JSON and a compact binary encoding are supported.

use crate::attendance::{AttendanceBoard, TaggedAttendance};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::SnapshotError;

/// Version identifier for snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serializable copy of an [`AttendanceBoard`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Snapshot format version
    pub version: u32,

    /// Unique snapshot identifier
    pub id: String,

    /// When the snapshot was taken
    pub taken_at: DateTime<Utc>,

    /// Day the board belongs to
    pub date: NaiveDate,

    /// Whether the day was locked
    pub finalized: bool,

    /// Records in type then lane order
    pub records: Vec<TaggedAttendance>,
}

impl BoardSnapshot {
    pub fn capture(board: &AttendanceBoard) -> Self {
        let records = board
            .records()
            .map(|record| TaggedAttendance {
                attendance_type: record.attendance_type,
                record: record.clone(),
            })
            .collect::<Vec<_>>();

        Self {
            version: SNAPSHOT_VERSION,
            id: Uuid::new_v4().to_string(),
            taken_at: Utc::now(),
            date: board.date(),
            finalized: board.is_finalized(),
            records,
        }
    }

    /// Rebuild the board.
    ///
    /// Fails when a record is filed under a type other than its own, or when
    /// a name shows up twice within one type.
    pub fn restore(self) -> Result<AttendanceBoard, SnapshotError> {
        self.check_version()?;

        let mut board = AttendanceBoard::new(self.date);
        for tagged in self.records {
            if tagged.record.attendance_type != tagged.attendance_type {
                return Err(SnapshotError::ValidationFailed(format!(
                    "{} filed under {} but belongs to {}",
                    tagged.record.name, tagged.attendance_type, tagged.record.attendance_type
                )));
            }
            if board.lane_of(tagged.attendance_type, &tagged.record.name).is_some() {
                return Err(SnapshotError::ValidationFailed(format!(
                    "{} appears twice in {}",
                    tagged.record.name, tagged.attendance_type
                )));
            }
            board.insert(tagged.record);
        }
        board.set_finalized(self.finalized);

        debug!(id = %self.id, date = %self.date, records = board.len(), "Board restored");
        Ok(board)
    }

    fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version == SNAPSHOT_VERSION {
            Ok(())
        } else {
            Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                supported: SNAPSHOT_VERSION,
            })
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    pub fn to_binary(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self = bincode::deserialize(bytes)
            .map_err(|e| SnapshotError::DeserializationFailed(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }
}

impl AttendanceBoard {
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::{
        AttendanceRecord, AttendanceType, Lane, Priority, ProgressionStateMachine,
    };
    use chrono::NaiveTime;

    fn busy_board() -> AttendanceBoard {
        let date = NaiveDate::from_ymd_opt(2025, 9, 17).unwrap();
        let mut machine = ProgressionStateMachine::new(AttendanceBoard::new(date))
            .with_clock(|| NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        machine.schedule(
            AttendanceRecord::scheduled("Ana", Priority::Elderly, AttendanceType::Spiritual)
                .with_ids(10, 1),
        );
        machine.schedule(AttendanceRecord::scheduled(
            "Rui",
            Priority::Standard,
            AttendanceType::Rod,
        ));
        machine.request_move(AttendanceType::Spiritual, "Ana", Lane::CheckedIn);
        machine.board().clone()
    }

    #[test]
    fn capture_keeps_lanes_times_and_history() {
        let board = busy_board();
        let restored = board.snapshot().restore().unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(
            restored.lane_of(AttendanceType::Spiritual, "Ana"),
            Some(Lane::CheckedIn)
        );
        let ana = restored.find(AttendanceType::Spiritual, "Ana").unwrap();
        assert_eq!(ana.times.checked_in, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(ana.history.transitions().len(), 1);
        assert_eq!(ana.attendance_id, Some(10));
    }

    #[test]
    fn json_and_binary_agree() {
        let snapshot = busy_board().snapshot();

        let from_json = BoardSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        let from_binary = BoardSnapshot::from_binary(&snapshot.to_binary().unwrap()).unwrap();

        assert_eq!(from_json.id, snapshot.id);
        assert_eq!(from_binary.id, snapshot.id);
        assert_eq!(from_binary.records.len(), 2);
        assert_eq!(from_json.date, from_binary.date);
    }

    #[test]
    fn future_versions_are_rejected() {
        let mut snapshot = busy_board().snapshot();
        snapshot.version = SNAPSHOT_VERSION + 1;
        let json = snapshot.to_json().unwrap();

        assert!(matches!(
            BoardSnapshot::from_json(&json),
            Err(SnapshotError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn duplicate_names_within_a_type_are_rejected() {
        let mut snapshot = busy_board().snapshot();
        let ana = snapshot.records[0].clone();
        snapshot.records.push(ana);

        assert!(matches!(
            snapshot.restore(),
            Err(SnapshotError::ValidationFailed(_))
        ));
    }

    #[test]
    fn finalized_flag_survives() {
        let mut board = busy_board();
        board.set_finalized(true);

        let restored = BoardSnapshot::from_binary(&board.snapshot().to_binary().unwrap())
            .unwrap()
            .restore()
            .unwrap();
        assert!(restored.is_finalized());
    }
}
