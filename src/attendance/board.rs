//! Per-date aggregate of attendance records.
//!
//! The board only exposes read access publicly. Mutation goes through
//! [`crate::attendance::ProgressionStateMachine`], which owns the board.

use crate::attendance::types::{AttendanceRecord, AttendanceType, Lane};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The four lane buckets of one attendance type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TypeLanes {
    scheduled: Vec<AttendanceRecord>,
    checked_in: Vec<AttendanceRecord>,
    on_going: Vec<AttendanceRecord>,
    completed: Vec<AttendanceRecord>,
}

impl TypeLanes {
    pub fn bucket(&self, lane: Lane) -> &[AttendanceRecord] {
        match lane {
            Lane::Scheduled => &self.scheduled,
            Lane::CheckedIn => &self.checked_in,
            Lane::OnGoing => &self.on_going,
            Lane::Completed => &self.completed,
        }
    }

    fn bucket_mut(&mut self, lane: Lane) -> &mut Vec<AttendanceRecord> {
        match lane {
            Lane::Scheduled => &mut self.scheduled,
            Lane::CheckedIn => &mut self.checked_in,
            Lane::OnGoing => &mut self.on_going,
            Lane::Completed => &mut self.completed,
        }
    }

    /// Lane currently holding `name`, if any.
    pub fn lane_of(&self, name: &str) -> Option<Lane> {
        Lane::ALL
            .into_iter()
            .find(|lane| self.bucket(*lane).iter().any(|r| r.is_named(name)))
    }

    pub fn len(&self) -> usize {
        Lane::ALL.iter().map(|l| self.bucket(*l).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All attendance records of one calendar date.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttendanceBoard {
    date: NaiveDate,
    finalized: bool,
    spiritual: TypeLanes,
    light_bath: TypeLanes,
    rod: TypeLanes,
    combined: TypeLanes,
}

impl AttendanceBoard {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            finalized: false,
            spiritual: TypeLanes::default(),
            light_bath: TypeLanes::default(),
            rod: TypeLanes::default(),
            combined: TypeLanes::default(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn lanes(&self, attendance_type: AttendanceType) -> &TypeLanes {
        match attendance_type {
            AttendanceType::Spiritual => &self.spiritual,
            AttendanceType::LightBath => &self.light_bath,
            AttendanceType::Rod => &self.rod,
            AttendanceType::Combined => &self.combined,
        }
    }

    fn lanes_mut(&mut self, attendance_type: AttendanceType) -> &mut TypeLanes {
        match attendance_type {
            AttendanceType::Spiritual => &mut self.spiritual,
            AttendanceType::LightBath => &mut self.light_bath,
            AttendanceType::Rod => &mut self.rod,
            AttendanceType::Combined => &mut self.combined,
        }
    }

    pub fn bucket(&self, attendance_type: AttendanceType, lane: Lane) -> &[AttendanceRecord] {
        self.lanes(attendance_type).bucket(lane)
    }

    pub fn lane_of(&self, attendance_type: AttendanceType, name: &str) -> Option<Lane> {
        self.lanes(attendance_type).lane_of(name)
    }

    pub fn find(&self, attendance_type: AttendanceType, name: &str) -> Option<&AttendanceRecord> {
        let lane = self.lane_of(attendance_type, name)?;
        self.bucket(attendance_type, lane)
            .iter()
            .find(|r| r.is_named(name))
    }

    /// Other types in which `name` is still waiting in `scheduled`.
    pub fn concurrent_scheduled(&self, attendance_type: AttendanceType, name: &str) -> Vec<AttendanceType> {
        AttendanceType::ALL
            .into_iter()
            .filter(|t| *t != attendance_type)
            .filter(|t| self.bucket(*t, Lane::Scheduled).iter().any(|r| r.is_named(name)))
            .collect()
    }

    /// Every record, tagged by type, in type then lane order.
    pub fn records(&self) -> impl Iterator<Item = &AttendanceRecord> {
        AttendanceType::ALL.into_iter().flat_map(move |t| {
            Lane::ALL
                .into_iter()
                .flat_map(move |lane| self.bucket(t, lane).iter())
        })
    }

    pub fn len(&self) -> usize {
        AttendanceType::ALL.iter().map(|t| self.lanes(*t).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn set_finalized(&mut self, finalized: bool) {
        self.finalized = finalized;
    }

    /// Insert `record` into its lane. Returns `false` when the name already
    /// sits in that lane.
    ///
    /// The bucket stays ordered by priority, arrivals of equal priority keep
    /// their insertion order.
    pub(crate) fn insert(&mut self, record: AttendanceRecord) -> bool {
        let bucket = self
            .lanes_mut(record.attendance_type)
            .bucket_mut(record.lane);
        if bucket.iter().any(|r| r.is_named(&record.name)) {
            return false;
        }
        let position = bucket
            .iter()
            .position(|r| r.priority > record.priority)
            .unwrap_or(bucket.len());
        bucket.insert(position, record);
        true
    }

    pub(crate) fn take(
        &mut self,
        attendance_type: AttendanceType,
        lane: Lane,
        name: &str,
    ) -> Option<AttendanceRecord> {
        let bucket = self.lanes_mut(attendance_type).bucket_mut(lane);
        let position = bucket.iter().position(|r| r.is_named(name))?;
        Some(bucket.remove(position))
    }

    pub(crate) fn contains(&self, attendance_type: AttendanceType, lane: Lane, name: &str) -> bool {
        self.bucket(attendance_type, lane)
            .iter()
            .any(|r| r.is_named(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::types::Priority;

    fn board() -> AttendanceBoard {
        AttendanceBoard::new(NaiveDate::from_ymd_opt(2025, 9, 17).unwrap())
    }

    #[test]
    fn insert_is_idempotent_by_name() {
        let mut board = board();
        let record = AttendanceRecord::scheduled("Ana", Priority::Standard, AttendanceType::Spiritual);

        assert!(board.insert(record.clone()));
        assert!(!board.insert(record));
        assert_eq!(board.bucket(AttendanceType::Spiritual, Lane::Scheduled).len(), 1);
    }

    #[test]
    fn buckets_are_ordered_by_priority() {
        let mut board = board();
        board.insert(AttendanceRecord::scheduled("C", Priority::Standard, AttendanceType::Rod));
        board.insert(AttendanceRecord::scheduled("B", Priority::Elderly, AttendanceType::Rod));
        board.insert(AttendanceRecord::scheduled("D", Priority::Standard, AttendanceType::Rod));
        board.insert(AttendanceRecord::scheduled("A", Priority::Exception, AttendanceType::Rod));

        let names: Vec<&str> = board
            .bucket(AttendanceType::Rod, Lane::Scheduled)
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn take_removes_record_from_lane() {
        let mut board = board();
        board.insert(AttendanceRecord::scheduled("Ana", Priority::Standard, AttendanceType::LightBath));

        let taken = board.take(AttendanceType::LightBath, Lane::Scheduled, "Ana");
        assert!(taken.is_some());
        assert!(board.is_empty());
        assert!(board.take(AttendanceType::LightBath, Lane::Scheduled, "Ana").is_none());
    }

    #[test]
    fn concurrent_scheduled_lists_other_types() {
        let mut board = board();
        board.insert(AttendanceRecord::scheduled("Ana", Priority::Standard, AttendanceType::Spiritual));
        board.insert(AttendanceRecord::scheduled("Ana", Priority::Standard, AttendanceType::LightBath));
        board.insert(AttendanceRecord::scheduled("Rui", Priority::Standard, AttendanceType::Rod));

        assert_eq!(
            board.concurrent_scheduled(AttendanceType::Spiritual, "Ana"),
            vec![AttendanceType::LightBath]
        );
        assert!(board.concurrent_scheduled(AttendanceType::Rod, "Rui").is_empty());
    }
}
