//! Attendance vocabulary: lanes, attendance types, priorities and records.

use crate::core::{State, StateHistory, StateTransition};
use chrono::{NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of one attendance within a day.
///
/// Lanes are ordered: `Scheduled < CheckedIn < OnGoing < Completed`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Lane {
    Scheduled,
    CheckedIn,
    OnGoing,
    Completed,
}

impl Lane {
    pub const ALL: [Lane; 4] = [
        Lane::Scheduled,
        Lane::CheckedIn,
        Lane::OnGoing,
        Lane::Completed,
    ];

    pub fn index(self) -> usize {
        match self {
            Lane::Scheduled => 0,
            Lane::CheckedIn => 1,
            Lane::OnGoing => 2,
            Lane::Completed => 3,
        }
    }

    pub fn next(self) -> Option<Lane> {
        match self {
            Lane::Scheduled => Some(Lane::CheckedIn),
            Lane::CheckedIn => Some(Lane::OnGoing),
            Lane::OnGoing => Some(Lane::Completed),
            Lane::Completed => None,
        }
    }

    /// Lanes that count as "started but not finished".
    pub fn is_incomplete(self) -> bool {
        matches!(self, Lane::CheckedIn | Lane::OnGoing)
    }
}

impl State for Lane {
    fn name(&self) -> &str {
        match self {
            Lane::Scheduled => "scheduled",
            Lane::CheckedIn => "checkedIn",
            Lane::OnGoing => "onGoing",
            Lane::Completed => "completed",
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, Lane::Completed)
    }
}

/// How a requested move relates to the lane order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Movement {
    /// Same lane, nothing to do.
    Stay,
    /// Exactly one lane ahead.
    Forward,
    /// More than one lane ahead.
    Skip,
    /// Any number of lanes behind.
    Backward,
}

impl Movement {
    pub fn between(from: Lane, to: Lane) -> Self {
        let (from, to) = (from.index(), to.index());
        if to == from {
            Movement::Stay
        } else if to == from + 1 {
            Movement::Forward
        } else if to > from {
            Movement::Skip
        } else {
            Movement::Backward
        }
    }

    pub fn needs_confirmation(self) -> bool {
        matches!(self, Movement::Skip | Movement::Backward)
    }
}

/// Treatment line a record belongs to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceType {
    Spiritual,
    LightBath,
    Rod,
    /// Light bath and rod for the same patient on the same day.
    Combined,
}

impl AttendanceType {
    pub const ALL: [AttendanceType; 4] = [
        AttendanceType::Spiritual,
        AttendanceType::LightBath,
        AttendanceType::Rod,
        AttendanceType::Combined,
    ];

    /// Attendance type for a day with the given physical treatments.
    pub fn for_treatments(light_bath: bool, rod: bool) -> Option<AttendanceType> {
        match (light_bath, rod) {
            (true, true) => Some(AttendanceType::Combined),
            (true, false) => Some(AttendanceType::LightBath),
            (false, true) => Some(AttendanceType::Rod),
            (false, false) => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttendanceType::Spiritual => "Consulta espiritual",
            AttendanceType::LightBath => "Banho de luz",
            AttendanceType::Rod => "Bastão",
            AttendanceType::Combined => "Banho de luz + Bastão",
        }
    }
}

impl fmt::Display for AttendanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Queue priority. `Exception` is served first.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize,
)]
pub enum Priority {
    #[serde(rename = "1")]
    Exception,
    #[serde(rename = "2")]
    Elderly,
    #[default]
    #[serde(rename = "3")]
    Standard,
}

impl Priority {
    pub fn code(self) -> &'static str {
        match self {
            Priority::Exception => "1",
            Priority::Elderly => "2",
            Priority::Standard => "3",
        }
    }

    pub fn from_code(code: &str) -> Option<Priority> {
        match code.trim() {
            "1" => Some(Priority::Exception),
            "2" => Some(Priority::Elderly),
            "3" => Some(Priority::Standard),
            _ => None,
        }
    }
}

/// Wall-clock times a record entered each lane.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LaneTimes {
    pub checked_in: Option<NaiveTime>,
    pub on_going: Option<NaiveTime>,
    pub completed: Option<NaiveTime>,
}

impl LaneTimes {
    pub fn get(&self, lane: Lane) -> Option<NaiveTime> {
        match lane {
            Lane::Scheduled => None,
            Lane::CheckedIn => self.checked_in,
            Lane::OnGoing => self.on_going,
            Lane::Completed => self.completed,
        }
    }

    fn slot(&mut self, lane: Lane) -> Option<&mut Option<NaiveTime>> {
        match lane {
            Lane::Scheduled => None,
            Lane::CheckedIn => Some(&mut self.checked_in),
            Lane::OnGoing => Some(&mut self.on_going),
            Lane::Completed => Some(&mut self.completed),
        }
    }

    /// Stamp `lane` and clear every later lane.
    pub(crate) fn enter(&mut self, lane: Lane, at: NaiveTime) {
        if let Some(slot) = self.slot(lane) {
            *slot = Some(at);
        }
        for later in Lane::ALL.iter().filter(|l| **l > lane) {
            if let Some(slot) = self.slot(*later) {
                *slot = None;
            }
        }
    }

    /// `HH:MM:SS` rendering of the time `lane` was entered.
    pub fn formatted(&self, lane: Lane) -> Option<String> {
        self.get(lane).map(|t| t.format("%H:%M:%S").to_string())
    }
}

/// One patient's attendance of one type on one day.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub name: String,
    pub priority: Priority,
    pub attendance_type: AttendanceType,
    pub lane: Lane,
    pub times: LaneTimes,
    pub attendance_id: Option<u64>,
    pub patient_id: Option<u64>,
    pub history: StateHistory<Lane>,
}

impl AttendanceRecord {
    /// A record waiting in `scheduled`.
    pub fn scheduled(
        name: impl Into<String>,
        priority: Priority,
        attendance_type: AttendanceType,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            attendance_type,
            lane: Lane::Scheduled,
            times: LaneTimes::default(),
            attendance_id: None,
            patient_id: None,
            history: StateHistory::new(),
        }
    }

    pub fn with_ids(mut self, attendance_id: u64, patient_id: u64) -> Self {
        self.attendance_id = Some(attendance_id);
        self.patient_id = Some(patient_id);
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }

    /// Move to `to`, stamping the lane time and recording history.
    pub(crate) fn enter_lane(&mut self, to: Lane, at: NaiveTime, confirmed: bool) {
        let from = self.lane;
        self.times.enter(to, at);
        self.history = self.history.record(StateTransition {
            from,
            to,
            timestamp: Utc::now(),
            confirmed,
        });
        self.lane = to;
    }
}
