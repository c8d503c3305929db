//! Backend collaborator contracts.
//!
//! Every call answers with [`ApiResult`]: either the value or an error
//! message. Transport, timeouts and wire format belong to the implementor.

pub mod memory;

use crate::attendance::{AttendanceType, Lane};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure side of a collaborator call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Backend status of an attendance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Scheduled,
    CheckedIn,
    InProgress,
    Completed,
    Missed,
    Cancelled,
}

impl From<Lane> for AttendanceStatus {
    fn from(lane: Lane) -> Self {
        match lane {
            Lane::Scheduled => AttendanceStatus::Scheduled,
            Lane::CheckedIn => AttendanceStatus::CheckedIn,
            Lane::OnGoing => AttendanceStatus::InProgress,
            Lane::Completed => AttendanceStatus::Completed,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAttendanceRequest {
    pub patient_id: u64,
    pub attendance_type: AttendanceType,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: u64,
    pub patient_id: u64,
    pub attendance_type: AttendanceType,
    pub status: AttendanceStatus,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub notes: Option<String>,
}

/// Physical treatment line of a treatment session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentType {
    LightBath,
    Rod,
}

impl TreatmentType {
    pub fn attendance_type(self) -> AttendanceType {
        match self {
            TreatmentType::LightBath => AttendanceType::LightBath,
            TreatmentType::Rod => AttendanceType::Rod,
        }
    }

    pub fn label(self) -> &'static str {
        self.attendance_type().label()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Completed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTreatmentSessionRequest {
    pub patient_id: u64,
    pub attendance_id: Option<u64>,
    pub treatment_type: TreatmentType,
    pub body_locations: Vec<String>,
    pub start_date: NaiveDate,
    pub planned_sessions: u32,
    pub color: Option<String>,
    /// Light bath only, in units of the configured block (7 minutes).
    pub duration: Option<u8>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentSession {
    pub id: u64,
    pub patient_id: u64,
    pub treatment_type: TreatmentType,
    pub body_locations: Vec<String>,
    pub start_date: NaiveDate,
    pub planned_sessions: u32,
    pub completed_sessions: u32,
    pub color: Option<String>,
    pub duration: Option<u8>,
    pub status: SessionStatus,
}

impl TreatmentSession {
    pub fn is_closed(&self) -> bool {
        self.status == SessionStatus::Cancelled || self.completed_sessions >= self.planned_sessions
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentSessionUpdate {
    pub completed_sessions: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRecordStatus {
    Scheduled,
    Completed,
    Missed,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionRecordRequest {
    pub treatment_session_id: u64,
    pub attendance_id: u64,
    pub session_number: u32,
    pub scheduled_date: NaiveDate,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreatmentSessionRecord {
    pub id: u64,
    pub treatment_session_id: u64,
    pub attendance_id: u64,
    pub session_number: u32,
    pub scheduled_date: NaiveDate,
    pub status: SessionRecordStatus,
}

#[async_trait]
pub trait AttendanceApi: Send + Sync {
    async fn create_attendance(&self, request: CreateAttendanceRequest) -> ApiResult<Attendance>;

    async fn update_attendance_status(&self, id: u64, status: AttendanceStatus) -> ApiResult<()>;

    async fn mark_as_missed(&self, id: u64, justified: bool, notes: Option<String>) -> ApiResult<()>;
}

#[async_trait]
pub trait TreatmentSessionApi: Send + Sync {
    async fn create_treatment_session(
        &self,
        request: CreateTreatmentSessionRequest,
    ) -> ApiResult<TreatmentSession>;

    async fn update_treatment_session(
        &self,
        id: u64,
        update: TreatmentSessionUpdate,
    ) -> ApiResult<TreatmentSession>;

    async fn delete_treatment_session(&self, id: u64) -> ApiResult<()>;
}

#[async_trait]
pub trait TreatmentSessionRecordApi: Send + Sync {
    async fn create_treatment_session_record(
        &self,
        request: CreateSessionRecordRequest,
    ) -> ApiResult<TreatmentSessionRecord>;
}
