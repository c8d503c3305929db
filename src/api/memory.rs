//! In-memory backend with failure injection.
//!
//! Implements every collaborator trait over shared maps so the engine can
//! be exercised without a server. Failures are injected per date or id.

use crate::api::{
    ApiError, ApiResult, Attendance, AttendanceApi, AttendanceStatus, CreateAttendanceRequest,
    CreateSessionRecordRequest, CreateTreatmentSessionRequest, SessionRecordStatus, SessionStatus,
    TreatmentSession, TreatmentSessionApi, TreatmentSessionRecord, TreatmentSessionRecordApi,
    TreatmentSessionUpdate,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// How an attendance was marked missed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissedMark {
    pub justified: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    calls: usize,
    attendances: BTreeMap<u64, Attendance>,
    missed: BTreeMap<u64, MissedMark>,
    sessions: BTreeMap<u64, TreatmentSession>,
    records: BTreeMap<u64, TreatmentSessionRecord>,
    conflict_dates: HashSet<NaiveDate>,
    link_failure_dates: HashSet<NaiveDate>,
    missed_failures: HashSet<u64>,
    fail_session_creation: bool,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    inner: Mutex<Inner>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reject appointments on `date` as if the slot were taken.
    pub fn reject_appointments_on(&self, date: NaiveDate) {
        self.lock().conflict_dates.insert(date);
    }

    /// Fail session-record linking for appointments on `date`.
    pub fn reject_links_on(&self, date: NaiveDate) {
        self.lock().link_failure_dates.insert(date);
    }

    pub fn reject_missed_mark_for(&self, attendance_id: u64) {
        self.lock().missed_failures.insert(attendance_id);
    }

    pub fn accept_missed_mark_for(&self, attendance_id: u64) {
        self.lock().missed_failures.remove(&attendance_id);
    }

    pub fn reject_session_creation(&self) {
        self.lock().fail_session_creation = true;
    }

    /// Insert an attendance directly, bypassing call accounting.
    pub fn seed_attendance(&self, attendance: Attendance) {
        let mut inner = self.lock();
        inner.next_id = inner.next_id.max(attendance.id);
        inner.attendances.insert(attendance.id, attendance);
    }

    /// Number of collaborator calls received.
    pub fn call_count(&self) -> usize {
        self.lock().calls
    }

    pub fn attendance(&self, id: u64) -> Option<Attendance> {
        self.lock().attendances.get(&id).cloned()
    }

    pub fn attendances(&self) -> Vec<Attendance> {
        self.lock().attendances.values().cloned().collect()
    }

    pub fn missed_mark(&self, id: u64) -> Option<MissedMark> {
        self.lock().missed.get(&id).cloned()
    }

    pub fn session(&self, id: u64) -> Option<TreatmentSession> {
        self.lock().sessions.get(&id).cloned()
    }

    pub fn sessions(&self) -> Vec<TreatmentSession> {
        self.lock().sessions.values().cloned().collect()
    }

    pub fn records(&self) -> Vec<TreatmentSessionRecord> {
        self.lock().records.values().cloned().collect()
    }
}

#[async_trait]
impl AttendanceApi for InMemoryBackend {
    async fn create_attendance(&self, request: CreateAttendanceRequest) -> ApiResult<Attendance> {
        let mut inner = self.lock();
        inner.calls += 1;
        if inner.conflict_dates.contains(&request.scheduled_date) {
            return Err(ApiError::new(format!(
                "Horário indisponível em {} às {}",
                request.scheduled_date,
                request.scheduled_time.format("%H:%M")
            )));
        }
        let attendance = Attendance {
            id: inner.next_id(),
            patient_id: request.patient_id,
            attendance_type: request.attendance_type,
            status: AttendanceStatus::Scheduled,
            scheduled_date: request.scheduled_date,
            scheduled_time: request.scheduled_time,
            notes: request.notes,
        };
        inner.attendances.insert(attendance.id, attendance.clone());
        Ok(attendance)
    }

    async fn update_attendance_status(&self, id: u64, status: AttendanceStatus) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.calls += 1;
        let attendance = inner
            .attendances
            .get_mut(&id)
            .ok_or_else(|| ApiError::new(format!("Atendimento {id} não encontrado")))?;
        attendance.status = status;
        Ok(())
    }

    async fn mark_as_missed(&self, id: u64, justified: bool, notes: Option<String>) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.calls += 1;
        if inner.missed_failures.contains(&id) {
            return Err(ApiError::new(format!("Falha ao registrar falta do atendimento {id}")));
        }
        let attendance = inner
            .attendances
            .get_mut(&id)
            .ok_or_else(|| ApiError::new(format!("Atendimento {id} não encontrado")))?;
        if attendance.status == AttendanceStatus::Missed {
            return Err(ApiError::new(format!("Falta do atendimento {id} já registrada")));
        }
        attendance.status = AttendanceStatus::Missed;
        attendance.notes = notes.clone();
        inner.missed.insert(id, MissedMark { justified, notes });
        Ok(())
    }
}

#[async_trait]
impl TreatmentSessionApi for InMemoryBackend {
    async fn create_treatment_session(
        &self,
        request: CreateTreatmentSessionRequest,
    ) -> ApiResult<TreatmentSession> {
        let mut inner = self.lock();
        inner.calls += 1;
        if inner.fail_session_creation {
            return Err(ApiError::new("Falha ao criar sessão de tratamento"));
        }
        let session = TreatmentSession {
            id: inner.next_id(),
            patient_id: request.patient_id,
            treatment_type: request.treatment_type,
            body_locations: request.body_locations,
            start_date: request.start_date,
            planned_sessions: request.planned_sessions,
            completed_sessions: 0,
            color: request.color,
            duration: request.duration,
            status: SessionStatus::Active,
        };
        inner.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn update_treatment_session(
        &self,
        id: u64,
        update: TreatmentSessionUpdate,
    ) -> ApiResult<TreatmentSession> {
        let mut inner = self.lock();
        inner.calls += 1;
        let session = inner
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ApiError::new(format!("Sessão {id} não encontrada")))?;
        if update.completed_sessions > session.planned_sessions {
            return Err(ApiError::new("Sessões concluídas excedem as planejadas"));
        }
        session.completed_sessions = update.completed_sessions;
        if session.completed_sessions == session.planned_sessions {
            session.status = SessionStatus::Completed;
        }
        Ok(session.clone())
    }

    async fn delete_treatment_session(&self, id: u64) -> ApiResult<()> {
        let mut inner = self.lock();
        inner.calls += 1;
        inner
            .sessions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::new(format!("Sessão {id} não encontrada")))
    }
}

#[async_trait]
impl TreatmentSessionRecordApi for InMemoryBackend {
    async fn create_treatment_session_record(
        &self,
        request: CreateSessionRecordRequest,
    ) -> ApiResult<TreatmentSessionRecord> {
        let mut inner = self.lock();
        inner.calls += 1;
        if inner.link_failure_dates.contains(&request.scheduled_date) {
            return Err(ApiError::new("Falha ao vincular registro da sessão"));
        }
        if !inner.sessions.contains_key(&request.treatment_session_id) {
            return Err(ApiError::new(format!(
                "Sessão {} não encontrada",
                request.treatment_session_id
            )));
        }
        let record = TreatmentSessionRecord {
            id: inner.next_id(),
            treatment_session_id: request.treatment_session_id,
            attendance_id: request.attendance_id,
            session_number: request.session_number,
            scheduled_date: request.scheduled_date,
            status: SessionRecordStatus::Scheduled,
        };
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::AttendanceType;
    use chrono::NaiveTime;

    fn request(date: NaiveDate) -> CreateAttendanceRequest {
        CreateAttendanceRequest {
            patient_id: 7,
            attendance_type: AttendanceType::LightBath,
            scheduled_date: date,
            scheduled_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn rejected_dates_produce_conflicts() {
        let backend = InMemoryBackend::new();
        let date = NaiveDate::from_ymd_opt(2025, 9, 24).unwrap();
        backend.reject_appointments_on(date);

        let err = backend.create_attendance(request(date)).await.unwrap_err();
        assert!(err.message.contains("2025-09-24"));
        assert_eq!(backend.call_count(), 1);
        assert!(backend.attendances().is_empty());
    }

    #[tokio::test]
    async fn mark_as_missed_updates_status_and_notes() {
        let backend = InMemoryBackend::new();
        let created = backend
            .create_attendance(request(NaiveDate::from_ymd_opt(2025, 9, 17).unwrap()))
            .await
            .unwrap();

        backend
            .mark_as_missed(created.id, true, Some("Atestado".to_string()))
            .await
            .unwrap();

        let stored = backend.attendance(created.id).unwrap();
        assert_eq!(stored.status, AttendanceStatus::Missed);
        assert_eq!(
            backend.missed_mark(created.id),
            Some(MissedMark {
                justified: true,
                notes: Some("Atestado".to_string())
            })
        );
        assert!(backend.mark_as_missed(created.id, false, None).await.is_err());
    }
}
