//! Expansion of a recommendation into dated treatment sessions.

use crate::api::{
    AttendanceApi, CreateAttendanceRequest, CreateSessionRecordRequest,
    CreateTreatmentSessionRequest, TreatmentSessionApi, TreatmentSessionRecordApi,
};
use crate::config::RecurrenceConfig;
use crate::error::ClinicError;
use crate::recurrence::outcome::{
    CreatedOccurrence, FailureKind, OccurrenceFailure, RecurrenceOutcome,
};
use crate::recurrence::types::{CourseSpec, TreatmentRecommendation};
use crate::recurrence::validation::validate_recommendation;
use chrono::{Days, Local, NaiveDate};
use tracing::{debug, info, warn};

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Creates one treatment session per location spec and one appointment plus
/// session record per ordinal.
///
/// Ordinals are processed strictly one after another so `session_number`
/// follows creation order. A failed ordinal is recorded and the batch moves
/// on; nothing already created is rolled back.
pub struct SessionRecurrenceGenerator {
    config: RecurrenceConfig,
    today: fn() -> NaiveDate,
}

impl Default for SessionRecurrenceGenerator {
    fn default() -> Self {
        Self::new(RecurrenceConfig::default())
    }
}

impl SessionRecurrenceGenerator {
    pub fn new(config: RecurrenceConfig) -> Self {
        Self {
            config,
            today: local_today,
        }
    }

    /// Override the date used for "not in the future" checks.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &RecurrenceConfig {
        &self.config
    }

    /// `(ordinal, date)` for each session of a course, 1-based.
    pub fn occurrence_dates(&self, start: NaiveDate, quantity: u32) -> Vec<(u32, Option<NaiveDate>)> {
        (1..=quantity)
            .map(|ordinal| {
                let offset = u64::from(self.config.interval_days) * u64::from(ordinal - 1);
                (ordinal, start.checked_add_days(Days::new(offset)))
            })
            .collect()
    }

    fn appointment_note(&self, course: &CourseSpec, description: &str, ordinal: u32) -> String {
        let note = format!("{} - sessão {}/{}", description, ordinal, course.quantity);
        match course.duration {
            Some(units) => format!("{} - {} min", note, self.config.duration_minutes(units)),
            None => note,
        }
    }

    /// Validate, then run the whole batch.
    ///
    /// `Err` only for validation failures, in which case no backend call was
    /// made. Backend failures are reported inside the returned outcome.
    pub async fn generate<Env>(
        &self,
        env: &Env,
        recommendation: &TreatmentRecommendation,
    ) -> Result<RecurrenceOutcome, ClinicError>
    where
        Env: AttendanceApi + TreatmentSessionApi + TreatmentSessionRecordApi,
    {
        validate_recommendation(recommendation, (self.today)(), &self.config)?;

        let courses = recommendation.courses();
        info!(
            patient_id = recommendation.patient_id,
            courses = courses.len(),
            "Generating treatment sessions"
        );

        let mut outcome = RecurrenceOutcome::default();
        for course in &courses {
            self.run_course(env, recommendation, course, &mut outcome).await;
        }

        if outcome.is_complete() {
            info!(
                sessions = outcome.session_ids.len(),
                occurrences = outcome.occurrences.len(),
                "Treatment sessions generated"
            );
        } else {
            warn!(
                sessions = outcome.session_ids.len(),
                occurrences = outcome.occurrences.len(),
                failures = outcome.failures.len(),
                "Treatment sessions generated with failures"
            );
        }
        Ok(outcome)
    }

    async fn run_course<Env>(
        &self,
        env: &Env,
        recommendation: &TreatmentRecommendation,
        course: &CourseSpec,
        outcome: &mut RecurrenceOutcome,
    ) where
        Env: AttendanceApi + TreatmentSessionApi + TreatmentSessionRecordApi,
    {
        let description = course.describe();
        let failure = |ordinal: Option<u32>, date: NaiveDate, kind: FailureKind, message: String| {
            OccurrenceFailure {
                treatment_type: course.treatment_type,
                course: description.clone(),
                ordinal,
                date,
                kind,
                message,
            }
        };

        let session = match env
            .create_treatment_session(CreateTreatmentSessionRequest {
                patient_id: recommendation.patient_id,
                attendance_id: recommendation.attendance_id,
                treatment_type: course.treatment_type,
                body_locations: course.locations.clone(),
                start_date: course.start_date,
                planned_sessions: course.quantity,
                color: course.color.clone(),
                duration: course.duration,
                notes: recommendation.notes.clone(),
            })
            .await
        {
            Ok(session) => session,
            Err(error) => {
                warn!(course = %description, %error, "Treatment session not created");
                outcome.failures.push(failure(
                    None,
                    course.start_date,
                    FailureKind::Session,
                    error.message,
                ));
                return;
            }
        };
        outcome.session_ids.push(session.id);

        for (ordinal, date) in self.occurrence_dates(course.start_date, course.quantity) {
            let Some(date) = date else {
                outcome.failures.push(failure(
                    Some(ordinal),
                    course.start_date,
                    FailureKind::Conflict,
                    "data fora do calendário".to_string(),
                ));
                continue;
            };

            let appointment = match env
                .create_attendance(CreateAttendanceRequest {
                    patient_id: recommendation.patient_id,
                    attendance_type: course.treatment_type.attendance_type(),
                    scheduled_date: date,
                    scheduled_time: self.config.session_time,
                    notes: Some(self.appointment_note(course, &description, ordinal)),
                })
                .await
            {
                Ok(appointment) => appointment,
                Err(error) => {
                    warn!(course = %description, ordinal, %date, %error, "Appointment rejected");
                    outcome.failures.push(failure(
                        Some(ordinal),
                        date,
                        FailureKind::Conflict,
                        error.message,
                    ));
                    continue;
                }
            };

            match env
                .create_treatment_session_record(CreateSessionRecordRequest {
                    treatment_session_id: session.id,
                    attendance_id: appointment.id,
                    session_number: ordinal,
                    scheduled_date: date,
                })
                .await
            {
                Ok(record) => {
                    debug!(session_id = session.id, ordinal, %date, "Session record linked");
                    outcome.occurrences.push(CreatedOccurrence {
                        treatment_session_id: session.id,
                        ordinal,
                        date,
                        attendance_id: appointment.id,
                        record_id: record.id,
                    });
                }
                Err(error) => {
                    warn!(course = %description, ordinal, %date, %error, "Session record not linked");
                    outcome.failures.push(failure(
                        Some(ordinal),
                        date,
                        FailureKind::Link,
                        error.message,
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::InMemoryBackend;
    use crate::recurrence::types::{LightBathSpec, RodSpec};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    fn generator() -> SessionRecurrenceGenerator {
        SessionRecurrenceGenerator::default().with_today(|| NaiveDate::from_ymd_opt(2025, 9, 30).unwrap())
    }

    fn light_bath(quantity: u32) -> TreatmentRecommendation {
        TreatmentRecommendation {
            patient_id: 3,
            attendance_id: Some(1),
            attendance_date: date(17),
            return_weeks: 2,
            light_bath: Some(vec![LightBathSpec {
                locations: vec!["Cabeça".to_string(), "Tórax".to_string()],
                quantity,
                start_date: date(17),
                color: "verde".to_string(),
                duration: 3,
            }]),
            rod: None,
            notes: None,
        }
    }

    #[test]
    fn dates_step_by_interval() {
        let dates = generator().occurrence_dates(date(17), 3);
        assert_eq!(
            dates,
            vec![(1, Some(date(17))), (2, Some(date(24))), (3, NaiveDate::from_ymd_opt(2025, 10, 1))]
        );
    }

    #[tokio::test]
    async fn light_bath_sessions_are_weekly_at_eight() {
        let backend = InMemoryBackend::new();

        let outcome = generator().generate(&backend, &light_bath(2)).await.unwrap();

        assert!(outcome.is_complete());
        assert_eq!(outcome.session_ids.len(), 1);
        let appointments = backend.attendances();
        assert_eq!(appointments.len(), 2);
        assert_eq!(appointments[0].scheduled_date, date(17));
        assert_eq!(appointments[1].scheduled_date, date(24));
        assert!(appointments
            .iter()
            .all(|a| a.scheduled_time.format("%H:%M").to_string() == "08:00"));

        let numbers: Vec<u32> = backend.records().iter().map(|r| r.session_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        let session = backend.session(outcome.session_ids[0]).unwrap();
        assert_eq!(session.planned_sessions, 2);
        assert_eq!(session.duration, Some(3));
        assert_eq!(
            appointments[0].notes.as_deref(),
            Some("Banho de luz (Cabeça, Tórax) - sessão 1/2 - 21 min")
        );
    }

    #[tokio::test]
    async fn failed_ordinal_does_not_stop_the_batch() {
        let backend = InMemoryBackend::new();
        backend.reject_appointments_on(date(24));

        let outcome = generator().generate(&backend, &light_bath(3)).await.unwrap();

        let session_id = outcome.session_ids[0];
        assert_eq!(outcome.ordinals_for(session_id), vec![1, 3]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].kind, FailureKind::Conflict);
        let message = outcome.aggregate_error().unwrap().to_string();
        assert!(message.contains("2025-09-24"));
        assert!(message.contains("sessão 2"));
    }

    #[tokio::test]
    async fn link_failure_keeps_the_appointment() {
        let backend = InMemoryBackend::new();
        backend.reject_links_on(date(17));

        let outcome = generator().generate(&backend, &light_bath(2)).await.unwrap();

        assert_eq!(outcome.failures[0].kind, FailureKind::Link);
        assert_eq!(outcome.failures[0].ordinal, Some(1));
        assert_eq!(backend.attendances().len(), 2);
        assert_eq!(backend.records().len(), 1);
        assert_eq!(backend.records()[0].session_number, 2);
    }

    #[tokio::test]
    async fn session_failure_skips_its_ordinals_only() {
        let backend = InMemoryBackend::new();
        backend.reject_session_creation();
        let mut rec = light_bath(2);
        rec.rod = Some(vec![RodSpec {
            locations: vec!["Joelho".to_string()],
            quantity: 1,
            start_date: date(17),
        }]);

        let outcome = generator().generate(&backend, &rec).await.unwrap();

        assert_eq!(outcome.failures.len(), 2);
        assert!(outcome.failures.iter().all(|f| f.kind == FailureKind::Session));
        assert!(backend.attendances().is_empty());
    }

    #[tokio::test]
    async fn invalid_recommendation_makes_no_calls() {
        let backend = InMemoryBackend::new();
        let mut rec = light_bath(2);
        rec.return_weeks = 60;

        let err = generator().generate(&backend, &rec).await.unwrap_err();

        assert!(matches!(err, ClinicError::Validation { .. }));
        assert_eq!(backend.call_count(), 0);
    }
}
