//! A clinic day from recurrence generation to finalization, through the
//! public API only.

use chrono::{NaiveDate, NaiveTime};
use clinic_flow::api::memory::InMemoryBackend;
use clinic_flow::api::{Attendance, AttendanceStatus};
use clinic_flow::attendance::{
    sync_lane_changes, AttendanceRecord, AttendanceType, ExternalCheckIn, ExternalCheckInMerger,
    Lane, MergeOutcome, MoveOutcome, Priority,
};
use clinic_flow::finalization::{reopen_day, MemoryKeyValueStore};
use clinic_flow::recurrence::{LightBathSpec, TreatmentRecommendation};
use clinic_flow::workflow::{AbsenceJustification, WorkflowStep};
use clinic_flow::{
    AttendanceBoard, ClinicConfig, ClinicError, DayFinalizationStore, EndOfDayWorkflow,
    ProgressionStateMachine, SessionRecurrenceGenerator, StateError,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
}

fn recommendation(return_weeks: u32) -> TreatmentRecommendation {
    TreatmentRecommendation {
        patient_id: 3,
        attendance_id: None,
        attendance_date: day(17),
        return_weeks,
        light_bath: Some(vec![LightBathSpec {
            locations: vec!["Cabeça".to_string()],
            quantity: 2,
            start_date: day(17),
            color: "azul".to_string(),
            duration: 2,
        }]),
        rod: None,
        notes: None,
    }
}

fn board_for(backend: &InMemoryBackend, date: NaiveDate) -> AttendanceBoard {
    let mut machine = ProgressionStateMachine::new(AttendanceBoard::new(date));
    for attendance in backend
        .attendances()
        .into_iter()
        .filter(|a| a.scheduled_date == date)
    {
        machine.schedule(
            AttendanceRecord::scheduled(
                format!("Paciente {}", attendance.patient_id),
                Priority::Standard,
                attendance.attendance_type,
            )
            .with_ids(attendance.id, attendance.patient_id),
        );
    }
    machine.board().clone()
}

#[tokio::test]
async fn out_of_range_return_weeks_makes_no_calls() {
    let backend = InMemoryBackend::new();
    let generator = SessionRecurrenceGenerator::default().with_today(|| day(30));

    let err = generator
        .generate(&backend, &recommendation(60))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("deve estar entre 1 e 52 semanas"));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn full_day_is_finalized_and_reopened() {
    let config = ClinicConfig::from_json_str(r#"{ "recurrence": { "max_quantity": 10 } }"#).unwrap();
    let backend = InMemoryBackend::new();
    backend.seed_attendance(Attendance {
        id: 100,
        patient_id: 7,
        attendance_type: AttendanceType::Spiritual,
        status: AttendanceStatus::Scheduled,
        scheduled_date: day(17),
        scheduled_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        notes: None,
    });

    let generator =
        SessionRecurrenceGenerator::new(config.recurrence.clone()).with_today(|| day(30));
    let outcome = generator
        .generate(&backend, &recommendation(2))
        .await
        .unwrap();
    assert!(outcome.is_complete());

    let mut machine = ProgressionStateMachine::new(board_for(&backend, day(17)));
    let mut store = DayFinalizationStore::with_prefix(
        MemoryKeyValueStore::new(),
        config.finalization.key_prefix.clone(),
    );
    assert_eq!(machine.board().len(), 2);

    // Light bath patient goes through every lane.
    let patient = "Paciente 3";
    let mut changes = Vec::new();
    for lane in [Lane::CheckedIn, Lane::OnGoing, Lane::Completed] {
        let outcome = machine.request_move(AttendanceType::LightBath, patient, lane);
        assert!(outcome.is_applied());
        changes.extend_from_slice(outcome.changes());
    }
    assert!(sync_lane_changes(&backend, &changes).await.is_empty());
    let light_bath_id = machine
        .board()
        .find(AttendanceType::LightBath, patient)
        .and_then(|r| r.attendance_id)
        .unwrap();
    assert_eq!(
        backend.attendance(light_bath_id).unwrap().status,
        AttendanceStatus::Completed
    );

    // Walk-in without an appointment.
    let mut merger = ExternalCheckInMerger::new(config.check_in.default_priority);
    let walk_in = ExternalCheckIn {
        name: "Rui".to_string(),
        types: vec![AttendanceType::Spiritual],
        priority: Some(Priority::Exception),
    };
    assert!(matches!(merger.merge(&mut machine, &walk_in), MergeOutcome::Merged(c) if c.len() == 1));
    assert_eq!(
        merger.merge(&mut machine, &walk_in),
        MergeOutcome::AlreadyProcessed
    );

    let mut workflow = EndOfDayWorkflow::for_machine(&machine, &config.finalization);

    // Rui was checked in but never attended.
    assert!(workflow.next(machine.board()).is_err());
    assert_eq!(workflow.incomplete_attendances(machine.board()).len(), 1);
    assert!(workflow
        .reschedule_attendance(&mut machine, AttendanceType::Spiritual, "Rui")
        .is_applied());
    workflow.next(machine.board()).unwrap();

    let absences = workflow.scheduled_absences(machine.board());
    assert_eq!(absences.len(), 1);
    assert_eq!(absences[0].record.name, "Paciente 7");
    workflow
        .record_justification(AbsenceJustification::justified(
            &absences[0],
            Some("Atestado médico".to_string()),
        ))
        .unwrap();
    assert_eq!(workflow.next(machine.board()).unwrap(), WorkflowStep::Confirmation);

    let preview = workflow.preview(machine.board());
    assert_eq!(preview.completed, 1);
    assert_eq!(preview.justified, 1);

    let summary = workflow
        .finalize(&backend, &mut machine, &mut store)
        .await
        .unwrap();

    assert_eq!(summary.completed_patients, 1);
    assert_eq!(summary.missed_patients, 1);
    assert_eq!(summary.total_patients, 2);
    let mark = backend.missed_mark(100).unwrap();
    assert!(mark.justified);
    assert_eq!(mark.notes.as_deref(), Some("Atestado médico"));
    assert!(store.is_finalized(day(17)));

    // Locked until reopened.
    assert!(matches!(
        machine.request_move(AttendanceType::Spiritual, "Rui", Lane::CheckedIn),
        MoveOutcome::Ignored(StateError::DayFinalized { .. })
    ));
    let again = workflow.finalize(&backend, &mut machine, &mut store).await;
    assert!(matches!(
        again,
        Err(ClinicError::State(StateError::DayFinalized { .. }))
    ));

    reopen_day(&mut store, &mut machine);
    assert!(!store.is_finalized(day(17)));
    assert!(machine
        .request_move(AttendanceType::Spiritual, "Rui", Lane::CheckedIn)
        .is_applied());
}
