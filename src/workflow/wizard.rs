//! The end-of-day wizard.

use crate::api::AttendanceApi;
use crate::attendance::{
    get_completed_attendances, get_incomplete_attendances, get_scheduled_absences,
    AttendanceBoard, AttendanceKey, AttendanceType, MoveOutcome, ProgressionStateMachine,
    TaggedAttendance,
};
use crate::config::FinalizationConfig;
use crate::core::{State, StateHistory, StateTransition};
use crate::error::{ClinicError, StateError};
use crate::finalization::{DayFinalizationStore, KeyValueStore};
use crate::workflow::gate::{check_gate, describe, GateInput};
use crate::workflow::step::WorkflowStep;
use crate::workflow::summary::{
    AbsenceJustification, CompletionSummary, DayPreview, MissedAttendance,
};
use chrono::{NaiveDate, Utc};
use std::collections::{BTreeMap, BTreeSet};
use stillwater::validation::Validation;
use tracing::{debug, info, warn};

/// Three gated steps that reconcile a day before locking it.
///
/// 1. Incomplete attendances: complete or reschedule every started record.
/// 2. Scheduled absences: one justified/unjustified decision per absence.
/// 3. Confirmation: finalize.
///
/// While a finalize call is in flight the wizard refuses further finalize
/// calls, backward navigation and edits. The wizard belongs to one date and
/// refuses boards of any other.
#[derive(Debug)]
pub struct EndOfDayWorkflow {
    date: NaiveDate,
    step: WorkflowStep,
    history: StateHistory<WorkflowStep>,
    justifications: BTreeMap<AttendanceKey, AbsenceJustification>,
    rescheduled: BTreeSet<AttendanceKey>,
    /// Absences already marked missed on the backend, kept across retries.
    closed: BTreeMap<AttendanceKey, MissedAttendance>,
    submitting: bool,
    summary: Option<CompletionSummary>,
    unjustified_note: String,
}

impl EndOfDayWorkflow {
    pub fn new(date: NaiveDate) -> Self {
        Self::with_config(date, &FinalizationConfig::default())
    }

    pub fn with_config(date: NaiveDate, config: &FinalizationConfig) -> Self {
        Self {
            date,
            step: WorkflowStep::IncompleteAttendances,
            history: StateHistory::new(),
            justifications: BTreeMap::new(),
            rescheduled: BTreeSet::new(),
            closed: BTreeMap::new(),
            submitting: false,
            summary: None,
            unjustified_note: config.unjustified_note.clone(),
        }
    }

    /// Wizard for the date of the machine's current board.
    pub fn for_machine(machine: &ProgressionStateMachine, config: &FinalizationConfig) -> Self {
        Self::with_config(machine.board().date(), config)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn step(&self) -> WorkflowStep {
        self.step
    }

    pub fn history(&self) -> &StateHistory<WorkflowStep> {
        &self.history
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn summary(&self) -> Option<&CompletionSummary> {
        self.summary.as_ref()
    }

    /// Step 1 list.
    pub fn incomplete_attendances(&self, board: &AttendanceBoard) -> Vec<TaggedAttendance> {
        get_incomplete_attendances(board)
    }

    /// Step 2 list: scheduled records minus those rescheduled in step 1.
    pub fn scheduled_absences(&self, board: &AttendanceBoard) -> Vec<TaggedAttendance> {
        get_scheduled_absences(board)
            .into_iter()
            .filter(|absence| !self.rescheduled.contains(&absence.key()))
            .collect()
    }

    pub fn justification(&self, key: &AttendanceKey) -> Option<&AbsenceJustification> {
        self.justifications.get(key)
    }

    /// Justifications that match a current absence.
    pub fn recorded_justifications(&self, board: &AttendanceBoard) -> usize {
        self.scheduled_absences(board)
            .iter()
            .filter(|absence| self.justifications.contains_key(&absence.key()))
            .count()
    }

    fn ensure_idle(&self) -> Result<(), StateError> {
        if self.submitting {
            Err(StateError::SubmissionInFlight)
        } else {
            Ok(())
        }
    }

    fn ensure_same_day(&self, board: &AttendanceBoard) -> Result<(), StateError> {
        if board.date() == self.date {
            Ok(())
        } else {
            Err(StateError::DateMismatch {
                workflow: self.date,
                board: board.date(),
            })
        }
    }

    fn ensure_editable(&self, board: &AttendanceBoard) -> Result<(), StateError> {
        self.ensure_idle()?;
        self.ensure_same_day(board)
    }

    /// Step 1 "Complete".
    pub fn complete_attendance(
        &mut self,
        machine: &mut ProgressionStateMachine,
        attendance_type: AttendanceType,
        name: &str,
    ) -> MoveOutcome {
        if let Err(error) = self.ensure_editable(machine.board()) {
            return MoveOutcome::Ignored(error);
        }
        machine.complete(attendance_type, name)
    }

    /// Step 1 "Reschedule": back to `scheduled`, and off the absence list.
    pub fn reschedule_attendance(
        &mut self,
        machine: &mut ProgressionStateMachine,
        attendance_type: AttendanceType,
        name: &str,
    ) -> MoveOutcome {
        if let Err(error) = self.ensure_editable(machine.board()) {
            return MoveOutcome::Ignored(error);
        }
        let outcome = machine.reschedule(attendance_type, name);
        if outcome.is_applied() {
            self.rescheduled
                .insert(AttendanceKey::new(attendance_type, name));
        }
        outcome
    }

    /// Step 2 decision. A later decision for the same absence replaces it,
    /// unless that absence was already marked missed by an earlier finalize.
    pub fn record_justification(
        &mut self,
        justification: AbsenceJustification,
    ) -> Result<(), ClinicError> {
        self.ensure_idle()?;
        let key = justification.key();
        if self.closed.contains_key(&key) {
            return Err(ClinicError::Validation {
                message: format!("Falta de {} já registrada", key.name),
            });
        }
        debug!(
            name = %justification.name,
            justified = justification.justified,
            "Absence justification recorded"
        );
        self.justifications.insert(key, justification);
        Ok(())
    }

    fn gate_input(&self, board: &AttendanceBoard) -> GateInput {
        GateInput {
            step: self.step,
            incomplete: self.incomplete_attendances(board).len(),
            absences: self.scheduled_absences(board).len(),
            justifications: self.recorded_justifications(board),
            submitting: self.submitting,
        }
    }

    fn gate(&self, board: &AttendanceBoard) -> Result<(), ClinicError> {
        self.ensure_same_day(board)?;
        match check_gate(&self.gate_input(board)) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(violations) => Err(ClinicError::Gate(describe(&violations))),
        }
    }

    /// Whether "Next" (or "Finalize" on step 3) is enabled.
    pub fn can_advance(&self, board: &AttendanceBoard) -> bool {
        self.gate(board).is_ok()
    }

    fn enter(&mut self, to: WorkflowStep) {
        self.history = self.history.record(StateTransition {
            from: self.step,
            to,
            timestamp: Utc::now(),
            confirmed: false,
        });
        self.step = to;
    }

    pub fn next(&mut self, board: &AttendanceBoard) -> Result<WorkflowStep, ClinicError> {
        let Some(to) = self.step.next() else {
            return Err(ClinicError::Gate(format!(
                "{} é o último passo",
                self.step.name()
            )));
        };
        self.gate(board)?;
        self.enter(to);
        Ok(to)
    }

    /// Step back. Always allowed except while finalizing.
    pub fn back(&mut self) -> Result<WorkflowStep, ClinicError> {
        self.ensure_idle()?;
        if let Some(to) = self.step.previous() {
            self.enter(to);
        }
        Ok(self.step)
    }

    pub fn preview(&self, board: &AttendanceBoard) -> DayPreview {
        let absences = self.scheduled_absences(board);
        let justified = absences
            .iter()
            .filter(|a| {
                self.justifications
                    .get(&a.key())
                    .is_some_and(|j| j.justified)
            })
            .count();
        let completed = get_completed_attendances(board).len();
        let incomplete = self.incomplete_attendances(board).len();
        DayPreview {
            total: completed + incomplete + absences.len(),
            completed,
            incomplete,
            absences: absences.len(),
            justified,
            unjustified: absences.len() - justified,
        }
    }

    /// How each current absence will be closed.
    fn absence_marks(&self, board: &AttendanceBoard) -> Vec<MissedAttendance> {
        self.scheduled_absences(board)
            .into_iter()
            .map(|absence| {
                let key = absence.key();
                let (justified, notes) = match self.justifications.get(&key) {
                    Some(j) if j.justified => (true, j.notes.clone()),
                    _ => (false, Some(self.unjustified_note.clone())),
                };
                MissedAttendance {
                    key,
                    attendance_id: absence.record.attendance_id,
                    justified,
                    notes,
                }
            })
            .collect()
    }

    /// Close every absence on the backend, then lock the day.
    ///
    /// On success the day's flag is stored as finalized and the machine
    /// becomes read-only; callers should reload the board afterwards. On
    /// failure nothing is locked and the call may be repeated: absences
    /// closed by an earlier attempt are not sent again.
    ///
    /// The in-flight flag is released when the call returns or when its
    /// future is dropped unfinished.
    pub async fn finalize<A, K>(
        &mut self,
        api: &A,
        machine: &mut ProgressionStateMachine,
        store: &mut DayFinalizationStore<K>,
    ) -> Result<CompletionSummary, ClinicError>
    where
        A: AttendanceApi + ?Sized,
        K: KeyValueStore,
    {
        self.ensure_editable(machine.board())?;
        if self.step != WorkflowStep::Confirmation {
            return Err(ClinicError::Gate(format!(
                "Finalização disponível apenas em {}",
                WorkflowStep::Confirmation.name()
            )));
        }
        if machine.is_finalized() {
            return Err(StateError::DayFinalized { date: self.date }.into());
        }
        self.gate(machine.board())?;

        let marks = self.absence_marks(machine.board());
        let completed = get_completed_attendances(machine.board()).len();
        info!(date = %self.date, absences = marks.len(), "Finalizing day");

        let failures = {
            let _submission = Submission::begin(&mut self.submitting);
            let mut failures = Vec::new();
            for mark in &marks {
                if self.closed.contains_key(&mark.key) {
                    debug!(name = %mark.key.name, "Absence closed by an earlier attempt");
                    continue;
                }
                if let Some(id) = mark.attendance_id {
                    let sent = api
                        .mark_as_missed(id, mark.justified, mark.notes.clone())
                        .await;
                    if let Err(error) = sent {
                        warn!(attendance_id = id, %error, "Absence not recorded");
                        failures.push(format!(
                            "{} ({}): {}",
                            mark.key.name, mark.key.attendance_type, error
                        ));
                        continue;
                    }
                } else {
                    debug!(name = %mark.key.name, "Absence has no backend attendance");
                }
                self.closed.insert(mark.key.clone(), mark.clone());
            }
            failures
        };

        if !failures.is_empty() {
            let error = ClinicError::Aggregate(failures.join("\n"));
            warn!(date = %self.date, %error, "Finalization failed");
            return Err(error);
        }

        let missed: Vec<MissedAttendance> = marks
            .iter()
            .filter_map(|mark| self.closed.get(&mark.key).cloned())
            .collect();
        let summary = CompletionSummary {
            total_patients: completed + missed.len(),
            completed_patients: completed,
            missed_patients: missed.len(),
            completion_time: Utc::now(),
            missed,
        };

        store.set_finalized(self.date, true);
        machine.set_finalized(true);
        self.summary = Some(summary.clone());
        info!(
            date = %self.date,
            completed = summary.completed_patients,
            missed = summary.missed_patients,
            "Day finalized"
        );
        Ok(summary)
    }
}

/// Holds the in-flight flag for the duration of a finalize call.
struct Submission<'a> {
    flag: &'a mut bool,
}

impl<'a> Submission<'a> {
    fn begin(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }
}

impl Drop for Submission<'_> {
    fn drop(&mut self) {
        *self.flag = false;
    }
}
