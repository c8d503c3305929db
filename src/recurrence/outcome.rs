//! Multi-error accumulator for recurrence batches.

use crate::api::TreatmentType;
use crate::error::ClinicError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// The treatment session itself could not be created.
    Session,
    /// The appointment was rejected.
    Conflict,
    /// The appointment exists but the session record was not linked.
    Link,
}

/// One failed step of a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceFailure {
    pub treatment_type: TreatmentType,
    pub course: String,
    /// `None` for session-level failures.
    pub ordinal: Option<u32>,
    pub date: NaiveDate,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for OccurrenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ordinal = self.ordinal.unwrap_or(0);
        match self.kind {
            FailureKind::Session => write!(
                f,
                "Erro ao criar sessão de {} iniciando em {}: {}",
                self.course, self.date, self.message
            ),
            FailureKind::Conflict => write!(
                f,
                "Erro ao agendar sessão {} de {} em {}: {}",
                ordinal, self.course, self.date, self.message
            ),
            FailureKind::Link => write!(
                f,
                "Erro ao vincular sessão {} de {} em {}: {}",
                ordinal, self.course, self.date, self.message
            ),
        }
    }
}

impl OccurrenceFailure {
    pub fn to_error(&self) -> ClinicError {
        match self.kind {
            FailureKind::Conflict => ClinicError::Conflict(self.to_string()),
            FailureKind::Link => ClinicError::Link(self.to_string()),
            FailureKind::Session => ClinicError::Backend(self.to_string()),
        }
    }
}

/// An ordinal that produced both an appointment and its session record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOccurrence {
    pub treatment_session_id: u64,
    pub ordinal: u32,
    pub date: NaiveDate,
    pub attendance_id: u64,
    pub record_id: u64,
}

/// Everything a batch produced: successes and failures side by side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceOutcome {
    /// Treatment sessions created, in creation order.
    pub session_ids: Vec<u64>,
    pub occurrences: Vec<CreatedOccurrence>,
    pub failures: Vec<OccurrenceFailure>,
}

impl RecurrenceOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Ordinals created for `treatment_session_id`, in order.
    pub fn ordinals_for(&self, treatment_session_id: u64) -> Vec<u32> {
        self.occurrences
            .iter()
            .filter(|o| o.treatment_session_id == treatment_session_id)
            .map(|o| o.ordinal)
            .collect()
    }

    /// All failures as one error, one line per failure.
    pub fn aggregate_error(&self) -> Option<ClinicError> {
        if self.failures.is_empty() {
            return None;
        }
        let message = self
            .failures
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Some(ClinicError::Aggregate(message))
    }

    /// `Ok` with the session ids when nothing failed, otherwise the aggregate
    /// error alongside the ids that were created anyway.
    pub fn into_result(self) -> Result<Vec<u64>, (ClinicError, Vec<u64>)> {
        match self.aggregate_error() {
            None => Ok(self.session_ids),
            Some(error) => Err((error, self.session_ids)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(ordinal: u32, kind: FailureKind) -> OccurrenceFailure {
        OccurrenceFailure {
            treatment_type: TreatmentType::Rod,
            course: "Bastão (Coluna)".to_string(),
            ordinal: Some(ordinal),
            date: NaiveDate::from_ymd_opt(2025, 9, 24).unwrap(),
            kind,
            message: "Horário indisponível".to_string(),
        }
    }

    #[test]
    fn empty_outcome_has_no_error() {
        let outcome = RecurrenceOutcome::default();
        assert!(outcome.is_complete());
        assert!(outcome.aggregate_error().is_none());
        assert_eq!(outcome.into_result(), Ok(vec![]));
    }

    #[test]
    fn aggregate_names_every_failure_on_its_own_line() {
        let outcome = RecurrenceOutcome {
            session_ids: vec![5],
            occurrences: vec![],
            failures: vec![failure(2, FailureKind::Conflict), failure(3, FailureKind::Link)],
        };

        let Some(ClinicError::Aggregate(message)) = outcome.aggregate_error() else {
            panic!("Expected aggregate error");
        };
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("sessão 2") && lines[0].contains("2025-09-24"));
        assert!(lines[1].starts_with("Erro ao vincular sessão 3"));
    }

    #[test]
    fn into_result_keeps_ids_on_failure() {
        let outcome = RecurrenceOutcome {
            session_ids: vec![5, 9],
            occurrences: vec![],
            failures: vec![failure(1, FailureKind::Conflict)],
        };

        let (error, ids) = outcome.into_result().unwrap_err();
        assert_eq!(ids, vec![5, 9]);
        assert!(matches!(error, ClinicError::Aggregate(_)));
    }

    #[test]
    fn failure_kinds_map_to_taxonomy() {
        assert!(matches!(
            failure(1, FailureKind::Conflict).to_error(),
            ClinicError::Conflict(_)
        ));
        assert!(matches!(failure(1, FailureKind::Link).to_error(), ClinicError::Link(_)));
    }
}
