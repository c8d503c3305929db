//! Advancement rules for the wizard.
//!
//! Every rule for the current step is evaluated and all violations are
//! accumulated, like transition enforcement, so the screen can list
//! everything still missing.

use crate::workflow::step::WorkflowStep;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GateViolation {
    #[error("{count} atendimento(s) ainda em andamento")]
    IncompleteAttendances { count: usize },

    #[error("Faltas sem justificativa: {recorded} de {expected} registradas")]
    MissingJustifications { expected: usize, recorded: usize },

    #[error("Finalização em andamento")]
    SubmissionInFlight,
}

/// Counts the gate rules look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateInput {
    pub step: WorkflowStep,
    pub incomplete: usize,
    pub absences: usize,
    pub justifications: usize,
    pub submitting: bool,
}

type Check = Validation<(), NonEmptyVec<GateViolation>>;

fn incomplete_rule(input: &GateInput) -> Check {
    if input.incomplete == 0 {
        Validation::success(())
    } else {
        Validation::fail(GateViolation::IncompleteAttendances {
            count: input.incomplete,
        })
    }
}

fn justification_rule(input: &GateInput) -> Check {
    if input.justifications == input.absences {
        Validation::success(())
    } else {
        Validation::fail(GateViolation::MissingJustifications {
            expected: input.absences,
            recorded: input.justifications,
        })
    }
}

/// Whether the wizard may leave `input.step` forward (or finalize, on the
/// confirmation step).
pub fn check_gate(input: &GateInput) -> Validation<(), NonEmptyVec<GateViolation>> {
    let mut checks: Vec<Check> = Vec::new();

    if input.submitting {
        checks.push(Validation::fail(GateViolation::SubmissionInFlight));
    }

    match input.step {
        WorkflowStep::IncompleteAttendances => checks.push(incomplete_rule(input)),
        WorkflowStep::ScheduledAbsences => checks.push(justification_rule(input)),
        WorkflowStep::Confirmation => {
            checks.push(incomplete_rule(input));
            checks.push(justification_rule(input));
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

pub(crate) fn describe(violations: &NonEmptyVec<GateViolation>) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(step: WorkflowStep) -> GateInput {
        GateInput {
            step,
            incomplete: 0,
            absences: 1,
            justifications: 0,
            submitting: false,
        }
    }

    #[test]
    fn step_one_only_looks_at_incomplete() {
        assert!(check_gate(&input(WorkflowStep::IncompleteAttendances)).is_success());

        let blocked = GateInput {
            incomplete: 2,
            ..input(WorkflowStep::IncompleteAttendances)
        };
        assert!(check_gate(&blocked).is_failure());
    }

    #[test]
    fn step_two_needs_one_justification_per_absence() {
        assert!(check_gate(&input(WorkflowStep::ScheduledAbsences)).is_failure());

        let done = GateInput {
            justifications: 1,
            ..input(WorkflowStep::ScheduledAbsences)
        };
        assert!(check_gate(&done).is_success());
    }

    #[test]
    fn confirmation_accumulates_all_violations() {
        let blocked = GateInput {
            incomplete: 1,
            submitting: true,
            ..input(WorkflowStep::Confirmation)
        };

        match check_gate(&blocked) {
            Validation::Failure(violations) => {
                assert_eq!(violations.len(), 3);
                assert!(violations
                    .iter()
                    .any(|v| matches!(v, GateViolation::SubmissionInFlight)));
                assert!(describe(&violations).lines().count() == 3);
            }
            Validation::Success(_) => panic!("Expected failures, got success"),
        }
    }
}
