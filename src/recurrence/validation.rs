//! Preconditions of a treatment recommendation.
//!
//! All checks run and every violation is collected with stillwater's
//! `Validation`, so the practitioner sees the whole list at once. Nothing
//! here touches the backend.

use crate::config::RecurrenceConfig;
use crate::error::ClinicError;
use crate::recurrence::types::TreatmentRecommendation;
use chrono::NaiveDate;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationIssue {
    #[error("Semanas para retorno deve estar entre {min} e {max} semanas")]
    ReturnWeeks { min: u32, max: u32 },

    #[error("Data do atendimento não pode estar no futuro")]
    AttendanceDateInFuture,

    #[error("{course} {index}: selecione ao menos um local")]
    NoLocation { course: &'static str, index: usize },

    #[error("{course} {index}: quantidade deve estar entre 1 e {max}")]
    Quantity {
        course: &'static str,
        index: usize,
        max: u32,
    },

    #[error("{course} {index}: duração deve estar entre {min} e {max}")]
    Duration {
        course: &'static str,
        index: usize,
        min: u8,
        max: u8,
    },

    #[error("{course} {index}: data de início não pode estar no futuro")]
    StartDateInFuture { course: &'static str, index: usize },
}

type Check = Validation<(), NonEmptyVec<ValidationIssue>>;

fn require(ok: bool, issue: ValidationIssue) -> Check {
    if ok {
        Validation::success(())
    } else {
        Validation::fail(issue)
    }
}

const LIGHT_BATH: &str = "Banho de luz";
const ROD: &str = "Bastão";

/// Run every check, accumulating all violations.
pub fn check_recommendation(
    recommendation: &TreatmentRecommendation,
    today: NaiveDate,
    config: &RecurrenceConfig,
) -> Validation<(), NonEmptyVec<ValidationIssue>> {
    let mut checks: Vec<Check> = Vec::new();

    checks.push(require(
        (config.min_return_weeks..=config.max_return_weeks).contains(&recommendation.return_weeks),
        ValidationIssue::ReturnWeeks {
            min: config.min_return_weeks,
            max: config.max_return_weeks,
        },
    ));
    checks.push(require(
        recommendation.attendance_date <= today,
        ValidationIssue::AttendanceDateInFuture,
    ));

    for (i, spec) in recommendation.light_bath.iter().flatten().enumerate() {
        let index = i + 1;
        checks.push(require(
            !spec.locations.is_empty(),
            ValidationIssue::NoLocation {
                course: LIGHT_BATH,
                index,
            },
        ));
        checks.push(require(
            (config.min_duration..=config.max_duration).contains(&spec.duration),
            ValidationIssue::Duration {
                course: LIGHT_BATH,
                index,
                min: config.min_duration,
                max: config.max_duration,
            },
        ));
        checks.push(require(
            (1..=config.max_quantity).contains(&spec.quantity),
            ValidationIssue::Quantity {
                course: LIGHT_BATH,
                index,
                max: config.max_quantity,
            },
        ));
        checks.push(require(
            spec.start_date <= today,
            ValidationIssue::StartDateInFuture {
                course: LIGHT_BATH,
                index,
            },
        ));
    }

    for (i, spec) in recommendation.rod.iter().flatten().enumerate() {
        let index = i + 1;
        checks.push(require(
            !spec.locations.is_empty(),
            ValidationIssue::NoLocation { course: ROD, index },
        ));
        checks.push(require(
            (1..=config.max_quantity).contains(&spec.quantity),
            ValidationIssue::Quantity {
                course: ROD,
                index,
                max: config.max_quantity,
            },
        ));
        checks.push(require(
            spec.start_date <= today,
            ValidationIssue::StartDateInFuture { course: ROD, index },
        ));
    }

    Validation::all_vec(checks).map(|_| ())
}

/// [`check_recommendation`] folded into a single `ClinicError::Validation`.
pub fn validate_recommendation(
    recommendation: &TreatmentRecommendation,
    today: NaiveDate,
    config: &RecurrenceConfig,
) -> Result<(), ClinicError> {
    match check_recommendation(recommendation, today, config) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(issues) => Err(ClinicError::Validation {
            message: issues
                .iter()
                .map(|issue| issue.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        }),
    }
}
