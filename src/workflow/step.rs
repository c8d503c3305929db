//! Wizard steps of the end-of-day workflow.

use crate::core::State;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkflowStep {
    IncompleteAttendances,
    ScheduledAbsences,
    Confirmation,
}

impl WorkflowStep {
    pub fn number(self) -> u8 {
        match self {
            WorkflowStep::IncompleteAttendances => 1,
            WorkflowStep::ScheduledAbsences => 2,
            WorkflowStep::Confirmation => 3,
        }
    }

    pub fn next(self) -> Option<WorkflowStep> {
        match self {
            WorkflowStep::IncompleteAttendances => Some(WorkflowStep::ScheduledAbsences),
            WorkflowStep::ScheduledAbsences => Some(WorkflowStep::Confirmation),
            WorkflowStep::Confirmation => None,
        }
    }

    pub fn previous(self) -> Option<WorkflowStep> {
        match self {
            WorkflowStep::IncompleteAttendances => None,
            WorkflowStep::ScheduledAbsences => Some(WorkflowStep::IncompleteAttendances),
            WorkflowStep::Confirmation => Some(WorkflowStep::ScheduledAbsences),
        }
    }
}

impl State for WorkflowStep {
    fn name(&self) -> &str {
        match self {
            WorkflowStep::IncompleteAttendances => "Atendimentos incompletos",
            WorkflowStep::ScheduledAbsences => "Faltas agendadas",
            WorkflowStep::Confirmation => "Confirmação",
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, WorkflowStep::Confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_link_in_order() {
        let mut step = WorkflowStep::IncompleteAttendances;
        let mut seen = vec![step.number()];
        while let Some(next) = step.next() {
            assert_eq!(next.previous(), Some(step));
            step = next;
            seen.push(step.number());
        }
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(step.is_final());
    }
}
