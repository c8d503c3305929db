//! Lane progression for attendance records.
//!
//! Forward moves of one lane apply immediately. Backward moves and lane
//! skips wait for a simple confirmation. Checking in a patient who is also
//! waiting in another type's `scheduled` lane waits for a multi-section
//! confirmation: accepting checks the patient in everywhere at once,
//! declining checks in only the originating lane.
//!
//! Once the board is finalized every mutating call is a logged no-op.

use crate::attendance::board::AttendanceBoard;
use crate::attendance::types::{AttendanceRecord, AttendanceType, Lane, Movement, Priority};
use crate::error::StateError;
use crate::finalization::{DayFinalizationStore, KeyValueStore};
use chrono::{Local, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A requested move of one record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMove {
    pub attendance_type: AttendanceType,
    pub name: String,
    pub from: Lane,
    pub to: Lane,
}

/// Confirmation state of the machine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Confirmation {
    #[default]
    Idle,
    AwaitingSimpleConfirm(PendingMove),
    AwaitingMultiSectionConfirm {
        primary: PendingMove,
        siblings: Vec<AttendanceType>,
    },
}

impl Confirmation {
    pub fn is_idle(&self) -> bool {
        matches!(self, Confirmation::Idle)
    }
}

/// Answer to a pending confirmation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Decline,
}

/// A move that was applied to the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneChange {
    pub attendance_type: AttendanceType,
    pub name: String,
    pub attendance_id: Option<u64>,
    pub from: Lane,
    pub to: Lane,
}

/// Result of a progression request.
#[derive(Clone, Debug, PartialEq)]
pub enum MoveOutcome {
    /// The board changed.
    Applied(Vec<LaneChange>),
    /// The move waits for [`ProgressionStateMachine::resolve`].
    AwaitingConfirmation,
    /// A simple confirmation was declined.
    Declined,
    /// Target equals the current lane.
    Unchanged,
    /// The action could not apply and was dropped.
    Ignored(StateError),
}

impl MoveOutcome {
    pub fn changes(&self) -> &[LaneChange] {
        match self {
            MoveOutcome::Applied(changes) => changes,
            _ => &[],
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, MoveOutcome::Applied(_))
    }
}

fn local_now() -> NaiveTime {
    Local::now().time()
}

/// Owner of the day's [`AttendanceBoard`] and the only path that mutates it.
pub struct ProgressionStateMachine {
    board: AttendanceBoard,
    pending: Confirmation,
    clock: fn() -> NaiveTime,
}

impl ProgressionStateMachine {
    pub fn new(board: AttendanceBoard) -> Self {
        Self {
            board,
            pending: Confirmation::Idle,
            clock: local_now,
        }
    }

    /// Use a fixed clock for lane timestamps.
    pub fn with_clock(mut self, clock: fn() -> NaiveTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn board(&self) -> &AttendanceBoard {
        &self.board
    }

    pub fn pending(&self) -> &Confirmation {
        &self.pending
    }

    pub fn is_finalized(&self) -> bool {
        self.board.is_finalized()
    }

    pub(crate) fn now(&self) -> NaiveTime {
        (self.clock)()
    }

    /// Swap in the board of another date, reading its finalization flag.
    pub fn replace_board<K: KeyValueStore>(
        &mut self,
        mut board: AttendanceBoard,
        store: &DayFinalizationStore<K>,
    ) {
        board.set_finalized(store.is_finalized(board.date()));
        debug!(date = %board.date(), finalized = board.is_finalized(), "Board loaded");
        self.board = board;
        self.pending = Confirmation::Idle;
    }

    pub(crate) fn set_finalized(&mut self, finalized: bool) {
        self.board.set_finalized(finalized);
        self.pending = Confirmation::Idle;
    }

    fn ignore(&self, error: StateError) -> MoveOutcome {
        warn!(date = %self.board.date(), %error, "Board action ignored");
        MoveOutcome::Ignored(error)
    }

    fn finalized_error(&self) -> StateError {
        StateError::DayFinalized {
            date: self.board.date(),
        }
    }

    /// Add a record to the board in its own lane.
    ///
    /// A name already present anywhere in the record's type is left alone.
    pub fn schedule(&mut self, record: AttendanceRecord) -> MoveOutcome {
        if self.board.is_finalized() {
            return self.ignore(self.finalized_error());
        }
        if self.board.lane_of(record.attendance_type, &record.name).is_some() {
            return MoveOutcome::Unchanged;
        }
        let change = LaneChange {
            attendance_type: record.attendance_type,
            name: record.name.clone(),
            attendance_id: record.attendance_id,
            from: record.lane,
            to: record.lane,
        };
        self.board.insert(record);
        MoveOutcome::Applied(vec![change])
    }

    /// Schedule a patient for the day's treatments.
    ///
    /// Light bath and rod on the same day collapse into one `combined` record.
    pub fn schedule_patient(
        &mut self,
        name: &str,
        priority: Priority,
        spiritual: bool,
        light_bath: bool,
        rod: bool,
    ) -> Vec<LaneChange> {
        let mut types = Vec::new();
        if spiritual {
            types.push(AttendanceType::Spiritual);
        }
        types.extend(AttendanceType::for_treatments(light_bath, rod));

        let mut changes = Vec::new();
        for attendance_type in types {
            let outcome = self.schedule(AttendanceRecord::scheduled(name, priority, attendance_type));
            changes.extend_from_slice(outcome.changes());
        }
        changes
    }

    /// Request moving `name` within `attendance_type` to `to`.
    pub fn request_move(&mut self, attendance_type: AttendanceType, name: &str, to: Lane) -> MoveOutcome {
        if self.board.is_finalized() {
            return self.ignore(self.finalized_error());
        }
        if !self.pending.is_idle() {
            return self.ignore(StateError::ConfirmationPending);
        }
        let Some(from) = self.board.lane_of(attendance_type, name) else {
            return self.ignore(StateError::RecordNotFound {
                attendance_type,
                name: name.to_string(),
                lane: None,
            });
        };

        let mv = PendingMove {
            attendance_type,
            name: name.to_string(),
            from,
            to,
        };

        match Movement::between(from, to) {
            Movement::Stay => MoveOutcome::Unchanged,
            Movement::Skip | Movement::Backward => {
                debug!(?mv, "Move awaiting confirmation");
                self.pending = Confirmation::AwaitingSimpleConfirm(mv);
                MoveOutcome::AwaitingConfirmation
            }
            Movement::Forward => {
                if from == Lane::Scheduled && to == Lane::CheckedIn {
                    let siblings = self.board.concurrent_scheduled(attendance_type, name);
                    if !siblings.is_empty() {
                        debug!(?mv, ?siblings, "Check-in awaiting multi-section confirmation");
                        self.pending = Confirmation::AwaitingMultiSectionConfirm {
                            primary: mv,
                            siblings,
                        };
                        return MoveOutcome::AwaitingConfirmation;
                    }
                }
                self.apply(vec![mv], false)
            }
        }
    }

    /// Settle the pending confirmation.
    pub fn resolve(&mut self, decision: Decision) -> MoveOutcome {
        if self.board.is_finalized() {
            self.pending = Confirmation::Idle;
            return self.ignore(self.finalized_error());
        }
        match std::mem::take(&mut self.pending) {
            Confirmation::Idle => self.ignore(StateError::NothingToConfirm),
            Confirmation::AwaitingSimpleConfirm(mv) => match decision {
                Decision::Accept => self.apply(vec![mv], true),
                Decision::Decline => MoveOutcome::Declined,
            },
            Confirmation::AwaitingMultiSectionConfirm { primary, siblings } => {
                let name = primary.name.clone();
                let mut moves = vec![primary];
                if decision == Decision::Accept {
                    moves.extend(siblings.into_iter().map(|attendance_type| PendingMove {
                        attendance_type,
                        name: name.clone(),
                        from: Lane::Scheduled,
                        to: Lane::CheckedIn,
                    }));
                }
                self.apply(moves, decision == Decision::Accept)
            }
        }
    }

    /// Move a started record straight to `completed`.
    pub fn complete(&mut self, attendance_type: AttendanceType, name: &str) -> MoveOutcome {
        self.force(attendance_type, name, Lane::Completed, Lane::is_incomplete)
    }

    /// Send a started record back to `scheduled`.
    pub fn reschedule(&mut self, attendance_type: AttendanceType, name: &str) -> MoveOutcome {
        self.force(attendance_type, name, Lane::Scheduled, Lane::is_incomplete)
    }

    /// Check a patient in, inserting a fresh record when none exists.
    pub(crate) fn check_in(
        &mut self,
        attendance_type: AttendanceType,
        name: &str,
        priority: Priority,
    ) -> MoveOutcome {
        if self.board.is_finalized() {
            return self.ignore(self.finalized_error());
        }
        match self.board.lane_of(attendance_type, name) {
            Some(Lane::Scheduled) => self.apply(
                vec![PendingMove {
                    attendance_type,
                    name: name.to_string(),
                    from: Lane::Scheduled,
                    to: Lane::CheckedIn,
                }],
                false,
            ),
            Some(_) => MoveOutcome::Unchanged,
            None => {
                let mut record = AttendanceRecord::scheduled(name, priority, attendance_type);
                record.enter_lane(Lane::CheckedIn, self.now(), false);
                let change = LaneChange {
                    attendance_type,
                    name: name.to_string(),
                    attendance_id: None,
                    from: Lane::Scheduled,
                    to: Lane::CheckedIn,
                };
                if self.board.insert(record) {
                    info!(%attendance_type, name, "Walk-in checked in");
                    MoveOutcome::Applied(vec![change])
                } else {
                    MoveOutcome::Unchanged
                }
            }
        }
    }

    fn force(
        &mut self,
        attendance_type: AttendanceType,
        name: &str,
        to: Lane,
        allowed_from: fn(Lane) -> bool,
    ) -> MoveOutcome {
        if self.board.is_finalized() {
            return self.ignore(self.finalized_error());
        }
        match self.board.lane_of(attendance_type, name) {
            Some(from) if allowed_from(from) => self.apply(
                vec![PendingMove {
                    attendance_type,
                    name: name.to_string(),
                    from,
                    to,
                }],
                true,
            ),
            lane => self.ignore(StateError::RecordNotFound {
                attendance_type,
                name: name.to_string(),
                lane,
            }),
        }
    }

    /// Apply every move or none of them.
    fn apply(&mut self, moves: Vec<PendingMove>, confirmed: bool) -> MoveOutcome {
        if let Some(missing) = moves
            .iter()
            .find(|mv| !self.board.contains(mv.attendance_type, mv.from, &mv.name))
        {
            return self.ignore(StateError::RecordNotFound {
                attendance_type: missing.attendance_type,
                name: missing.name.clone(),
                lane: Some(missing.from),
            });
        }

        let at = self.now();
        let mut changes = Vec::with_capacity(moves.len());
        for mv in moves {
            let Some(mut record) = self.board.take(mv.attendance_type, mv.from, &mv.name) else {
                continue;
            };
            record.enter_lane(mv.to, at, confirmed);
            let change = LaneChange {
                attendance_type: mv.attendance_type,
                name: mv.name,
                attendance_id: record.attendance_id,
                from: mv.from,
                to: mv.to,
            };
            self.board.insert(record);
            info!(
                attendance_type = %change.attendance_type,
                name = %change.name,
                from = ?change.from,
                to = ?change.to,
                "Lane change applied"
            );
            changes.push(change);
        }
        MoveOutcome::Applied(changes)
    }
}
