//! Per-operation state machine.
//!
//! ```text
//!   Issued ──▶ InProgress (0..n) ──▶ Completed | Failed | Canceled
//!      └──────────────────────────────▶┘
//! ```
//!
//! Every native trigger routed to a live operation yields at most one
//! [`Notification`]. A terminal notification is produced exactly once and
//! nothing follows it.

use core::fmt;

use crate::app::events::Notification;
use crate::error::NativeError;
use crate::model::{PackState, PackStates, PackStatus};

/// Activity result code for an accepted cellular confirmation.
pub const RESULT_OK: i32 = -1;
/// Activity result code for a denied cellular confirmation.
pub const RESULT_CANCELED: i32 = 0;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Correlates a request with its stream of notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Fetch,
    RemovePack,
    GetPackStates,
    CellularConfirmation,
}

impl OperationKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::RemovePack => "removePack",
            Self::GetPackStates => "getPackStates",
            Self::CellularConfirmation => "showCellularDataConfirmation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Issued,
    InProgress,
    Completed,
    Failed,
    Canceled,
}

impl Phase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// What a trigger did to an operation.
#[derive(Debug)]
pub(crate) enum Step {
    Emit(Notification),
    /// Carried nothing new; dropped by progress coalescing.
    Coalesced,
    /// The operation does not track this pack, or is already terminal.
    Ignored,
}

#[derive(Debug)]
pub(crate) struct Operation {
    id: OperationId,
    kind: OperationKind,
    phase: Phase,
    /// Packs named in the request, in request order.
    packs: Vec<String>,
    /// Fetch only: latest known state of each requested pack.
    snapshot: PackStates,
    completion_pending: bool,
}

impl Operation {
    pub(crate) fn new(id: OperationId, kind: OperationKind, packs: Vec<String>) -> Self {
        let snapshot = match kind {
            OperationKind::Fetch => packs.iter().map(PackState::unknown).collect(),
            _ => PackStates::new(),
        };
        Self {
            id,
            kind,
            phase: Phase::Issued,
            packs,
            snapshot,
            completion_pending: true,
        }
    }

    pub(crate) fn kind(&self) -> OperationKind {
        self.kind
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn is_live(&self) -> bool {
        !self.phase.is_terminal()
    }

    /// Terminal and no native completion still owed.
    pub(crate) fn is_finished(&self) -> bool {
        self.phase.is_terminal() && !self.completion_pending
    }

    pub(crate) fn completion_pending(&self) -> bool {
        self.completion_pending
    }

    pub(crate) fn tracks(&self, pack: &str) -> bool {
        self.packs.iter().any(|p| p == pack)
    }

    // ── Fetch ─────────────────────────────────────────────────

    /// A listener update for one pack.
    pub(crate) fn observe(&mut self, state: &PackState, coalesce: bool) -> Step {
        if self.kind != OperationKind::Fetch || !self.is_live() || !self.tracks(&state.name) {
            return Step::Ignored;
        }
        if coalesce && self.snapshot.get(&state.name) == Some(state) {
            return Step::Coalesced;
        }
        self.snapshot.insert(state.clone());
        Step::Emit(self.fetch_step())
    }

    /// The fetch task finished: either the request was acknowledged with
    /// current states, or it failed outright.
    pub(crate) fn complete_fetch(&mut self, result: Result<Vec<PackState>, NativeError>, coalesce: bool) -> Step {
        self.completion_pending = false;
        if !self.is_live() {
            return Step::Ignored;
        }
        match result {
            Err(e) => {
                self.phase = Phase::Failed;
                Step::Emit(Notification::FetchError {
                    op: self.id,
                    pack_name: None,
                    error_code: e.error_code,
                    message: e.message,
                })
            }
            Ok(states) => {
                let tracked: Vec<PackState> = states
                    .into_iter()
                    .filter(|s| self.tracks(&s.name))
                    .collect();
                let mut changed = false;
                for state in tracked {
                    if self.snapshot.get(&state.name) != Some(&state) {
                        changed = true;
                        self.snapshot.insert(state);
                    }
                }
                if coalesce && !changed && self.phase == Phase::InProgress {
                    return Step::Coalesced;
                }
                Step::Emit(self.fetch_step())
            }
        }
    }

    /// Decide the fetch notification for the current snapshot.
    fn fetch_step(&mut self) -> Notification {
        if let Some(failed) = self.snapshot.iter().find(|s| s.status == PackStatus::Failed) {
            self.phase = Phase::Failed;
            return Notification::FetchError {
                op: self.id,
                pack_name: Some(failed.name.clone()),
                error_code: failed.error_code,
                message: format!("pack {} failed to download", failed.name),
            };
        }
        if self.snapshot.iter().all(|s| s.status.is_settled()) {
            let all_completed = self
                .snapshot
                .iter()
                .all(|s| s.status == PackStatus::Completed);
            self.phase = if all_completed {
                Phase::Completed
            } else {
                Phase::Canceled
            };
            return Notification::FetchSuccess {
                op: self.id,
                states: self.snapshot.clone(),
            };
        }
        self.phase = Phase::InProgress;
        Notification::FetchStateUpdated {
            op: self.id,
            states: self.snapshot.clone(),
        }
    }

    // ── Single-shot operations ────────────────────────────────

    pub(crate) fn complete_pack_states(&mut self, result: Result<PackStates, NativeError>) -> Step {
        self.completion_pending = false;
        match result {
            Ok(found) => {
                self.phase = Phase::Completed;
                let states = self.packs.iter().map(|n| found.state_or_unknown(n)).collect();
                Step::Emit(Notification::GetPackStatesSuccess { op: self.id, states })
            }
            Err(e) => {
                self.phase = Phase::Failed;
                Step::Emit(Notification::GetPackStatesError {
                    op: self.id,
                    pack_names: self.packs.clone(),
                    error_code: e.error_code,
                })
            }
        }
    }

    pub(crate) fn complete_remove(&mut self, result: Result<(), NativeError>) -> Step {
        self.completion_pending = false;
        let pack_name = self.packs.first().cloned().unwrap_or_default();
        match result {
            Ok(()) => {
                self.phase = Phase::Completed;
                Step::Emit(Notification::RemovePackSuccess {
                    op: self.id,
                    pack_name,
                })
            }
            Err(e) => {
                self.phase = Phase::Failed;
                Step::Emit(Notification::RemovePackError {
                    op: self.id,
                    pack_name,
                    message: e.message,
                    error_code: e.error_code,
                })
            }
        }
    }

    pub(crate) fn complete_cellular(&mut self, result: Result<i32, NativeError>) -> Step {
        self.completion_pending = false;
        match result {
            Ok(result_code) => {
                self.phase = if result_code == RESULT_OK {
                    Phase::Completed
                } else {
                    Phase::Canceled
                };
                Step::Emit(Notification::ShowCellularDataConfirmationSuccess {
                    op: self.id,
                    result_code,
                })
            }
            Err(e) => {
                self.phase = Phase::Failed;
                Step::Emit(Notification::ShowCellularDataConfirmationError {
                    op: self.id,
                    message: e.message,
                    error_code: e.error_code,
                })
            }
        }
    }
}
