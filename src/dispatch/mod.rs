//! Async notification dispatcher.
//!
//! Turns native completions and listener updates into ordered
//! [`Notification`]s. Owns the only shared mutable state in the bridge:
//! the table of outstanding operations.
//!
//! ```text
//!   native thread(s) ──▶ complete_* / on_state_update ─┐
//!                                                      ├─▶ lock ─▶ Operation ─▶ sink.emit
//!   caller thread ─────▶ begin ────────────────────────┘
//! ```
//!
//! Every transition and its `emit` happen under one lock, so the sink
//! sees a single total order consistent with the order native triggers
//! were observed.

mod operation;

pub use operation::{OperationId, OperationKind, Phase, RESULT_CANCELED, RESULT_OK};

use core::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, info, warn};

use crate::app::events::Notification;
use crate::app::ports::{
    AssetPackManager, NativePackState, NotificationSink, PackStateListener, Subscription,
};
use crate::config::BridgeConfig;
use crate::diagnostics::{ContractViolation, report_violation};
use crate::error::{BridgeError, NativeError};
use crate::model::{PackState, PackStates};

use operation::{Operation, Step};

/// Counters since the dispatcher was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchMetrics {
    pub issued: u64,
    pub emitted: u64,
    pub coalesced: u64,
    /// Operations that have not reached a terminal notification.
    pub live_operations: usize,
}

struct Inner {
    coalesce: bool,
    log_notifications: bool,
    max_live: usize,
    next_id: u64,
    ops: BTreeMap<OperationId, Operation>,
    sink: Box<dyn NotificationSink + Send>,
    metrics: DispatchMetrics,
}

impl Inner {
    fn live(&self) -> usize {
        self.ops.values().filter(|op| op.is_live()).count()
    }

    fn emit(&mut self, notification: &Notification) {
        if self.log_notifications {
            match notification.operation() {
                Some(op) => debug!("{op} | {}", notification.signal()),
                None => debug!("{}", notification.signal()),
            }
        }
        self.sink.emit(notification);
        self.metrics.emitted += 1;
    }

    fn apply(&mut self, step: Step) {
        match step {
            Step::Emit(n) => self.emit(&n),
            Step::Coalesced => self.metrics.coalesced += 1,
            Step::Ignored => {}
        }
    }

    fn prune(&mut self) {
        self.ops.retain(|_, op| !op.is_finished());
    }

    /// Resolve `id` to an operation still owed a completion of `kind`.
    fn pending(
        &mut self,
        id: OperationId,
        kind: OperationKind,
    ) -> Result<&mut Operation, ContractViolation> {
        let violation = match self.ops.get(&id) {
            None if id.0 < self.next_id => Some(ContractViolation::DuplicateCompletion { op: id }),
            None => Some(ContractViolation::UnknownOperation { op: id }),
            Some(op) if op.kind() != kind => Some(ContractViolation::KindMismatch {
                op: id,
                expected: op.kind(),
            }),
            Some(op) if !op.completion_pending() => {
                Some(ContractViolation::DuplicateCompletion { op: id })
            }
            Some(_) => None,
        };
        match violation {
            Some(violation) => Err(violation),
            None => self
                .ops
                .get_mut(&id)
                .ok_or(ContractViolation::UnknownOperation { op: id }),
        }
    }
}

/// Converts native states, reporting and skipping the ones that do not
/// decode.
fn decode_native(states: &[NativePackState], context: &'static str) -> Vec<PackState> {
    states
        .iter()
        .filter_map(|native| match PackState::try_from(native) {
            Ok(state) => Some(state),
            Err(error) => {
                report_violation(&ContractViolation::UndecodablePayload { context, error });
                None
            }
        })
        .collect()
}

pub struct Dispatcher {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Inner>>,
}

impl Dispatcher {
    pub fn new(config: &BridgeConfig, sink: Box<dyn NotificationSink + Send>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                coalesce: config.coalesce_progress,
                log_notifications: config.log_notifications,
                max_live: config.max_live_operations,
                next_id: 1,
                ops: BTreeMap::new(),
                sink,
                metrics: DispatchMetrics::default(),
            })),
        }
    }

    /// Register this dispatcher as the single listener on `manager`.
    pub fn attach(self: &Arc<Self>, manager: &dyn AssetPackManager) -> Subscription {
        let listener: Arc<dyn PackStateListener> = Arc::clone(self) as Arc<dyn PackStateListener>;
        manager.subscribe(listener)
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Issue a new operation id.
    pub fn begin(&self, kind: OperationKind, packs: Vec<String>) -> Result<OperationId, BridgeError> {
        self.with(|inner| {
            if inner.live() >= inner.max_live {
                warn!("{} rejected: {} live operations", kind.name(), inner.max_live);
                return Err(BridgeError::TooManyOperations {
                    limit: inner.max_live,
                });
            }
            let id = OperationId(inner.next_id);
            inner.next_id += 1;
            info!("{id} | {} issued ({} packs)", kind.name(), packs.len());
            inner.ops.insert(id, Operation::new(id, kind, packs));
            inner.metrics.issued += 1;
            Ok(id)
        })
    }

    pub fn complete_fetch(&self, id: OperationId, result: Result<Vec<NativePackState>, NativeError>) {
        let result = result.map(|states| decode_native(&states, "fetch completion"));
        self.settle(id, OperationKind::Fetch, |op, coalesce| {
            op.complete_fetch(result, coalesce)
        });
    }

    pub fn complete_pack_states(
        &self,
        id: OperationId,
        result: Result<Vec<NativePackState>, NativeError>,
    ) {
        let result = result.map(|states| {
            decode_native(&states, "getPackStates completion")
                .into_iter()
                .collect::<PackStates>()
        });
        self.settle(id, OperationKind::GetPackStates, |op, _| {
            op.complete_pack_states(result)
        });
    }

    pub fn complete_remove(&self, id: OperationId, result: Result<(), NativeError>) {
        self.settle(id, OperationKind::RemovePack, |op, _| op.complete_remove(result));
    }

    pub fn complete_cellular(&self, id: OperationId, result: Result<i32, NativeError>) {
        self.settle(id, OperationKind::CellularConfirmation, |op, _| {
            op.complete_cellular(result)
        });
    }

    fn settle(
        &self,
        id: OperationId,
        kind: OperationKind,
        f: impl FnOnce(&mut Operation, bool) -> Step,
    ) {
        let outcome = self.with(|inner| {
            let coalesce = inner.coalesce;
            let step = f(inner.pending(id, kind)?, coalesce);
            inner.apply(step);
            inner.prune();
            Ok::<(), ContractViolation>(())
        });
        // Outside the lock: the hook may call back into the dispatcher.
        if let Err(violation) = outcome {
            report_violation(&violation);
        }
    }

    /// Phase of an operation still in the table.
    pub fn phase(&self, id: OperationId) -> Option<Phase> {
        self.with(|inner| inner.ops.get(&id).map(Operation::phase))
    }

    pub fn metrics(&self) -> DispatchMetrics {
        self.with(|inner| DispatchMetrics {
            live_operations: inner.live(),
            ..inner.metrics
        })
    }
}

impl PackStateListener for Dispatcher {
    fn on_state_update(&self, native: NativePackState) {
        let state = match PackState::try_from(&native) {
            Ok(state) => state,
            Err(error) => {
                report_violation(&ContractViolation::UndecodablePayload {
                    context: "listener update",
                    error,
                });
                return;
            }
        };
        self.with(|inner| {
            let global = Notification::AssetPackStateUpdate {
                states: core::iter::once(state.clone()).collect(),
            };
            inner.emit(&global);

            let coalesce = inner.coalesce;
            let steps: Vec<Step> = inner
                .ops
                .values_mut()
                .map(|op| op.observe(&state, coalesce))
                .collect();
            for step in steps {
                inner.apply(step);
            }
            inner.prune();
        });
    }
}
