//! Process-wide contract-violation channel.
//!
//! A violation means the native layer broke its side of the port
//! contract: it delivered a payload that does not decode, or completed an
//! operation the bridge never issued (or already settled). These are not
//! per-request errors and never reach a notification sink. They are
//! counted, logged at `error!`, and handed to an optional hook so a host
//! can escalate (crash reporting, test assertions).
//!
//! Violations are reported with no bridge lock held, so a hook may call
//! back into the dispatcher that raised them.

use core::cell::Cell;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::error;

use crate::dispatch::{OperationId, OperationKind};
use crate::error::CodecError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// A native payload failed to convert into a domain record.
    UndecodablePayload {
        context: &'static str,
        error: CodecError,
    },
    /// Completion for an id that was never issued.
    UnknownOperation { op: OperationId },
    /// Completion for an id that has already been completed.
    DuplicateCompletion { op: OperationId },
    /// Completion delivered through a callback of another operation kind.
    KindMismatch {
        op: OperationId,
        expected: OperationKind,
    },
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndecodablePayload { context, error } => {
                write!(f, "undecodable native payload in {context}: {error}")
            }
            Self::UnknownOperation { op } => write!(f, "completion for unknown operation {op}"),
            Self::DuplicateCompletion { op } => write!(f, "duplicate completion for {op}"),
            Self::KindMismatch { op, expected } => {
                write!(f, "{op} is a {} operation, completed through another callback", expected.name())
            }
        }
    }
}

impl std::error::Error for ContractViolation {}

pub type ViolationHook = fn(&ContractViolation);

static VIOLATION_COUNT: AtomicU64 = AtomicU64::new(0);
static HOOK: Mutex<CriticalSectionRawMutex, Cell<Option<ViolationHook>>> =
    Mutex::new(Cell::new(None));

/// Install (or clear) the violation hook, returning the previous one.
pub fn set_violation_hook(hook: Option<ViolationHook>) -> Option<ViolationHook> {
    HOOK.lock(|cell| cell.replace(hook))
}

/// Record a contract violation.
pub fn report_violation(violation: &ContractViolation) {
    VIOLATION_COUNT.fetch_add(1, Ordering::Relaxed);
    error!("CONTRACT | {violation}");
    if let Some(hook) = HOOK.lock(Cell::get) {
        hook(violation);
    }
}

/// Violations reported since process start.
pub fn violation_count() -> u64 {
    VIOLATION_COUNT.load(Ordering::Relaxed)
}
