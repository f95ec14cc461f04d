//! Port traits: the hexagonal boundary between the bridge and the outside world.
//!
//! ```text
//!   AssetPackManager ──▶ Dispatcher / AssetPackBridge ──▶ NotificationSink
//!   (native service)        (domain)                      (host signals)
//! ```
//!
//! The native delivery service is driven through [`AssetPackManager`].
//! Its asynchronous results come back through one-shot [`Completion`]s
//! and a single [`PackStateListener`] subscription, on whatever thread
//! the service chooses. Outbound notifications leave through a
//! [`NotificationSink`].

use std::sync::Arc;

use indexmap::IndexMap;

use crate::codec::keys;
use crate::error::{CodecError, NativeError};
use crate::model::{AssetLocation, PackLocation, PackState, PackStatus};

use super::events::Notification;

// ───────────────────────────────────────────────────────────────
// Native payloads
// ───────────────────────────────────────────────────────────────

/// One-shot callback for an asynchronous native task. Invoked exactly
/// once, from any thread.
pub type Completion<T> = Box<dyn FnOnce(Result<T, NativeError>) + Send + 'static>;

/// Pack state as the native service reports it: integer status code and
/// signed byte counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativePackState {
    pub name: String,
    pub status: i32,
    pub error_code: i32,
    pub bytes_downloaded: i64,
    pub total_bytes_to_download: i64,
}

impl NativePackState {
    pub fn new(name: impl Into<String>, status: PackStatus) -> Self {
        Self {
            name: name.into(),
            status: status.code(),
            error_code: 0,
            bytes_downloaded: 0,
            total_bytes_to_download: 0,
        }
    }

    #[must_use]
    pub fn with_bytes(mut self, downloaded: i64, total: i64) -> Self {
        self.bytes_downloaded = downloaded;
        self.total_bytes_to_download = total;
        self
    }

    #[must_use]
    pub fn with_error(mut self, error_code: i32) -> Self {
        self.error_code = error_code;
        self
    }
}

impl TryFrom<&NativePackState> for PackState {
    type Error = CodecError;

    fn try_from(native: &NativePackState) -> Result<Self, CodecError> {
        if native.name.is_empty() {
            return Err(CodecError::InvalidValue {
                key: keys::NAME.into(),
                reason: "pack name must not be empty",
            });
        }
        let status = PackStatus::from_code(native.status.into()).ok_or(CodecError::OutOfRange {
            key: keys::STATUS.into(),
        })?;
        let bytes_downloaded =
            u64::try_from(native.bytes_downloaded).map_err(|_| CodecError::OutOfRange {
                key: keys::BYTES_DOWNLOADED.into(),
            })?;
        let total_bytes_to_download =
            u64::try_from(native.total_bytes_to_download).map_err(|_| CodecError::OutOfRange {
                key: keys::TOTAL_BYTES_TO_DOWNLOAD.into(),
            })?;
        Ok(Self {
            name: native.name.clone(),
            status,
            error_code: native.error_code,
            bytes_downloaded,
            total_bytes_to_download,
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Listener subscription
// ───────────────────────────────────────────────────────────────

/// Receives every pack state change the native service observes.
pub trait PackStateListener: Send + Sync {
    fn on_state_update(&self, state: NativePackState);
}

/// Handle for a listener registration. Dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Unsubscribe now.
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

// ───────────────────────────────────────────────────────────────
// Native delivery service port
// ───────────────────────────────────────────────────────────────

/// The native asset-pack delivery service.
///
/// Asynchronous methods must invoke their completion exactly once.
/// Synchronous queries answer from state the service has already
/// materialised and must not block on the network.
pub trait AssetPackManager: Send + Sync {
    /// Request download of `names`. The completion acknowledges the
    /// request with the packs' current states; progress then arrives
    /// through the listener.
    fn fetch(&self, names: &[String], done: Completion<Vec<NativePackState>>);

    /// Cancel downloads of `names` and return their states right away.
    fn cancel(&self, names: &[String]) -> Vec<NativePackState>;

    fn remove_pack(&self, name: &str, done: Completion<()>);

    fn get_pack_states(&self, names: &[String], done: Completion<Vec<NativePackState>>);

    /// `None` when the pack is not installed or has no such asset.
    fn get_asset_location(&self, pack: &str, asset_path: &str) -> Option<AssetLocation>;

    /// `None` when the pack is not installed.
    fn get_pack_location(&self, pack: &str) -> Option<PackLocation>;

    /// Locations of every installed pack.
    fn get_pack_locations(&self) -> IndexMap<String, PackLocation>;

    /// Ask the user to allow downloads over cellular data. Completes with
    /// the activity result code.
    fn show_cellular_data_confirmation(&self, done: Completion<i32>);

    fn subscribe(&self, listener: Arc<dyn PackStateListener>) -> Subscription;
}

// ───────────────────────────────────────────────────────────────
// Notification sink port
// ───────────────────────────────────────────────────────────────

/// Outbound notifications leave the bridge through this port.
///
/// `emit` is called while the dispatcher holds its table lock, so calls
/// arrive in one total order. Implementations must not call back into
/// the bridge.
///
/// On the host that lock is the process-wide critical section shared by
/// every dispatcher, the simulated service and the diagnostics hook. A
/// slow `emit` stalls all of them; hand work off to a queue (see
/// [`SignalQueue`](crate::adapters::SignalQueue)) instead of doing it inline.
pub trait NotificationSink: Send {
    fn emit(&mut self, notification: &Notification);
}
