//! Outbound notifications.
//!
//! The [`Dispatcher`](crate::dispatch::Dispatcher) emits these through the
//! [`NotificationSink`](super::ports::NotificationSink) port. Each one maps
//! to a named host signal whose single argument is a [`DynamicMessage`]
//! built by [`Notification::to_message`].

use super::commands::encode_pack_names;
use crate::codec::{DynamicMessage, MessageCodec, Value};
use crate::dispatch::OperationId;
use crate::model::{PackStates, PackStatus, error_code};

/// Argument key names used in command and signal payloads.
pub mod args {
    pub const OPERATION_ID: &str = "operationId";
    pub const PACK_NAME: &str = "packName";
    pub const PACK_NAMES: &str = "packNames";
    pub const PACK_STATES: &str = "packStates";
    pub const STATUS: &str = "status";
    pub const ERROR_CODE: &str = "errorCode";
    pub const MESSAGE: &str = "message";
    pub const RESULT_CODE: &str = "resultCode";
    pub const ASSET_PATH: &str = "assetPath";
}

/// Signal names with the argument keys each may carry, in emission order.
pub const SIGNALS: [(&str, &[&str]); 10] = [
    ("assetPackStateUpdateSignal", &[args::PACK_STATES]),
    ("fetchStateUpdated", &[args::OPERATION_ID, args::PACK_STATES]),
    ("fetchSuccess", &[args::OPERATION_ID, args::PACK_STATES]),
    (
        "fetchError",
        &[args::OPERATION_ID, args::PACK_NAME, args::ERROR_CODE, args::MESSAGE],
    ),
    ("getPackStatesSuccess", &[args::OPERATION_ID, args::PACK_STATES]),
    (
        "getPackStatesError",
        &[
            args::OPERATION_ID,
            args::PACK_NAME,
            args::PACK_NAMES,
            args::ERROR_CODE,
        ],
    ),
    (
        "removePackSuccess",
        &[args::OPERATION_ID, args::PACK_NAME, args::STATUS],
    ),
    (
        "removePackError",
        &[args::OPERATION_ID, args::PACK_NAME, args::MESSAGE, args::ERROR_CODE],
    ),
    (
        "showCellularDataConfirmationSuccess",
        &[args::OPERATION_ID, args::RESULT_CODE, args::ERROR_CODE],
    ),
    (
        "showCellularDataConfirmationError",
        &[args::OPERATION_ID, args::MESSAGE, args::ERROR_CODE],
    ),
];

/// Structured notifications emitted by the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Global fan-out of every listener update, independent of operations.
    AssetPackStateUpdate { states: PackStates },

    /// A fetch made progress; carries every requested pack.
    FetchStateUpdated { op: OperationId, states: PackStates },

    /// Every requested pack settled as COMPLETED or CANCELED.
    FetchSuccess { op: OperationId, states: PackStates },

    /// A requested pack failed (`pack_name` set) or the fetch request
    /// itself was rejected (`pack_name` is `None`).
    FetchError {
        op: OperationId,
        pack_name: Option<String>,
        error_code: i32,
        message: String,
    },

    GetPackStatesSuccess { op: OperationId, states: PackStates },

    /// Encoded with `packNames`, plus `packName` when the query named a
    /// single pack.
    GetPackStatesError {
        op: OperationId,
        pack_names: Vec<String>,
        error_code: i32,
    },

    RemovePackSuccess { op: OperationId, pack_name: String },

    RemovePackError {
        op: OperationId,
        pack_name: String,
        message: String,
        error_code: i32,
    },

    ShowCellularDataConfirmationSuccess { op: OperationId, result_code: i32 },

    ShowCellularDataConfirmationError {
        op: OperationId,
        message: String,
        error_code: i32,
    },
}

impl Notification {
    /// Host signal name.
    pub fn signal(&self) -> &'static str {
        match self {
            Self::AssetPackStateUpdate { .. } => "assetPackStateUpdateSignal",
            Self::FetchStateUpdated { .. } => "fetchStateUpdated",
            Self::FetchSuccess { .. } => "fetchSuccess",
            Self::FetchError { .. } => "fetchError",
            Self::GetPackStatesSuccess { .. } => "getPackStatesSuccess",
            Self::GetPackStatesError { .. } => "getPackStatesError",
            Self::RemovePackSuccess { .. } => "removePackSuccess",
            Self::RemovePackError { .. } => "removePackError",
            Self::ShowCellularDataConfirmationSuccess { .. } => "showCellularDataConfirmationSuccess",
            Self::ShowCellularDataConfirmationError { .. } => "showCellularDataConfirmationError",
        }
    }

    /// The operation this notification belongs to, if any.
    pub fn operation(&self) -> Option<OperationId> {
        match self {
            Self::AssetPackStateUpdate { .. } => None,
            Self::FetchStateUpdated { op, .. }
            | Self::FetchSuccess { op, .. }
            | Self::FetchError { op, .. }
            | Self::GetPackStatesSuccess { op, .. }
            | Self::GetPackStatesError { op, .. }
            | Self::RemovePackSuccess { op, .. }
            | Self::RemovePackError { op, .. }
            | Self::ShowCellularDataConfirmationSuccess { op, .. }
            | Self::ShowCellularDataConfirmationError { op, .. } => Some(*op),
        }
    }

    /// Last notification of its operation.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Self::AssetPackStateUpdate { .. } | Self::FetchStateUpdated { .. }
        )
    }

    /// Signal argument payload.
    pub fn to_message(&self) -> DynamicMessage {
        let mut msg = DynamicMessage::new();
        if let Some(op) = self.operation() {
            msg.insert(args::OPERATION_ID, Value::from_u64(op.0));
        }
        match self {
            Self::AssetPackStateUpdate { states }
            | Self::FetchStateUpdated { states, .. }
            | Self::FetchSuccess { states, .. }
            | Self::GetPackStatesSuccess { states, .. } => {
                msg.insert(args::PACK_STATES, states.encode());
            }
            Self::FetchError {
                pack_name,
                error_code,
                message,
                ..
            } => {
                if let Some(name) = pack_name {
                    msg.insert(args::PACK_NAME, name.as_str());
                }
                msg.insert(args::ERROR_CODE, *error_code);
                msg.insert(args::MESSAGE, message.as_str());
            }
            Self::GetPackStatesError {
                pack_names,
                error_code,
                ..
            } => {
                if let [name] = pack_names.as_slice() {
                    msg.insert(args::PACK_NAME, name.as_str());
                }
                msg.insert(args::PACK_NAMES, encode_pack_names(pack_names));
                msg.insert(args::ERROR_CODE, *error_code);
            }
            Self::RemovePackSuccess { pack_name, .. } => {
                msg.insert(args::PACK_NAME, pack_name.as_str());
                msg.insert(args::STATUS, PackStatus::NotInstalled.code());
            }
            Self::RemovePackError {
                pack_name,
                message,
                error_code,
                ..
            } => {
                msg.insert(args::PACK_NAME, pack_name.as_str());
                msg.insert(args::MESSAGE, message.as_str());
                msg.insert(args::ERROR_CODE, *error_code);
            }
            Self::ShowCellularDataConfirmationSuccess { result_code, .. } => {
                msg.insert(args::RESULT_CODE, *result_code);
                msg.insert(args::ERROR_CODE, error_code::NO_ERROR);
            }
            Self::ShowCellularDataConfirmationError {
                message,
                error_code,
                ..
            } => {
                msg.insert(args::MESSAGE, message.as_str());
                msg.insert(args::ERROR_CODE, *error_code);
            }
        }
        msg
    }
}
