//! Inbound commands to the bridge.
//!
//! Hosts that route calls by method name hand the bridge a
//! `(method, args)` pair; [`BridgeCommand::parse`] turns it into one of
//! these and [`AssetPackBridge::handle_command`](super::service::AssetPackBridge::handle_command)
//! executes it.

use super::events::args;
use crate::codec::fields::{read_sequence, read_str};
use crate::codec::{DynamicMessage, Value, keys};
use crate::dispatch::OperationId;
use crate::error::{BridgeError, CodecError};

/// Method names the bridge exposes, in registration order.
pub const METHODS: [&str; 8] = [
    "fetch",
    "cancel",
    "getAssetLocation",
    "getPackLocation",
    "getPackLocations",
    "getPackStates",
    "removePack",
    "showCellularDataConfirmation",
];

/// Commands that a host can send into the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCommand {
    /// Start downloading packs. Replies with an operation id.
    Fetch { pack_names: Vec<String> },

    /// Cancel downloads. Replies with the packs' current states.
    Cancel { pack_names: Vec<String> },

    GetAssetLocation {
        pack_name: String,
        asset_path: String,
    },

    GetPackLocation { pack_name: String },

    GetPackLocations { pack_names: Vec<String> },

    /// Query pack states. Replies with an operation id.
    GetPackStates { pack_names: Vec<String> },

    /// Delete an installed pack. Replies with an operation id.
    RemovePack { pack_name: String },

    /// Ask the user to allow cellular downloads. Replies with an
    /// operation id.
    ShowCellularDataConfirmation,
}

impl BridgeCommand {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => METHODS[0],
            Self::Cancel { .. } => METHODS[1],
            Self::GetAssetLocation { .. } => METHODS[2],
            Self::GetPackLocation { .. } => METHODS[3],
            Self::GetPackLocations { .. } => METHODS[4],
            Self::GetPackStates { .. } => METHODS[5],
            Self::RemovePack { .. } => METHODS[6],
            Self::ShowCellularDataConfirmation => METHODS[7],
        }
    }

    /// Decode a host call. Pack lists travel under `packNames` as a
    /// sequence of `{name}` messages; single packs under `packName`.
    pub fn parse(method: &str, msg: &DynamicMessage) -> Result<Self, BridgeError> {
        let command = match method {
            "fetch" => Self::Fetch {
                pack_names: read_pack_names(msg)?,
            },
            "cancel" => Self::Cancel {
                pack_names: read_pack_names(msg)?,
            },
            "getAssetLocation" => Self::GetAssetLocation {
                pack_name: read_str(msg, args::PACK_NAME)?.to_owned(),
                asset_path: read_str(msg, args::ASSET_PATH)?.to_owned(),
            },
            "getPackLocation" => Self::GetPackLocation {
                pack_name: read_str(msg, args::PACK_NAME)?.to_owned(),
            },
            "getPackLocations" => Self::GetPackLocations {
                pack_names: read_pack_names(msg)?,
            },
            "getPackStates" => Self::GetPackStates {
                pack_names: read_pack_names(msg)?,
            },
            "removePack" => Self::RemovePack {
                pack_name: read_str(msg, args::PACK_NAME)?.to_owned(),
            },
            "showCellularDataConfirmation" => Self::ShowCellularDataConfirmation,
            other => return Err(BridgeError::UnknownMethod(other.to_owned())),
        };
        Ok(command)
    }

    /// Argument message in the shape [`parse`](Self::parse) accepts.
    pub fn to_message(&self) -> DynamicMessage {
        match self {
            Self::Fetch { pack_names }
            | Self::Cancel { pack_names }
            | Self::GetPackLocations { pack_names }
            | Self::GetPackStates { pack_names } => {
                DynamicMessage::new().with(args::PACK_NAMES, encode_pack_names(pack_names))
            }
            Self::GetAssetLocation {
                pack_name,
                asset_path,
            } => DynamicMessage::new()
                .with(args::PACK_NAME, pack_name.as_str())
                .with(args::ASSET_PATH, asset_path.as_str()),
            Self::GetPackLocation { pack_name } | Self::RemovePack { pack_name } => {
                DynamicMessage::new().with(args::PACK_NAME, pack_name.as_str())
            }
            Self::ShowCellularDataConfirmation => DynamicMessage::new(),
        }
    }
}

/// Result of a handled command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    /// An asynchronous operation was issued; notifications follow.
    Started(OperationId),
    /// A synchronous answer.
    Message(DynamicMessage),
}

impl CommandReply {
    pub fn into_message(self) -> DynamicMessage {
        match self {
            Self::Started(op) => DynamicMessage::new().with(args::OPERATION_ID, Value::from_u64(op.0)),
            Self::Message(msg) => msg,
        }
    }
}

pub(crate) fn encode_pack_names(names: &[String]) -> Vec<DynamicMessage> {
    names
        .iter()
        .map(|n| DynamicMessage::new().with(keys::NAME, n.as_str()))
        .collect()
}

fn read_pack_names(msg: &DynamicMessage) -> Result<Vec<String>, CodecError> {
    read_sequence(msg, args::PACK_NAMES)?
        .iter()
        .map(|entry| read_str(entry, keys::NAME).map(str::to_owned))
        .collect()
}
