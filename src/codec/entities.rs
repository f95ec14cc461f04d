//! [`MessageCodec`] implementations for the domain records.

use super::MessageCodec;
use super::fields::{read_i32, read_i64, read_message_at, read_str, read_u64, require_keys};
use super::message::{DynamicMessage, Value};
use crate::error::CodecError;
use crate::model::{AssetLocation, PackLocation, PackState, PackStates, PackStatus};

/// Wire key names.
pub mod keys {
    pub const OFFSET: &str = "offset";
    pub const PATH: &str = "path";
    pub const SIZE: &str = "size";

    pub const ASSETS_PATH: &str = "assetsPath";
    pub const PACK_BASE_OFFSET: &str = "packBaseOffset";
    pub const PACK_PATH: &str = "packPath";

    pub const NAME: &str = "name";
    pub const STATUS: &str = "status";
    pub const ERROR_CODE: &str = "errorCode";
    pub const BYTES_DOWNLOADED: &str = "bytesDownloaded";
    pub const TOTAL_BYTES_TO_DOWNLOAD: &str = "totalBytesToDownload";
}

// ---------------------------------------------------------------------------
// AssetLocation
// ---------------------------------------------------------------------------

impl MessageCodec for AssetLocation {
    const KEYS: &'static [&'static str] = &[keys::OFFSET, keys::PATH, keys::SIZE];

    fn encode(&self) -> DynamicMessage {
        DynamicMessage::new()
            .with(keys::OFFSET, Value::from_u64(self.offset()))
            .with(keys::PATH, self.path())
            .with(keys::SIZE, Value::from_u64(self.size()))
    }

    fn decode(msg: &DynamicMessage) -> Result<Self, CodecError> {
        require_keys(msg, Self::KEYS)?;
        let offset = read_u64(msg, keys::OFFSET)?;
        let path = read_str(msg, keys::PATH)?;
        let size = read_u64(msg, keys::SIZE)?;
        Self::new(offset, path, size)
    }
}

// ---------------------------------------------------------------------------
// PackLocation
// ---------------------------------------------------------------------------

impl MessageCodec for PackLocation {
    const KEYS: &'static [&'static str] = &[keys::ASSETS_PATH, keys::PACK_BASE_OFFSET, keys::PACK_PATH];

    fn encode(&self) -> DynamicMessage {
        DynamicMessage::new()
            .with(keys::ASSETS_PATH, self.assets_path.as_str())
            .with(keys::PACK_BASE_OFFSET, Value::from_u64(self.pack_base_offset))
            .with(keys::PACK_PATH, self.pack_path.as_str())
    }

    fn decode(msg: &DynamicMessage) -> Result<Self, CodecError> {
        require_keys(msg, Self::KEYS)?;
        Ok(Self {
            assets_path: read_str(msg, keys::ASSETS_PATH)?.to_owned(),
            pack_base_offset: read_u64(msg, keys::PACK_BASE_OFFSET)?,
            pack_path: read_str(msg, keys::PACK_PATH)?.to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// PackState / PackStates
// ---------------------------------------------------------------------------

impl MessageCodec for PackState {
    const KEYS: &'static [&'static str] = &[
        keys::NAME,
        keys::STATUS,
        keys::ERROR_CODE,
        keys::BYTES_DOWNLOADED,
        keys::TOTAL_BYTES_TO_DOWNLOAD,
    ];

    fn encode(&self) -> DynamicMessage {
        DynamicMessage::new()
            .with(keys::NAME, self.name.as_str())
            .with(keys::STATUS, self.status.code())
            .with(keys::ERROR_CODE, self.error_code)
            .with(keys::BYTES_DOWNLOADED, Value::from_u64(self.bytes_downloaded))
            .with(
                keys::TOTAL_BYTES_TO_DOWNLOAD,
                Value::from_u64(self.total_bytes_to_download),
            )
    }

    fn decode(msg: &DynamicMessage) -> Result<Self, CodecError> {
        require_keys(msg, Self::KEYS)?;
        let name = read_str(msg, keys::NAME)?;
        let status = PackStatus::from_code(read_i64(msg, keys::STATUS)?).ok_or(
            CodecError::OutOfRange {
                key: keys::STATUS.into(),
            },
        )?;
        Ok(Self {
            name: name.to_owned(),
            status,
            error_code: read_i32(msg, keys::ERROR_CODE)?,
            bytes_downloaded: read_u64(msg, keys::BYTES_DOWNLOADED)?,
            total_bytes_to_download: read_u64(msg, keys::TOTAL_BYTES_TO_DOWNLOAD)?,
        })
    }
}

/// Keyed by pack name; each value is a nested [`PackState`] message whose
/// `name` must match its key.
impl MessageCodec for PackStates {
    const KEYS: &'static [&'static str] = &[];

    fn encode(&self) -> DynamicMessage {
        self.iter()
            .map(|state| (state.name.clone(), state.encode()))
            .collect()
    }

    fn decode(msg: &DynamicMessage) -> Result<Self, CodecError> {
        let mut states = Self::new();
        for (key, value) in msg.iter() {
            let state = PackState::decode(read_message_at(key, value)?)?;
            if state.name != key {
                return Err(CodecError::InvalidValue {
                    key: key.to_owned(),
                    reason: "pack state name does not match its key",
                });
            }
            states.insert(state);
        }
        Ok(states)
    }
}

impl PackStates {
    /// Decode `msg` and answer for exactly `names`: packs missing from
    /// the message come back as UNKNOWN with zeroed counters.
    pub fn decode_requested(msg: &DynamicMessage, names: &[String]) -> Result<Self, CodecError> {
        let decoded = Self::decode(msg)?;
        Ok(names.iter().map(|n| decoded.state_or_unknown(n)).collect())
    }
}
