//! Pack-delivery domain records.
//!
//! Every record here is immutable once built. [`AssetLocation`] guards its
//! invariants behind a checked constructor; the other records are plain
//! data with public fields.

use core::fmt;

use indexmap::IndexMap;

use crate::error::CodecError;

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// Byte range of a single asset file inside a pack's storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetLocation {
    offset: u64,
    path: String,
    size: u64,
}

impl AssetLocation {
    /// Build a location, rejecting an empty path or a range whose end
    /// overflows `u64`.
    pub fn new(offset: u64, path: impl Into<String>, size: u64) -> Result<Self, CodecError> {
        let path = path.into();
        if path.is_empty() {
            return Err(CodecError::InvalidValue {
                key: "path".into(),
                reason: "path must not be empty",
            });
        }
        if offset.checked_add(size).is_none() {
            return Err(CodecError::InvalidValue {
                key: "size".into(),
                reason: "offset + size overflows",
            });
        }
        Ok(Self { offset, path, size })
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// One past the last byte of the asset.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

/// Storage root of a whole pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackLocation {
    pub assets_path: String,
    pub pack_base_offset: u64,
    pub pack_path: String,
}

// ---------------------------------------------------------------------------
// Pack status
// ---------------------------------------------------------------------------

/// Download status of a pack, with the delivery service's integer codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum PackStatus {
    Unknown = 0,
    Pending = 1,
    Downloading = 2,
    Transferring = 3,
    Completed = 4,
    Failed = 5,
    Canceled = 6,
    WaitingForWifi = 7,
    NotInstalled = 8,
    RequiresUserConfirmation = 9,
}

impl PackStatus {
    pub const ALL: [Self; 10] = [
        Self::Unknown,
        Self::Pending,
        Self::Downloading,
        Self::Transferring,
        Self::Completed,
        Self::Failed,
        Self::Canceled,
        Self::WaitingForWifi,
        Self::NotInstalled,
        Self::RequiresUserConfirmation,
    ];

    pub const fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Pending),
            2 => Some(Self::Downloading),
            3 => Some(Self::Transferring),
            4 => Some(Self::Completed),
            5 => Some(Self::Failed),
            6 => Some(Self::Canceled),
            7 => Some(Self::WaitingForWifi),
            8 => Some(Self::NotInstalled),
            9 => Some(Self::RequiresUserConfirmation),
            _ => None,
        }
    }

    /// Whether a download in this status will not move on by itself.
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Pending => "PENDING",
            Self::Downloading => "DOWNLOADING",
            Self::Transferring => "TRANSFERRING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Canceled => "CANCELED",
            Self::WaitingForWifi => "WAITING_FOR_WIFI",
            Self::NotInstalled => "NOT_INSTALLED",
            Self::RequiresUserConfirmation => "REQUIRES_USER_CONFIRMATION",
        }
    }
}

impl fmt::Display for PackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Well-known native error codes. Passed through unchanged; these names
/// exist only to make logs and tests readable.
pub mod error_code {
    pub const NO_ERROR: i32 = 0;
    pub const APP_UNAVAILABLE: i32 = -1;
    pub const PACK_UNAVAILABLE: i32 = -2;
    pub const INVALID_REQUEST: i32 = -3;
    pub const DOWNLOAD_NOT_FOUND: i32 = -4;
    pub const API_NOT_AVAILABLE: i32 = -5;
    pub const NETWORK_ERROR: i32 = -6;
    pub const ACCESS_DENIED: i32 = -7;
    pub const INSUFFICIENT_STORAGE: i32 = -10;
    pub const PLAY_STORE_NOT_FOUND: i32 = -11;
    pub const NETWORK_UNRESTRICTED: i32 = -12;
    pub const APP_NOT_OWNED: i32 = -13;
    pub const INTERNAL_ERROR: i32 = -100;
}

// ---------------------------------------------------------------------------
// Pack state
// ---------------------------------------------------------------------------

/// Snapshot of one named pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackState {
    pub name: String,
    pub status: PackStatus,
    pub error_code: i32,
    pub bytes_downloaded: u64,
    pub total_bytes_to_download: u64,
}

impl PackState {
    /// State reported for a pack the service said nothing about.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: PackStatus::Unknown,
            error_code: error_code::NO_ERROR,
            bytes_downloaded: 0,
            total_bytes_to_download: 0,
        }
    }
}

/// Pack states keyed by pack name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackStates {
    states: IndexMap<String, PackState>,
}

impl PackStates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the state for `state.name`.
    pub fn insert(&mut self, state: PackState) {
        self.states.insert(state.name.clone(), state);
    }

    pub fn get(&self, name: &str) -> Option<&PackState> {
        self.states.get(name)
    }

    /// The state for `name`, or an UNKNOWN state with zeroed counters
    /// when the pack is absent. Never an error.
    pub fn state_or_unknown(&self, name: &str) -> PackState {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| PackState::unknown(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackState> {
        self.states.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(String::as_str)
    }
}

impl FromIterator<PackState> for PackStates {
    fn from_iter<I: IntoIterator<Item = PackState>>(iter: I) -> Self {
        let mut states = Self::new();
        for state in iter {
            states.insert(state);
        }
        states
    }
}

impl<'a> IntoIterator for &'a PackStates {
    type Item = &'a PackState;
    type IntoIter = indexmap::map::Values<'a, String, PackState>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.values()
    }
}
