//! Unified error types for the bridge.
//!
//! Three families, kept apart on purpose:
//!
//! - [`CodecError`]: a caller handed us a malformed [`DynamicMessage`].
//!   Surfaced synchronously at the call site that tried to decode it.
//! - [`NativeError`]: the delivery service reported a failure. The code
//!   is passed through to the `*Error` notifications untouched.
//! - [`BridgeError`]: everything a facade call can return synchronously.
//!
//! Contract violations of the native layer are not errors in this sense;
//! they go to [`crate::diagnostics`].
//!
//! [`DynamicMessage`]: crate::codec::DynamicMessage

use core::fmt;

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

/// Decoding a caller-supplied message failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A required key is absent. Names the first absent key in the
    /// entity's declared key order.
    MissingField(&'static str),
    /// A present key holds a value of the wrong semantic type.
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A value has the right type but does not fit the field
    /// (negative byte counter, error code wider than 32 bits, unknown
    /// status code).
    OutOfRange { key: String },
    /// A value violates an entity invariant.
    InvalidValue { key: String, reason: &'static str },
}

impl CodecError {
    /// The key this error is about.
    pub fn key(&self) -> &str {
        match self {
            Self::MissingField(key) => key,
            Self::TypeMismatch { key, .. }
            | Self::OutOfRange { key }
            | Self::InvalidValue { key, .. } => key,
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(key) => write!(f, "missing required field `{key}`"),
            Self::TypeMismatch {
                key,
                expected,
                found,
            } => write!(f, "field `{key}`: expected {expected}, found {found}"),
            Self::OutOfRange { key } => write!(f, "field `{key}`: value out of range"),
            Self::InvalidValue { key, reason } => write!(f, "field `{key}`: {reason}"),
        }
    }
}

impl std::error::Error for CodecError {}

// ---------------------------------------------------------------------------
// Native service errors
// ---------------------------------------------------------------------------

/// Failure reported by the native delivery service.
///
/// The bridge never interprets or remaps `error_code`; see
/// [`crate::model::error_code`] for the well-known values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    pub error_code: i32,
    pub message: String,
}

impl NativeError {
    pub fn new(error_code: i32, message: impl Into<String>) -> Self {
        Self {
            error_code,
            message: message.into(),
        }
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native error {}: {}", self.error_code, self.message)
    }
}

impl std::error::Error for NativeError {}

// ---------------------------------------------------------------------------
// Facade errors
// ---------------------------------------------------------------------------

/// Synchronous failure of a facade call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// A message argument failed to decode.
    Codec(CodecError),
    /// A primitive argument was rejected before reaching the service.
    InvalidArgument(&'static str),
    /// The host invoked a method the bridge does not expose.
    UnknownMethod(String),
    /// Too many operations are waiting for a terminal notification.
    TooManyOperations { limit: usize },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::UnknownMethod(name) => write!(f, "unknown method `{name}`"),
            Self::TooManyOperations { limit } => {
                write!(f, "too many live operations (limit {limit})")
            }
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Codec(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CodecError> for BridgeError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Bridge-wide `Result` alias.
pub type Result<T> = core::result::Result<T, BridgeError>;
