//! Dynamic message codec.
//!
//! ```text
//!   native record ──encode──▶ DynamicMessage     (total, never fails)
//!   DynamicMessage ──decode──▶ native record     (validates)
//! ```
//!
//! Decoding checks, in order:
//!
//! 1. every required key is present ([`CodecError::MissingField`] names
//!    the first absent key in [`MessageCodec::KEYS`] order);
//! 2. every required value has the expected kind
//!    ([`CodecError::TypeMismatch`]);
//! 3. numeric ranges and entity invariants.
//!
//! Extra keys are ignored so newer hosts can talk to older bridges.
//!
//! Unsigned 64-bit fields travel as [`Value::Int`] while they fit `i64`
//! and as [`Value::WideUnsigned`] above that, so no value is truncated.
//! Decoding accepts only that canonical width: a `WideUnsigned` small
//! enough to be an `Int` is [`CodecError::OutOfRange`].

pub mod adapted;
mod entities;
pub(crate) mod fields;
pub mod json;
pub mod message;

pub use adapted::Adapted;
pub use entities::keys;
pub use message::{DynamicMessage, Value};

use crate::error::CodecError;

/// Canonical encode/decode pair for one record type.
///
/// For every valid record `e`, `decode(&e.encode()) == Ok(e)`. For every
/// message `m` that decodes and carries no key the record ignores,
/// `decode(&m)?.encode() == m`, whatever order its keys arrive in.
pub trait MessageCodec: Sized {
    /// Required keys in declaration order.
    const KEYS: &'static [&'static str];

    fn encode(&self) -> DynamicMessage;

    fn decode(msg: &DynamicMessage) -> Result<Self, CodecError>;
}
