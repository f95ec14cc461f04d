//! Typed field readers shared by the entity codecs.

use super::message::{DynamicMessage, Value};
use crate::error::CodecError;

/// Fail with the first key of `keys` that `msg` lacks.
pub(crate) fn require_keys(msg: &DynamicMessage, keys: &[&'static str]) -> Result<(), CodecError> {
    match keys.iter().find(|k| !msg.contains_key(k)) {
        Some(missing) => Err(CodecError::MissingField(*missing)),
        None => Ok(()),
    }
}

fn field<'m>(msg: &'m DynamicMessage, key: &'static str) -> Result<&'m Value, CodecError> {
    msg.get(key).ok_or(CodecError::MissingField(key))
}

fn mismatch(key: &str, expected: &'static str, found: &Value) -> CodecError {
    CodecError::TypeMismatch {
        key: key.to_owned(),
        expected,
        found: found.kind(),
    }
}

pub(crate) fn read_str<'m>(msg: &'m DynamicMessage, key: &'static str) -> Result<&'m str, CodecError> {
    match field(msg, key)? {
        Value::Str(s) => Ok(s),
        other => Err(mismatch(key, "string", other)),
    }
}

/// Unsigned 64-bit field in its canonical width: a non-negative `Int`, or
/// a `WideUnsigned` above `i64::MAX`.
pub(crate) fn read_u64(msg: &DynamicMessage, key: &'static str) -> Result<u64, CodecError> {
    match field(msg, key)? {
        Value::Int(i) => u64::try_from(*i).map_err(|_| CodecError::OutOfRange { key: key.into() }),
        Value::WideUnsigned(u) if i64::try_from(*u).is_err() => Ok(*u),
        Value::WideUnsigned(_) => Err(CodecError::OutOfRange { key: key.into() }),
        other => Err(mismatch(key, "unsigned integer", other)),
    }
}

/// Signed integer field. `WideUnsigned` is an integer too, just never a
/// small one, so it is out of range rather than mistyped.
pub(crate) fn read_i64(msg: &DynamicMessage, key: &'static str) -> Result<i64, CodecError> {
    match field(msg, key)? {
        Value::Int(i) => Ok(*i),
        Value::WideUnsigned(_) => Err(CodecError::OutOfRange { key: key.into() }),
        other => Err(mismatch(key, "integer", other)),
    }
}

pub(crate) fn read_i32(msg: &DynamicMessage, key: &'static str) -> Result<i32, CodecError> {
    let wide = read_i64(msg, key)?;
    i32::try_from(wide).map_err(|_| CodecError::OutOfRange { key: key.into() })
}

pub(crate) fn read_message<'m>(
    msg: &'m DynamicMessage,
    key: &'static str,
) -> Result<&'m DynamicMessage, CodecError> {
    read_message_at(key, field(msg, key)?)
}

pub(crate) fn read_sequence<'m>(
    msg: &'m DynamicMessage,
    key: &'static str,
) -> Result<&'m [DynamicMessage], CodecError> {
    match field(msg, key)? {
        Value::Sequence(items) => Ok(items),
        other => Err(mismatch(key, "sequence", other)),
    }
}

/// Nested message stored under a dynamic key (e.g. a pack name).
pub(crate) fn read_message_at<'m>(
    key: &str,
    value: &'m Value,
) -> Result<&'m DynamicMessage, CodecError> {
    match value {
        Value::Message(m) => Ok(m),
        other => Err(mismatch(key, "message", other)),
    }
}
