//! The dynamic interchange value.
//!
//! A [`DynamicMessage`] is an insertion-ordered map from string keys to a
//! closed set of value kinds. Keeping the set closed means every decode
//! site matches exhaustively on [`Value`] instead of probing an `Any`.

use indexmap::IndexMap;

/// One value inside a [`DynamicMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Signed 64-bit integer: the host's native integer width.
    Int(i64),
    /// Unsigned 64-bit integer that does not fit [`Value::Int`].
    WideUnsigned(u64),
    Str(String),
    Message(DynamicMessage),
    Sequence(Vec<DynamicMessage>),
}

impl Value {
    /// Canonical wire form of an unsigned 64-bit quantity: `Int` while it
    /// fits `i64`, `WideUnsigned` above that.
    pub fn from_u64(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Self::Int(i),
            Err(_) => Self::WideUnsigned(v),
        }
    }

    /// Human-readable kind, used in type-mismatch errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::WideUnsigned(_) => "wide unsigned integer",
            Self::Str(_) => "string",
            Self::Message(_) => "message",
            Self::Sequence(_) => "sequence",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<DynamicMessage> for Value {
    fn from(v: DynamicMessage) -> Self {
        Self::Message(v)
    }
}

impl From<Vec<DynamicMessage>> for Value {
    fn from(v: Vec<DynamicMessage>) -> Self {
        Self::Sequence(v)
    }
}

/// Ordered key/value message exchanged with the host.
///
/// Iteration follows insertion order. Equality does not: two messages are
/// equal when they hold the same entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicMessage {
    entries: IndexMap<String, Value>,
}

impl DynamicMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value. Replacing an existing key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for DynamicMessage {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut msg = Self::new();
        for (k, v) in iter {
            msg.insert(k, v);
        }
        msg
    }
}
