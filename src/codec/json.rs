//! JSON text form of [`DynamicMessage`].
//!
//! Hosts that can only pass strings across the boundary exchange messages
//! as JSON objects. Mapping rules:
//!
//! | JSON                    | Value                               |
//! |-------------------------|-------------------------------------|
//! | integer fitting `i64`   | `Int`                               |
//! | integer above `i64::MAX`| `WideUnsigned`                      |
//! | string                  | `Str`                               |
//! | object                  | `Message`                           |
//! | array of objects        | `Sequence`                          |
//! | `null` entry            | key treated as absent               |
//! | float, bool             | rejected                            |

use core::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use super::message::{DynamicMessage, Value};

impl DynamicMessage {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ── Serialize ─────────────────────────────────────────────────

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::WideUnsigned(v) => serializer.serialize_u64(*v),
            Self::Str(s) => serializer.serialize_str(s),
            Self::Message(m) => m.serialize(serializer),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for DynamicMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ── Deserialize ───────────────────────────────────────────────

fn read_entries<'de, A: MapAccess<'de>>(mut access: A) -> Result<DynamicMessage, A::Error> {
    let mut msg = DynamicMessage::new();
    while let Some((key, value)) = access.next_entry::<String, Option<Value>>()? {
        if let Some(value) = value {
            msg.insert(key, value);
        }
    }
    Ok(msg)
}

struct MessageVisitor;

impl<'de> Visitor<'de> for MessageVisitor {
    type Value = DynamicMessage;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object")
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<Self::Value, A::Error> {
        read_entries(access)
    }
}

impl<'de> Deserialize<'de> for DynamicMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MessageVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer, a string, an object, or an array of objects")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from_u64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Str(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Str(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<Value, A::Error> {
        read_entries(access).map(Value::Message)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(item) = access.next_element::<DynamicMessage>()? {
            items.push(item);
        }
        Ok(Value::Sequence(items))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}
