//! Dynamically typed field values and primary keys.
//!
//! Records move between stores as maps of `Value`s. A `Key` is the subset of
//! values that can identify a record: it is totally ordered and hashable, which
//! `Value` (because of `Double`) is not.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A dynamically-typed field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer.
    BigInt(i64),
    /// 64-bit float.
    Double(f64),
    /// Text value.
    Text(String),
    /// Binary value.
    Bytes(Vec<u8>),
    /// 128-bit UUID.
    Uuid([u8; 16]),
    /// JSON document.
    Json(serde_json::Value),
}

impl Value {
    /// Check if this value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the value as a string slice, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer, if it is one.
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Value::BigInt(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert to a primary key.
    ///
    /// Returns `None` for NULL and for values that cannot identify a record
    /// (floats, booleans, blobs, JSON).
    pub fn to_key(&self) -> Option<Key> {
        match self {
            Value::BigInt(i) => Some(Key::Int(*i)),
            Value::Text(s) => Some(Key::Text(s.clone())),
            Value::Uuid(u) => Some(Key::Uuid(*u)),
            _ => None,
        }
    }

    /// Name of the variant, used in diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::BigInt(_) => "bigint",
            Value::Double(_) => "double",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Uuid(_) => "uuid",
            Value::Json(_) => "json",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::BigInt(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(i) => Value::BigInt(i),
            Key::Text(s) => Value::Text(s),
            Key::Uuid(u) => Value::Uuid(u),
        }
    }
}

/// A primary key value.
///
/// Keys of different variants never compare equal; `Int(42)` and
/// `Text("42")` identify different records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    /// Integer key.
    Int(i64),
    /// Text key.
    Text(String),
    /// UUID key.
    Uuid([u8; 16]),
}

impl From<i64> for Key {
    fn from(v: i64) -> Self {
        Key::Int(v)
    }
}

impl From<i32> for Key {
    fn from(v: i32) -> Self {
        Key::Int(i64::from(v))
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Text(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Text(v)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Text(s) => write!(f, "{:?}", s),
            Key::Uuid(u) => {
                for (i, byte) in u.iter().enumerate() {
                    if matches!(i, 4 | 6 | 8 | 10) {
                        f.write_str("-")?;
                    }
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}
