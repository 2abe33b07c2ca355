//! Records moved between stores.
//!
//! A `Record` is a primary key plus the field values read from the source.
//! Projections (partial reads of a few reference attributes) use the same type
//! with only the requested fields populated.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value::{Key, Value};

/// A single row of an entity type, keyed by its primary key.
///
/// # Example
///
/// ```
/// use datasample_core::record::Record;
/// use datasample_core::value::{Key, Value};
///
/// let record = Record::new(Key::Int(1))
///     .with("name", "Alice")
///     .with("team_id", Value::Null);
///
/// assert_eq!(record.get("name").and_then(Value::as_str), Some("Alice"));
/// assert!(record.get("team_id").unwrap().is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Primary key.
    key: Key,
    /// Field values by field attribute name.
    values: BTreeMap<String, Value>,
}

impl Record {
    /// Create an empty record for the given key.
    pub fn new(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set a field, builder style.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// The record's primary key.
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Set a value for a field.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(field.into(), value.into());
    }

    /// Get a value for a field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    /// Remove a value, returning it.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.values.remove(field)
    }

    /// Check if a field has a value set.
    pub fn has(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Iterate over field/value pairs in field-name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of this record restricted to the given fields.
    ///
    /// Requested fields the record does not carry are left out rather than
    /// filled with NULL.
    pub fn project(&self, fields: &[&str]) -> Self {
        let values = fields
            .iter()
            .filter_map(|f| self.values.get(*f).map(|v| ((*f).to_string(), v.clone())))
            .collect();
        Self {
            key: self.key.clone(),
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_basic() {
        let mut record = Record::new(1_i64);
        record.set("name", "Alice");

        assert_eq!(record.key(), &Key::Int(1));
        assert_eq!(record.get("name").and_then(Value::as_str), Some("Alice"));
        assert!(!record.has("email"));
        assert!(record.has("name"));
    }

    #[test]
    fn test_project_keeps_only_requested_fields() {
        let record = Record::new(3_i64)
            .with("name", "Bob")
            .with("team_id", 7_i64)
            .with("mentor_id", Value::Null);

        let projected = record.project(&["team_id", "mentor_id", "missing"]);

        assert_eq!(projected.key(), &Key::Int(3));
        assert_eq!(projected.get("team_id"), Some(&Value::BigInt(7)));
        assert_eq!(projected.get("mentor_id"), Some(&Value::Null));
        assert!(!projected.has("name"));
        assert!(!projected.has("missing"));
    }

    #[test]
    fn test_remove() {
        let mut record = Record::new("k").with("a", 1_i64);
        assert_eq!(record.remove("a"), Some(Value::BigInt(1)));
        assert_eq!(record.fields().count(), 0);
    }
}
