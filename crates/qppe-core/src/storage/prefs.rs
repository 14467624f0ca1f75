//! Grouped preference storage.
//!
//! Values are kept untyped: integers come back as integers, but booleans are
//! written as `"true"`/`"false"` strings and may come back that way.

use std::collections::HashMap;
use std::fmt;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A preference value as it sits in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl fmt::Display for StoredValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredValue::Bool(b) => write!(f, "{b}"),
            StoredValue::Int(n) => write!(f, "{n}"),
            StoredValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for StoredValue {
    fn from(value: bool) -> Self {
        StoredValue::Bool(value)
    }
}

impl From<u64> for StoredValue {
    fn from(value: u64) -> Self {
        StoredValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for StoredValue {
    fn from(value: &str) -> Self {
        StoredValue::Text(value.to_string())
    }
}

impl ToSql for StoredValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            StoredValue::Bool(true) => ToSqlOutput::from("true"),
            StoredValue::Bool(false) => ToSqlOutput::from("false"),
            StoredValue::Int(n) => ToSqlOutput::from(*n),
            StoredValue::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl FromSql for StoredValue {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(match value {
            ValueRef::Integer(n) => StoredValue::Int(n),
            ValueRef::Real(f) => StoredValue::Int(f as i64),
            ValueRef::Null => StoredValue::Text(String::new()),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                StoredValue::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        })
    }
}

/// Key-value store scoped to one preference group.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    fn set(&mut self, key: &str, value: StoredValue) -> Result<(), StoreError>;

    /// Commit pending writes.
    fn sync(&mut self) -> Result<(), StoreError>;
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `keys` out of another store.
    pub fn snapshot<S: PreferenceStore + ?Sized>(
        store: &S,
        keys: &[&str],
    ) -> Result<Self, StoreError> {
        let mut values = HashMap::new();
        for key in keys {
            if let Some(value) = store.get(key)? {
                values.insert((*key).to_string(), value);
            }
        }
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn sync(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_set() {
        let mut store = MemoryStore::new();
        assert!(store.get("interval").unwrap().is_none());
        store.set("interval", StoredValue::Int(900)).unwrap();
        assert_eq!(store.get("interval").unwrap(), Some(StoredValue::Int(900)));
    }

    #[test]
    fn snapshot_copies_only_present_keys() {
        let mut source = MemoryStore::new();
        source.set("handle_ppe", true.into()).unwrap();
        let copy = MemoryStore::snapshot(&source, &["handle_ppe", "send_emails"]).unwrap();
        assert_eq!(copy.len(), 1);
        assert_eq!(copy.get("handle_ppe").unwrap(), Some(StoredValue::Bool(true)));
    }

    #[test]
    fn display_matches_stored_text() {
        assert_eq!(StoredValue::Bool(false).to_string(), "false");
        assert_eq!(StoredValue::Int(60).to_string(), "60");
        assert_eq!(StoredValue::from("x").to_string(), "x");
    }
}
