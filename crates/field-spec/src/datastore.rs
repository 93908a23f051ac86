//! Persistence delegates.
//!
//! A [`Datastore`] loads, saves and deletes the value of a single field. The
//! field decides *whether* to delete or save; the datastore decides *how*.
//! Implementations are shared between fields through `Arc`, so they take
//! `&self` and keep any mutable state behind their own synchronization.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::field::Field;

/// Failure reported by a datastore implementation.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DatastoreError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DatastoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// What a datastore returns for a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueTree {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_set: Option<Value>,
}

impl ValueTree {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_value(value: Value) -> Self {
        Self {
            value_set: Some(value),
        }
    }
}

/// Persistence backend keyed by field identity.
pub trait Datastore: Send + Sync {
    /// Fetches the stored value tree for `field`.
    fn load(&self, field: &Field) -> Result<ValueTree, DatastoreError>;

    /// Writes the field's current value.
    fn save(&self, field: &Field) -> Result<(), DatastoreError>;

    /// Removes whatever is stored for the field.
    fn delete(&self, field: &Field) -> Result<(), DatastoreError>;
}

/// Datastore holding values in memory, keyed by [`Field::storage_key`].
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from a JSON object of `storage key -> value`.
    pub fn from_value(value: Value) -> Result<Self, DatastoreError> {
        match value {
            Value::Object(object) => Ok(Self {
                entries: RwLock::new(object.into_iter().collect()),
            }),
            Value::Null => Ok(Self::default()),
            other => Err(DatastoreError::new(format!(
                "expected a JSON object of stored values, found {other}"
            ))),
        }
    }

    /// Snapshot of every stored value as a JSON object.
    pub fn to_value(&self) -> Result<Value, DatastoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| DatastoreError::new("memory datastore lock poisoned"))?;
        let object: Map<String, Value> = entries
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(Value::Object(object))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.read().ok()?.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Datastore for MemoryDatastore {
    fn load(&self, field: &Field) -> Result<ValueTree, DatastoreError> {
        let key = field.storage_key();
        let entries = self
            .entries
            .read()
            .map_err(|_| DatastoreError::new("memory datastore lock poisoned"))?;
        debug!(key = %key, found = entries.contains_key(&key), "memory datastore load");
        Ok(ValueTree {
            value_set: entries.get(&key).cloned(),
        })
    }

    fn save(&self, field: &Field) -> Result<(), DatastoreError> {
        let key = field.storage_key();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| DatastoreError::new("memory datastore lock poisoned"))?;
        debug!(key = %key, "memory datastore save");
        entries.insert(key, field.current_value());
        Ok(())
    }

    fn delete(&self, field: &Field) -> Result<(), DatastoreError> {
        let key = field.storage_key();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| DatastoreError::new("memory datastore lock poisoned"))?;
        debug!(key = %key, "memory datastore delete");
        entries.remove(&key);
        Ok(())
    }
}
