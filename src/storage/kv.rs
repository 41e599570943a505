//! Key-value store abstraction holding catalog records as JSON values.

use anyhow::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Durable key-value storage with single-key atomic writes.
pub trait KeyValueStore: Send + Sync {
    /// Returns Ok(None) if the key is not present.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Inserts or replaces the value stored under `key`.
    fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Returns all values whose key starts with `prefix`, ordered by key.
    fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>>;

    /// Removes a key. Returns whether it was present.
    fn delete(&self, key: &str) -> Result<bool>;
}

/// Process-local store, used by tests and throwaway setups.
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    values: Mutex<BTreeMap<String, Value>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.clone());
        Ok(())
    }

    fn get_by_prefix(&self, prefix: &str) -> Result<Vec<Value>> {
        Ok(self
            .values
            .lock()
            .unwrap()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(_, value)| value.clone())
            .collect())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.values.lock().unwrap().remove(key).is_some())
    }
}
