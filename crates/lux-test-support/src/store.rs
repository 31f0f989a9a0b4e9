//! Test stores: mock `KeyValueStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use lux_core::error::DomainError;
use lux_core::store::KeyValueStore;

/// An in-memory store that keeps every value and records each write.
#[derive(Debug, Default)]
pub struct RecordingKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
}

impl RecordingKeyValueStore {
    /// Create an empty recording store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `value` under `key`.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        store
    }

    /// Returns the current value under `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    /// Returns a snapshot of all `set` calls in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyValueStore for RecordingKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_owned(), value.to_owned());
        self.writes
            .lock()
            .unwrap()
            .push((key.to_owned(), value.to_owned()));
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), DomainError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A store that never holds anything and silently discards writes.
#[derive(Debug)]
pub struct EmptyKeyValueStore;

#[async_trait]
impl KeyValueStore for EmptyKeyValueStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, DomainError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), DomainError> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<(), DomainError> {
        Ok(())
    }
}

/// A store that always returns an infrastructure error. Useful for testing
/// the "persistence unavailable" paths.
#[derive(Debug)]
pub struct FailingKeyValueStore;

#[async_trait]
impl KeyValueStore for FailingKeyValueStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, DomainError> {
        Err(DomainError::Infrastructure("storage unavailable".into()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("storage unavailable".into()))
    }

    async fn remove(&self, _key: &str) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("storage unavailable".into()))
    }
}

/// A store whose reads fail while writes still land in an inner
/// `RecordingKeyValueStore`. Models a transient read outage.
#[derive(Debug, Default)]
pub struct UnreadableKeyValueStore {
    inner: RecordingKeyValueStore,
}

impl UnreadableKeyValueStore {
    /// Create a store that already holds `value` under `key`.
    #[must_use]
    pub fn with_entry(key: &str, value: &str) -> Self {
        Self {
            inner: RecordingKeyValueStore::with_entry(key, value),
        }
    }

    /// Returns the current value under `key`, bypassing the failing read.
    pub fn value(&self, key: &str) -> Option<String> {
        self.inner.value(key)
    }

    /// Returns a snapshot of all `set` calls in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.inner.writes()
    }
}

#[async_trait]
impl KeyValueStore for UnreadableKeyValueStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, DomainError> {
        Err(DomainError::Infrastructure("storage read timed out".into()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), DomainError> {
        self.inner.remove(key).await
    }
}
