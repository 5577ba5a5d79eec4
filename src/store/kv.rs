// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Key/value storage seam.
//!
//! Mirrors the platform's persisted key/value store: crash-safe at the
//! granularity of a single key write, no multi-key transactions. The host
//! app implements [`KeyValueStore`] over whatever the platform provides;
//! [`MemoryKeyValueStore`] backs tests and host-side embedding.

use dashmap::DashMap;

/// Storage-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable key/value store, crash-safe per single-key write.
pub trait KeyValueStore: Send + Sync {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn get_i64(&self, key: &str) -> Result<Option<i64>, StoreError>;
    fn set_i64(&self, key: &str, value: i64) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    strings: DashMap<String, String>,
    ints: DashMap<String, i64>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_string(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.strings.get(key).map(|entry| entry.value().clone()))
    }

    fn set_string(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_i64(&self, key: &str) -> Result<Option<i64>, StoreError> {
        Ok(self.ints.get(key).map(|entry| *entry.value()))
    }

    fn set_i64(&self, key: &str, value: i64) -> Result<(), StoreError> {
        self.ints.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.strings.remove(key);
        self.ints.remove(key);
        Ok(())
    }
}
