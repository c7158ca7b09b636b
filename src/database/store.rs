//! The persistence store seam.
//!
//! Values are whole JSON documents addressed by `(area, key)`. There is no
//! partial update: callers read, modify and write back the full value.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::types::errors::StoreError;

/// Durability class of a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    /// Small configuration records that follow the user across devices.
    Synced,
    /// Large device-local data such as the session archive.
    Local,
}

impl StorageArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageArea::Synced => "synced",
            StorageArea::Local => "local",
        }
    }
}

/// Key-value persistence consumed by the engines.
#[async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Returns the stored value, or `None` when the key was never written.
    async fn get(&self, area: StorageArea, key: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrites the whole value stored under `key`.
    async fn set(&self, area: StorageArea, key: &str, value: Value) -> Result<(), StoreError>;
}

/// Reads and decodes a value, falling back to `default` when absent.
pub async fn load_or<S, T>(store: &S, area: StorageArea, key: &str, default: T) -> Result<T, StoreError>
where
    S: PersistenceStore + ?Sized,
    T: DeserializeOwned,
{
    match store.get(area, key).await? {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| StoreError::Serialization(format!("{}: {}", key, e))),
        None => Ok(default),
    }
}

/// Encodes and writes a value.
pub async fn save<S, T>(store: &S, area: StorageArea, key: &str, value: &T) -> Result<(), StoreError>
where
    S: PersistenceStore + ?Sized,
    T: Serialize + ?Sized,
{
    let json = serde_json::to_value(value)
        .map_err(|e| StoreError::Serialization(format!("{}: {}", key, e)))?;
    store.set(area, key, json).await
}
