//! Key-value persistence for learner progress.
//!
//! The session layer only sees [`KeyValueStore`]; values are JSON strings, the same
//! shape a browser would keep in local storage.

pub mod file;
pub mod keys;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid key: {0:?}")]
    InvalidKey(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    fn remove(&self, key: &str) -> StoreResult<()>;
}

/// Reads `key` as JSON. Missing or unreadable values fall back to `T::default()`.
pub fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(err) => {
            tracing::warn!(key, error = %err, "store read failed, using defaults");
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "stored value is not valid JSON, using defaults");
            T::default()
        }
    }
}

pub fn save_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized,
{
    let payload = serde_json::to_string(value)?;
    store.set(key, &payload)
}
