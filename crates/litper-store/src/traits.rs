use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use litper_types::{LitperError, Result};

/// String-valued key-value store. Last write wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently stored, sorted.
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Read and deserialize the document at `key`.
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| LitperError::Serialization(format!("{key}: {e}")))
}

/// Like [`load_json`], but a missing key yields `T::default()`.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<T> {
    Ok(load_json(store, key).await?.unwrap_or_default())
}

pub async fn save_json<T: Serialize + ?Sized + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| LitperError::Serialization(format!("{key}: {e}")))?;
    store.set(key, raw).await
}
