use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use litper_types::{LitperError, Result};

use crate::traits::KeyValueStore;

const EXTENSION: &str = "json";

/// One JSON file per key under a state directory. Each write goes to its
/// own `.tmp` sibling and is renamed into place, so concurrent writers to
/// one key never share a temp file and the last rename wins.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `$LITPER_STATE_DIR`, else `~/.litper/`.
    pub fn default_state_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("LITPER_STATE_DIR") {
            PathBuf::from(dir)
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".litper")
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}.{EXTENSION}", sanitize_key(key)?)))
    }
}

/// Map a key onto a safe file stem. Anything outside `[A-Za-z0-9_.-]` is
/// replaced with `_`; keys that would escape the directory are rejected.
pub fn sanitize_key(key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() || key.chars().all(|c| c == '.') {
        return Err(LitperError::InvalidInput(format!(
            "Invalid store key: {key:?}"
        )));
    }
    Ok(key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect())
}

fn store_err(action: &str, path: &Path, e: std::io::Error) -> LitperError {
    LitperError::Store(format!("Failed to {action} {}: {e}", path.display()))
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_err("read", &path, e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| store_err("create", &self.dir, e))?;

        let tmp_path = path.with_extension(format!("{EXTENSION}.{}.tmp", Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&tmp_path, value).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(store_err("write", &tmp_path, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(store_err("rename", &tmp_path, e));
        }

        tracing::debug!(key, path = %path.display(), "stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_err("remove", &path, e)),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(store_err("list", &self.dir, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| store_err("list", &self.dir, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(store.get("litper_pedidos").await.unwrap().is_none());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_get_overwrite() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));
        store.set("litper_pedidos", "[1]".into()).await.unwrap();
        store.set("litper_pedidos", "[2]".into()).await.unwrap();
        assert_eq!(store.get("litper_pedidos").await.unwrap().as_deref(), Some("[2]"));
        assert_eq!(std::fs::read_dir(dir.path().join("nested")).unwrap().count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_to_one_key() {
        let dir = tempdir().unwrap();
        let store = std::sync::Arc::new(FileStore::new(dir.path()));

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.set("litper_novedades", format!("[{i}]")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = store.get("litper_novedades").await.unwrap().unwrap();
        let n: u32 = stored.trim_matches(|c| c == '[' || c == ']').parse().unwrap();
        assert!(n < 64);
        assert_eq!(store.keys().await.unwrap(), vec!["litper_novedades"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_keys_and_remove() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("b", "{}".into()).await.unwrap();
        store.set("a", "{}".into()).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["a", "b"]);

        store.remove("a").await.unwrap();
        store.remove("a").await.unwrap();
        assert_eq!(store.keys().await.unwrap(), vec!["b"]);
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("litper_tracking").unwrap(), "litper_tracking");
        assert_eq!(sanitize_key("../etc/passwd").unwrap(), ".._etc_passwd");
        assert!(sanitize_key("..").is_err());
        assert!(sanitize_key("  ").is_err());
    }
}
