use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::fs as tokio_fs;
use tracing::{debug, warn};

use super::ConfigStore;
use crate::error::{CoreError, StoreError};
use crate::utils::fs::ensure_dir_exists;

/// [`ConfigStore`] that keeps one pretty-printed JSON file per key.
///
/// `<directory>/<key>.json` holds the value of `key`. Writes go to a sibling
/// `.tmp` file first and are renamed into place, so a crash mid-write leaves
/// the previous value intact.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    directory: PathBuf,
}

impl FileConfigStore {
    /// Opens (and creates, if needed) a store rooted at `directory`.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let directory = directory.into();
        ensure_dir_exists(&directory)?;
        debug!(directory = %directory.display(), "opened file config store");
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::Backend {
                key: key.to_string(),
                message: "keys may only contain ASCII letters, digits, '_' and '-'".to_string(),
            });
        }
        Ok(self.directory.join(format!("{key}.json")))
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, StoreError> {
        let path = self.path_for(key)?;
        let content = match tokio_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!(key, path = %path.display(), error = %e, "failed to read store file");
                return Err(StoreError::Io { key: key.to_string(), source: e });
            }
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Serialization { key: key.to_string(), source: e })
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp_path = path.with_extension("json.tmp");
        let serialized = serde_json::to_string_pretty(&value)
            .map_err(|e| StoreError::Serialization { key: key.to_string(), source: e })?;

        tokio_fs::write(&tmp_path, serialized)
            .await
            .map_err(|e| StoreError::Io { key: key.to_string(), source: e })?;
        tokio_fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StoreError::Io { key: key.to_string(), source: e })?;
        debug!(key, path = %path.display(), "stored value");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio_fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io { key: key.to_string(), source: e }),
        }
    }
}
