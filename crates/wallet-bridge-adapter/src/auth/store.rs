/*
[INPUT]:  Storage key and AuthData records
[OUTPUT]: Durable get/set/remove plus tolerant session load/save/clear
[POS]:    Auth layer - persistent storage for the session record
[UPDATE]: When adding store backends or changing the on-disk format
*/

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{Result, WalletError};
use crate::types::AuthData;

/// Durable string key-value capability the session is persisted in
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(key);
        Ok(())
    }
}

/// One file per key under a directory, written atomically
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn key_file_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }

    fn write_atomic(&self, path: &Path, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut temp_file = NamedTempFile::new_in(&self.dir)?;
        temp_file.write_all(value.as_bytes())?;
        temp_file.flush()?;
        temp_file.persist(path).map_err(|e| e.error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.key_file_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_file_path(key);
        self.write_atomic(&path, value).map_err(|e| {
            WalletError::Storage(format!("failed to write {}: {e}", path.display()))
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_file_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WalletError::Storage(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

/// Reads and writes the JSON-encoded AuthData record
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the record under `key`; missing or malformed values read as empty
    pub fn load(&self, key: &str) -> Option<AuthData> {
        let raw = self.store.get(key)?;
        match serde_json::from_str::<AuthData>(&raw) {
            Ok(data) if data.is_active() => Some(data),
            Ok(_) => {
                debug!(key, "stored session has empty account id");
                None
            }
            Err(err) => {
                warn!(key, error = %err, bytes = raw.len(), "stored session is malformed");
                None
            }
        }
    }

    pub fn save(&self, key: &str, auth_data: &AuthData) -> Result<()> {
        let encoded = serde_json::to_string(auth_data)?;
        self.store.set(key, &encoded)
    }

    pub fn clear(&self, key: &str) -> Result<()> {
        self.store.remove(key)
    }
}
