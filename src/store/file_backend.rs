use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::warn;

use super::base::{Backend, StoreError};

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct FileBackendConfig {
    pub path: String,
}

/// Session keys persisted as a single JSON object on disk.
///
/// The file is re-read on every access so that separate processes sharing it
/// see each other's writes. Each write goes to its own uniquely named sibling
/// temp file and is renamed into place, so readers never see a torn file.
/// Updates are read-modify-write: across instances the last writer wins.
pub struct FileBackend {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(config: &FileBackendConfig) -> Self {
        Self::at(&config.path)
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        FileBackend {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty store; so is one that does not parse.
    fn load(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!("Unable to read session file '{}': {}", self.path.display(), e);
                return BTreeMap::new();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(
                "Session file '{}' is not a JSON object of strings, treating as empty: {}",
                self.path.display(),
                e
            );
            BTreeMap::new()
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let serialized =
            serde_json::to_string_pretty(entries).map_err(|e| StoreError::Backend(e.to_string()))?;

        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };

        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| io_error(&dir, e))?;
        tmp.write_all(serialized.as_bytes())
            .map_err(|e| io_error(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map(|_| ())
            .map_err(|e| io_error(&self.path, e.error))
    }

    fn update<F>(&self, mutate: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> bool,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut entries = self.load();
        if mutate(&mut entries) {
            self.save(&entries)
        } else {
            Ok(())
        }
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StoreError {
    StoreError::Backend(format!("{}: {}", path.display(), e))
}

impl Backend for FileBackend {
    fn get_name(&self) -> &str {
        "file"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}
