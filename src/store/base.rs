use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::{file_backend::FileBackend, memory_backend::MemoryBackend};
use crate::config::StoreConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("session backend error: {0}")]
    Backend(String),
    /// Stored state that failed to parse. Never leaves the store: reads
    /// report it as "no session".
    #[error("malformed stored session: {0}")]
    MalformedStoredSession(String),
}

/// A string key/value store with local-storage semantics.
///
/// Only `SessionStore` should hold one of these; it owns every key name.
pub trait Backend: Send + Sync {
    fn get_name(&self) -> &str;
    /// Missing and unreadable entries both read as `None`.
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Creates a concrete backend based on the StoreConfig.
pub fn create_backend(config: &StoreConfig) -> Arc<dyn Backend> {
    match config {
        StoreConfig::Memory => {
            info!("Using in-memory session backend.");
            Arc::new(MemoryBackend::new())
        }
        StoreConfig::File(file_config) => {
            info!("Using file session backend at '{}'.", file_config.path);
            Arc::new(FileBackend::new(file_config))
        }
    }
}
