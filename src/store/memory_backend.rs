use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::base::{Backend, StoreError};

/// Session keys held in process memory.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key currently present, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A panic mid-insert cannot leave a HashMap half-written.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Backend for MemoryBackend {
    fn get_name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// A memory backend that refuses writes to one key. Test-only.
#[cfg(test)]
pub(crate) struct RejectingBackend {
    pub inner: MemoryBackend,
    pub reject: &'static str,
}

#[cfg(test)]
impl RejectingBackend {
    pub fn new(reject: &'static str) -> Self {
        RejectingBackend {
            inner: MemoryBackend::new(),
            reject,
        }
    }
}

#[cfg(test)]
impl Backend for RejectingBackend {
    fn get_name(&self) -> &str {
        "rejecting"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if key == self.reject {
            return Err(StoreError::Backend(format!("write to '{}' refused", key)));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_set_get_remove() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("user"), None);

        backend.set("user", "{}").unwrap();
        backend.set("isAuthenticated", "true").unwrap();
        assert_eq!(backend.get("user").as_deref(), Some("{}"));
        assert_eq!(backend.keys(), vec!["isAuthenticated", "user"]);

        backend.remove("user").unwrap();
        backend.remove("never-set").unwrap();
        assert_eq!(backend.keys(), vec!["isAuthenticated"]);
    }
}
