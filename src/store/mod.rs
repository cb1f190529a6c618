pub mod base;
pub mod file_backend;
pub mod memory_backend;
pub mod session_store;

// Re-export the primary store items so code outside can do
// "use crate::store::{SessionStore, create_backend};"
pub use base::{create_backend, Backend, StoreError};
pub use file_backend::FileBackend;
pub use memory_backend::MemoryBackend;
pub use session_store::{Scheme, SessionStore};
