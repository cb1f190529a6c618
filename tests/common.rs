#![allow(dead_code)]

use std::sync::Arc;

use handover::config::{load_config_str, ConfigV1};
use handover::flow::RecordingNavigator;
use handover::state::AppState;
use handover::store::{MemoryBackend, SessionStore};

pub const JANE_RESPONSE: &str = r#"{
    "success": true,
    "user": {"user_id": "u-42", "name": "Jane", "email": "jane@x.com", "role": "admin"},
    "impersonated": true,
    "message": "You are logged in as this user (Admin Impersonation Mode)"
}"#;

/// Config pointing at `api_base`, with short delays so tests can wait them out.
pub fn test_config(api_base: &str) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
verifier:
  api_base: {api_base}
  timeout_in_ms: 2000
flow:
  success_redirect_delay_in_ms: 20
  error_redirect_delay_in_ms: 30
  exit_fallback_delay_in_ms: 10
store:
  type: memory
logging:
  level: debug
  format: json
"#
    );
    load_config_str(&yaml).expect("Failed to parse test config YAML")
}

pub struct Harness {
    pub state: AppState,
    pub backend: Arc<MemoryBackend>,
    pub navigator: Arc<RecordingNavigator>,
}

/// Host state over an inspectable in-memory backend.
pub fn build_state(config: ConfigV1, close_allowed: bool) -> Harness {
    let backend = Arc::new(MemoryBackend::new());
    let navigator = Arc::new(RecordingNavigator::new(close_allowed));
    let state = AppState {
        config: Arc::new(config),
        store: SessionStore::new(backend.clone()),
        navigator: navigator.clone(),
    };
    Harness {
        state,
        backend,
        navigator,
    }
}
