use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::store::file_backend::FileBackendConfig;

/// Where the session keys live. Differentiated via a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
#[serde(tag = "type")]
pub enum StoreConfig {
    /// Process memory; the session ends with the process.
    #[default]
    #[serde(rename = "memory")]
    Memory,
    /// A JSON file on disk, shared by every process pointed at it.
    #[serde(rename = "file")]
    File(FileBackendConfig),
}
