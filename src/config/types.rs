use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::logging::LoggingConfig;
use super::store::StoreConfig;

/// Prefix for environment overrides, e.g. `HANDOVER_VERIFIER__API_BASE`.
pub const ENV_PREFIX: &str = "HANDOVER_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error loading configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Invalid logging.level '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),
}

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct ConfigV1 {
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the verification endpoints live and how long to wait for them.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct VerifierConfig {
    /// Base of the backend API, the flow's verify path is appended to it.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            api_base: default_api_base(),
            timeout_in_ms: default_timeout_in_ms(),
        }
    }
}

fn default_api_base() -> String {
    "http://localhost:8001/api".to_string()
}

fn default_timeout_in_ms() -> u64 {
    10_000
}

/// Routes and redirect delays used by the login state machine.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct FlowConfig {
    pub dashboard_route: String,
    pub signin_route: String,
    pub success_redirect_delay_in_ms: u64,
    pub error_redirect_delay_in_ms: u64,
    pub exit_fallback_delay_in_ms: u64,
}

impl Default for FlowConfig {
    fn default() -> Self {
        FlowConfig {
            dashboard_route: "/dashboard".to_string(),
            signin_route: "/signin".to_string(),
            success_redirect_delay_in_ms: 2000,
            error_redirect_delay_in_ms: 3000,
            exit_fallback_delay_in_ms: 100,
        }
    }
}

impl FlowConfig {
    pub fn success_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.success_redirect_delay_in_ms)
    }

    pub fn error_redirect_delay(&self) -> Duration {
        Duration::from_millis(self.error_redirect_delay_in_ms)
    }

    pub fn exit_fallback_delay(&self) -> Duration {
        Duration::from_millis(self.exit_fallback_delay_in_ms)
    }
}

/// Load config from a YAML file, then apply `HANDOVER_` environment overrides.
pub fn load_config(path: impl AsRef<Path>) -> Result<ConfigV1, ConfigError> {
    let figment = Figment::new()
        .merge(Yaml::file(path.as_ref()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    extract(figment)
}

/// Parse a config document held in memory. Used by tests and embedders.
pub fn load_config_str(yaml: &str) -> Result<ConfigV1, ConfigError> {
    extract(Figment::new().merge(Yaml::string(yaml)))
}

fn extract(figment: Figment) -> Result<ConfigV1, ConfigError> {
    match figment.extract::<Config>().map_err(Box::new)? {
        Config::ConfigV1(c) => Ok(c),
    }
    // handle configuration migration between versions here when necessary
}

/// Render the JSON schema for the configuration.
pub fn config_schema() -> Result<String, serde_json::Error> {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema)
}
