use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::session::Mode;

/// The two delegated-login variants.
///
/// They share one contract and differ only in the endpoint called, the
/// session scheme written, and how the post-success navigation happens.
#[derive(Deserialize, Serialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    #[serde(rename = "impersonation")]
    Impersonation,
    #[serde(rename = "direct-login")]
    DirectLogin,
}

impl Flow {
    /// Path of the verification endpoint, relative to the API base.
    pub fn verify_path(&self) -> &'static str {
        match self {
            Flow::Impersonation => "/admin/impersonation/verify-token",
            Flow::DirectLogin => "/admin/direct-login/verify-token",
        }
    }

    /// Mode of the session written on success.
    pub fn session_mode(&self) -> Mode {
        match self {
            Flow::Impersonation => Mode::Impersonated,
            Flow::DirectLogin => Mode::Normal,
        }
    }

    /// Direct-login sessions are only picked up by a fresh page load.
    pub fn requires_hard_reload(&self) -> bool {
        matches!(self, Flow::DirectLogin)
    }

    pub fn verifying_message(&self) -> &'static str {
        match self {
            Flow::Impersonation => "Verifying impersonation token...",
            Flow::DirectLogin => "Verifying login token...",
        }
    }

    pub fn missing_token_message(&self) -> &'static str {
        match self {
            Flow::Impersonation => "No impersonation token provided",
            Flow::DirectLogin => "No login token provided",
        }
    }

    /// Used when the backend rejects a token without a usable `detail`.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Flow::Impersonation => "Failed to verify impersonation token",
            Flow::DirectLogin => "Failed to verify login token",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flow::Impersonation => "impersonation",
            Flow::DirectLogin => "direct-login",
        }
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Flow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "impersonation" => Ok(Flow::Impersonation),
            "direct-login" => Ok(Flow::DirectLogin),
            other => Err(format!(
                "unknown flow '{}', expected 'impersonation' or 'direct-login'",
                other
            )),
        }
    }
}
