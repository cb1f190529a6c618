use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::http_verifier::HttpVerifier;
use crate::config::VerifierConfig;
use crate::models::{Flow, UserProfile};

/// The only failure kinds a verifier reports.
///
/// Expired, revoked and malformed tokens all collapse into
/// `VerificationFailed`; callers must not rely on anything finer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("no token provided")]
    MissingToken,
    #[error("{0}")]
    VerificationFailed(String),
}

impl VerificationError {
    /// The message to show for this error in the given flow.
    pub fn user_message(&self, flow: Flow) -> String {
        match self {
            VerificationError::MissingToken => flow.missing_token_message().to_string(),
            VerificationError::VerificationFailed(message) => message.clone(),
        }
    }
}

/// Exchanges a one-time delegated-login token for the profile it grants.
///
/// Implementations must not touch the session store: persisting the result
/// is the caller's next step.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Which flow's endpoint this verifier talks to.
    fn flow(&self) -> Flow;

    /// An empty `token` fails with `MissingToken` before any I/O.
    async fn verify(&self, token: &str) -> Result<UserProfile, VerificationError>;
}

/// Create the verifier for `flow` from the given config.
pub fn create_verifier(config: &VerifierConfig, flow: Flow) -> Arc<dyn Verifier> {
    Arc::new(HttpVerifier::new(config, flow))
}
