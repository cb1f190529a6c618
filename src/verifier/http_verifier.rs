use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::base::{VerificationError, Verifier};
use crate::config::VerifierConfig;
use crate::models::{Flow, UserProfile};

const INVALID_RESPONSE: &str = "Invalid response from server";

/// Verifies tokens against the backend's `verify-token` endpoints.
///
/// The token travels once, as the `token` query parameter of an empty-bodied
/// POST. Single use and expiry are the backend's business.
pub struct HttpVerifier {
    flow: Flow,
    endpoint: String,
    client: reqwest::Client,
}

impl HttpVerifier {
    pub fn new(config: &VerifierConfig, flow: Flow) -> Self {
        let endpoint = format!(
            "{}{}",
            config.api_base.trim_end_matches('/'),
            flow.verify_path()
        );
        info!("Creating {} verifier for endpoint '{}'", flow, endpoint);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_in_ms))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            flow,
            endpoint,
            client,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// reqwest errors embed the request URL, and with it the token. Only the
    /// URL-stripped cause is logged; the caller gets the generic message.
    fn transport_failure(&self, e: reqwest::Error) -> VerificationError {
        warn!(
            event_name = "verifier.transport",
            event_domain = "verifier",
            flow = self.flow.as_str(),
            endpoint = self.endpoint.as_str(),
            "token verification request failed: {}",
            e.without_url()
        );
        VerificationError::VerificationFailed(self.flow.failure_message().to_string())
    }
}

#[async_trait::async_trait]
impl Verifier for HttpVerifier {
    fn flow(&self) -> Flow {
        self.flow
    }

    async fn verify(&self, token: &str) -> Result<UserProfile, VerificationError> {
        if token.is_empty() {
            return Err(VerificationError::MissingToken);
        }

        debug!(
            event_name = "verifier.request",
            event_domain = "verifier",
            flow = self.flow.as_str(),
            endpoint = self.endpoint.as_str(),
            "sending token verification request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("token", token)])
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_failure(e))?;

        if status.is_success() {
            parse_success(&body)
        } else {
            let message =
                error_detail(&body).unwrap_or_else(|| self.flow.failure_message().to_string());
            debug!(
                event_name = "verifier.rejected",
                event_domain = "verifier",
                flow = self.flow.as_str(),
                status = status.as_u16(),
                "backend rejected token: {}",
                message
            );
            Err(VerificationError::VerificationFailed(message))
        }
    }
}

/// A 2xx body only counts when it says `success: true` and carries a user.
fn parse_success(body: &str) -> Result<UserProfile, VerificationError> {
    let invalid = || VerificationError::VerificationFailed(INVALID_RESPONSE.to_string());

    let mut payload: Value = serde_json::from_str(body).map_err(|_| invalid())?;
    if payload.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(invalid());
    }
    match payload.get_mut("user").map(Value::take) {
        Some(user @ Value::Object(_)) => UserProfile::from_json(user).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Pulls a string `detail` out of an error body, if there is one.
fn error_detail(body: &str) -> Option<String> {
    let payload: Value = serde_json::from_str(body).ok()?;
    payload
        .get("detail")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
