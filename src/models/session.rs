use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserProfile;

/// Length of the advisory window shown to impersonating admins.
/// Expiry is enforced by the backend only.
pub const ADVISORY_SESSION_WINDOW_SECS: i64 = 3600;

/// How the current session was obtained.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Normal,
    Impersonated,
}

/// The identity the UI currently operates under.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DelegatedSession {
    pub profile: UserProfile,
    pub mode: Mode,
    pub issued_at: DateTime<Utc>,
    /// The one-time token that produced this session. Kept for audit and display.
    pub delivery_token: String,
}

impl DelegatedSession {
    pub fn new(profile: UserProfile, mode: Mode, delivery_token: impl Into<String>) -> Self {
        DelegatedSession {
            profile,
            mode,
            issued_at: Utc::now(),
            delivery_token: delivery_token.into(),
        }
    }

    pub fn is_impersonated(&self) -> bool {
        self.mode == Mode::Impersonated
    }

    /// When the advisory window ends. Display only.
    pub fn advisory_expiry(&self) -> DateTime<Utc> {
        self.issued_at + Duration::seconds(ADVISORY_SESSION_WINDOW_SECS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advisory_expiry_is_one_hour_after_issue() {
        let session = DelegatedSession::new(UserProfile::default(), Mode::Impersonated, "t");
        let window = session.advisory_expiry() - session.issued_at;
        assert_eq!(window.num_minutes(), 60);
        assert!(session.is_impersonated());
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Normal).unwrap(), "\"normal\"");
        assert_eq!(serde_json::to_string(&Mode::Impersonated).unwrap(), "\"impersonated\"");
    }
}
