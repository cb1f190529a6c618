use crate::models::UserProfile;

/// Where a delegated-login page instance is.
///
/// `Verifying` is the only non-terminal state. Neither terminal state
/// transitions again; the scheduled navigation is the way out.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginStatus {
    Verifying { message: String },
    Success { profile: UserProfile, message: String },
    Error { message: String },
}

impl LoginStatus {
    pub fn message(&self) -> &str {
        match self {
            LoginStatus::Verifying { message }
            | LoginStatus::Success { message, .. }
            | LoginStatus::Error { message } => message,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoginStatus::Verifying { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LoginStatus::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoginStatus::Error { .. })
    }

    /// Short heading for the status card.
    pub fn title(&self) -> &'static str {
        match self {
            LoginStatus::Verifying { .. } => "Verifying Token...",
            LoginStatus::Success { .. } => "Login Successful!",
            LoginStatus::Error { .. } => "Login Failed",
        }
    }

    pub(crate) fn success(profile: UserProfile) -> Self {
        let message = format!("Successfully logged in as {}", profile.display_name());
        LoginStatus::Success { profile, message }
    }
}
