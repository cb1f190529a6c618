use chrono::{DateTime, Utc};

use crate::models::DelegatedSession;
use crate::store::SessionStore;

pub const BANNER_LABEL: &str = "ADMIN IMPERSONATION MODE";
pub const ADVISORY_NOTICE: &str =
    "You are viewing the application as this user. All actions will be recorded. This session will expire in 1 hour.";

/// What the impersonation banner shows. Only exists while the store holds an
/// impersonated session.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpersonationBanner {
    pub viewing_as: String,
    pub issued_at: DateTime<Utc>,
    pub advisory_expiry: DateTime<Utc>,
}

impl ImpersonationBanner {
    pub fn from_store(store: &SessionStore) -> Option<Self> {
        store.read().and_then(|session| Self::from_session(&session))
    }

    pub fn from_session(session: &DelegatedSession) -> Option<Self> {
        if !session.is_impersonated() {
            return None;
        }
        Some(ImpersonationBanner {
            viewing_as: session.profile.display_name().to_string(),
            issued_at: session.issued_at,
            advisory_expiry: session.advisory_expiry(),
        })
    }

    pub fn label(&self) -> &'static str {
        BANNER_LABEL
    }

    pub fn notice(&self) -> &'static str {
        ADVISORY_NOTICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Mode, UserProfile};
    use crate::store::MemoryBackend;
    use std::sync::Arc;

    #[test]
    fn test_banner_only_for_impersonated_sessions() {
        let store = SessionStore::new(Arc::new(MemoryBackend::new()));
        assert_eq!(ImpersonationBanner::from_store(&store), None);

        let profile = UserProfile::new("u1", None, Some("jane@x.com".into()), None);
        store.establish(profile.clone(), "jwt", Mode::Normal).unwrap();
        assert_eq!(ImpersonationBanner::from_store(&store), None);

        store.establish(profile, "abc", Mode::Impersonated).unwrap();
        let banner = ImpersonationBanner::from_store(&store).unwrap();
        assert_eq!(banner.viewing_as, "jane@x.com");
        assert_eq!(banner.label(), "ADMIN IMPERSONATION MODE");
        assert_eq!((banner.advisory_expiry - banner.issued_at).num_hours(), 1);
    }
}
