use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::base::{Backend, StoreError};
use crate::models::{DelegatedSession, Mode, UserProfile};

// Normal/impersonation scheme.
const USER_KEY: &str = "user";
const IS_AUTHENTICATED_KEY: &str = "isAuthenticated";
const IMPERSONATION_MODE_KEY: &str = "impersonationMode";

// Direct-login scheme, the one the main application initialises from.
const DIRECT_TOKEN_KEY: &str = "botsmith_token";
const DIRECT_USER_KEY: &str = "botsmith_user";

// Legacy token/user pair.
const LEGACY_TOKEN_KEY: &str = "token";

// Metadata attached to the stored user object.
const IMPERSONATED_FIELD: &str = "impersonated";
const IMPERSONATION_TOKEN_FIELD: &str = "impersonation_token";
const IMPERSONATION_TIMESTAMP_FIELD: &str = "impersonation_timestamp";
const ISSUED_AT_FIELD: &str = "issued_at";

const TRUE: &str = "true";

/// The key namespaces a session can live under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Impersonation,
    DirectLogin,
    Legacy,
}

impl Scheme {
    pub const ALL: [Scheme; 3] = [Scheme::Impersonation, Scheme::DirectLogin, Scheme::Legacy];

    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Scheme::Impersonation => &[USER_KEY, IS_AUTHENTICATED_KEY, IMPERSONATION_MODE_KEY],
            Scheme::DirectLogin => &[DIRECT_TOKEN_KEY, DIRECT_USER_KEY],
            Scheme::Legacy => &[LEGACY_TOKEN_KEY, USER_KEY],
        }
    }

    pub fn for_mode(mode: Mode) -> Scheme {
        match mode {
            Mode::Impersonated => Scheme::Impersonation,
            Mode::Normal => Scheme::DirectLogin,
        }
    }
}

/// The single owner of every session key.
///
/// At most one session exists at a time: `establish` purges every scheme
/// before writing, so two flows can never leave competing sessions behind.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn Backend>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        SessionStore { backend }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// Replace whatever session exists with one for `profile`.
    pub fn establish(
        &self,
        profile: UserProfile,
        token: &str,
        mode: Mode,
    ) -> Result<DelegatedSession, StoreError> {
        for scheme in Scheme::ALL {
            self.purge(scheme)?;
        }

        let session = DelegatedSession::new(profile, mode, token);
        if let Err(e) = self.write(&session) {
            // A half-written session must not outlive the failure.
            for scheme in Scheme::ALL {
                self.purge_logged(scheme);
            }
            warn!(
                event_name = "session.establish.failed",
                event_domain = "session",
                backend = self.backend.get_name(),
                "session write failed, all schemes purged: {}",
                e
            );
            return Err(e);
        }

        info!(
            event_name = "session.established",
            event_domain = "session",
            backend = self.backend.get_name(),
            mode = ?mode,
            user_id = session.profile.id.as_str(),
            "session established for {}",
            session.profile.display_name()
        );
        Ok(session)
    }

    fn write(&self, session: &DelegatedSession) -> Result<(), StoreError> {
        let issued_at = session.issued_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        let token = session.delivery_token.as_str();
        let mut user = session.profile.to_json_map();

        match Scheme::for_mode(session.mode) {
            Scheme::Impersonation => {
                user.insert(IMPERSONATED_FIELD.into(), Value::Bool(true));
                user.insert(IMPERSONATION_TOKEN_FIELD.into(), Value::from(token));
                user.insert(IMPERSONATION_TIMESTAMP_FIELD.into(), Value::from(issued_at));
                self.backend.set(USER_KEY, &encode(user)?)?;
                self.backend.set(IS_AUTHENTICATED_KEY, TRUE)?;
                self.backend.set(IMPERSONATION_MODE_KEY, TRUE)?;
            }
            _ => {
                user.insert(ISSUED_AT_FIELD.into(), Value::from(issued_at));
                self.backend.set(DIRECT_TOKEN_KEY, token)?;
                self.backend.set(DIRECT_USER_KEY, &encode(user)?)?;
            }
        }
        Ok(())
    }

    /// The current session, if a well-formed one is stored.
    pub fn read(&self) -> Option<DelegatedSession> {
        match self.try_read() {
            Ok(session) => session,
            Err(e) => {
                debug!(
                    event_name = "session.read.malformed",
                    event_domain = "session",
                    backend = self.backend.get_name(),
                    "ignoring stored session: {}",
                    e
                );
                None
            }
        }
    }

    /// Remove every key of every scheme.
    pub fn clear(&self) {
        for scheme in Scheme::ALL {
            self.purge_logged(scheme);
        }
        debug!(backend = self.backend.get_name(), "all session schemes cleared");
    }

    /// Remove the impersonation scheme only.
    pub fn clear_impersonation(&self) {
        self.purge_logged(Scheme::Impersonation);
        debug!(backend = self.backend.get_name(), "impersonation scheme cleared");
    }

    fn purge(&self, scheme: Scheme) -> Result<(), StoreError> {
        for key in scheme.keys() {
            self.backend.remove(key)?;
        }
        Ok(())
    }

    fn purge_logged(&self, scheme: Scheme) {
        for key in scheme.keys() {
            if let Err(e) = self.backend.remove(key) {
                warn!("Failed to remove session key '{}': {}", key, e);
            }
        }
    }

    fn try_read(&self) -> Result<Option<DelegatedSession>, StoreError> {
        if self.backend.get(IMPERSONATION_MODE_KEY).as_deref() == Some(TRUE) {
            if let Some(raw) = self.backend.get(USER_KEY) {
                return read_impersonated(&raw).map(Some);
            }
        }

        if let Some(raw) = self.backend.get(DIRECT_USER_KEY) {
            let token = self
                .backend
                .get(DIRECT_TOKEN_KEY)
                .ok_or_else(|| malformed("direct-login user stored without a token"))?;
            return read_direct(&raw, token).map(Some);
        }

        Ok(None)
    }
}

fn read_impersonated(raw: &str) -> Result<DelegatedSession, StoreError> {
    let mut user = decode(raw)?;
    if user.remove(IMPERSONATED_FIELD).and_then(|v| v.as_bool()) != Some(true) {
        return Err(malformed("stored user is not flagged as impersonated"));
    }
    let token = take_str(&mut user, IMPERSONATION_TOKEN_FIELD)?;
    let issued_at = parse_timestamp(&take_str(&mut user, IMPERSONATION_TIMESTAMP_FIELD)?)?;
    let profile = UserProfile::from_json(Value::Object(user)).map_err(malformed)?;

    Ok(DelegatedSession {
        profile,
        mode: Mode::Impersonated,
        issued_at,
        delivery_token: token,
    })
}

fn read_direct(raw: &str, token: String) -> Result<DelegatedSession, StoreError> {
    let mut user = decode(raw)?;
    let issued_at = parse_timestamp(&take_str(&mut user, ISSUED_AT_FIELD)?)?;
    let profile = UserProfile::from_json(Value::Object(user)).map_err(malformed)?;

    Ok(DelegatedSession {
        profile,
        mode: Mode::Normal,
        issued_at,
        delivery_token: token,
    })
}

fn encode(user: Map<String, Value>) -> Result<String, StoreError> {
    serde_json::to_string(&user).map_err(|e| StoreError::Backend(e.to_string()))
}

fn decode(raw: &str) -> Result<Map<String, Value>, StoreError> {
    serde_json::from_str(raw).map_err(|e| malformed(e.to_string()))
}

fn take_str(user: &mut Map<String, Value>, field: &str) -> Result<String, StoreError> {
    match user.remove(field) {
        Some(Value::String(s)) => Ok(s),
        _ => Err(malformed(format!("missing '{}'", field))),
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| malformed(format!("bad timestamp '{}': {}", raw, e)))
}

fn malformed(reason: impl Into<String>) -> StoreError {
    StoreError::MalformedStoredSession(reason.into())
}
