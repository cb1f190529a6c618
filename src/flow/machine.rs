use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use super::navigator::{NavigationKind, Navigator};
use super::scheduler::DelayedNavigation;
use super::status::LoginStatus;
use crate::config::FlowConfig;
use crate::models::{DelegatedSession, Flow};
use crate::store::SessionStore;
use crate::utils::url::token_from_url;
use crate::verifier::Verifier;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// A page instance handles exactly one token.
    #[error("this login page has already processed a token")]
    AlreadyStarted,
}

/// Routes and delays for one flow instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowSettings {
    pub dashboard_route: String,
    pub signin_route: String,
    pub success_redirect_delay: Duration,
    pub error_redirect_delay: Duration,
    pub exit_fallback_delay: Duration,
}

impl Default for FlowSettings {
    fn default() -> Self {
        FlowSettings::from(&FlowConfig::default())
    }
}

impl From<&FlowConfig> for FlowSettings {
    fn from(config: &FlowConfig) -> Self {
        FlowSettings {
            dashboard_route: config.dashboard_route.clone(),
            signin_route: config.signin_route.clone(),
            success_redirect_delay: config.success_redirect_delay(),
            error_redirect_delay: config.error_redirect_delay(),
            exit_fallback_delay: config.exit_fallback_delay(),
        }
    }
}

/// One delegated-login page instance.
///
/// Verifies the token from the page URL, persists the session only once the
/// backend has accepted it, and schedules the navigation that leaves the
/// page. Tearing the instance down (or dropping it) cancels a navigation that
/// has not fired yet.
pub struct DelegatedLogin {
    id: Uuid,
    flow: Flow,
    verifier: Arc<dyn Verifier>,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    settings: FlowSettings,
    status: watch::Sender<LoginStatus>,
    started: bool,
    pending: Option<DelayedNavigation>,
}

impl DelegatedLogin {
    pub fn new(
        verifier: Arc<dyn Verifier>,
        store: SessionStore,
        navigator: Arc<dyn Navigator>,
        settings: FlowSettings,
    ) -> Self {
        let flow = verifier.flow();
        let (status, _) = watch::channel(LoginStatus::Verifying {
            message: flow.verifying_message().to_string(),
        });
        DelegatedLogin {
            id: Uuid::new_v4(),
            flow,
            verifier,
            store,
            navigator,
            settings,
            status,
            started: false,
            pending: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn flow(&self) -> Flow {
        self.flow
    }

    pub fn status(&self) -> LoginStatus {
        self.status.borrow().clone()
    }

    /// Observe status transitions.
    pub fn subscribe(&self) -> watch::Receiver<LoginStatus> {
        self.status.subscribe()
    }

    /// The navigation scheduled by the terminal transition, if still held.
    pub fn pending_navigation(&self) -> Option<&DelayedNavigation> {
        self.pending.as_ref()
    }

    /// Run the flow for the page at `page_url`, reading its `token` parameter.
    pub async fn start(&mut self, page_url: &str) -> Result<LoginStatus, FlowError> {
        let token = token_from_url(page_url);
        self.start_with_token(token.as_deref()).await
    }

    /// Run the flow for an already-extracted token.
    ///
    /// Returns the terminal status. The session is written only after the
    /// verifier has answered, and at most once.
    pub async fn start_with_token(
        &mut self,
        token: Option<&str>,
    ) -> Result<LoginStatus, FlowError> {
        if self.started {
            return Err(FlowError::AlreadyStarted);
        }
        self.started = true;

        let token = match token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                warn!(
                    event_name = "flow.token.missing",
                    event_domain = "flow",
                    flow = self.flow.as_str(),
                    flow_id = %self.id,
                    "no token in page URL"
                );
                self.fail(self.flow.missing_token_message().to_string());
                return Ok(self.status());
            }
        };

        match self.verifier.verify(token).await {
            Ok(profile) => {
                match self.store.establish(profile, token, self.flow.session_mode()) {
                    Ok(session) => self.succeed(session),
                    Err(e) => {
                        warn!(flow_id = %self.id, "Failed to persist session: {}", e);
                        self.fail(e.to_string());
                    }
                }
            }
            Err(e) => {
                let message = e.user_message(self.flow);
                warn!(
                    event_name = "flow.verification.failed",
                    event_domain = "flow",
                    flow = self.flow.as_str(),
                    flow_id = %self.id,
                    "{} login failed: {}",
                    self.flow,
                    message
                );
                self.fail(message);
            }
        }

        Ok(self.status())
    }

    /// Cancel a navigation that has not fired yet. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
    }

    /// Hand over the scheduled navigation and wait for it to fire.
    pub async fn finish(mut self) {
        if let Some(pending) = self.pending.take() {
            pending.wait().await;
        }
    }

    fn succeed(&mut self, session: DelegatedSession) {
        info!(
            event_name = "flow.success",
            event_domain = "flow",
            flow = self.flow.as_str(),
            flow_id = %self.id,
            user_id = session.profile.id.as_str(),
            role = session.profile.role_or_default(),
            "logged in as {}",
            session.profile.display_name()
        );
        self.status.send_replace(LoginStatus::success(session.profile));

        let kind = if self.flow.requires_hard_reload() {
            NavigationKind::Hard
        } else {
            NavigationKind::Soft
        };
        self.schedule(
            self.settings.dashboard_route.clone(),
            kind,
            self.settings.success_redirect_delay,
        );
    }

    fn fail(&mut self, message: String) {
        self.status.send_replace(LoginStatus::Error { message });
        self.schedule(
            self.settings.signin_route.clone(),
            NavigationKind::Soft,
            self.settings.error_redirect_delay,
        );
    }

    fn schedule(&mut self, route: String, kind: NavigationKind, delay: Duration) {
        self.pending = Some(DelayedNavigation::schedule(
            self.navigator.clone(),
            route,
            kind,
            delay,
        ));
    }
}

impl Drop for DelegatedLogin {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::navigator::{Navigation, RecordingNavigator};
    use crate::models::{Mode, UserProfile};
    use crate::store::memory_backend::RejectingBackend;
    use crate::store::MemoryBackend;
    use crate::verifier::VerificationError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// A verifier that answers from a fixed result and counts calls.
    struct StubVerifier {
        flow: Flow,
        result: Result<UserProfile, VerificationError>,
        calls: AtomicUsize,
        store: Option<SessionStore>,
    }

    impl StubVerifier {
        fn new(flow: Flow, result: Result<UserProfile, VerificationError>) -> Self {
            StubVerifier {
                flow,
                result,
                calls: AtomicUsize::new(0),
                store: None,
            }
        }
    }

    #[async_trait]
    impl Verifier for StubVerifier {
        fn flow(&self) -> Flow {
            self.flow
        }

        async fn verify(&self, token: &str) -> Result<UserProfile, VerificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(store) = &self.store {
                // Nothing may be persisted while the response is outstanding.
                assert_eq!(store.read(), None);
            }
            if token.is_empty() {
                return Err(VerificationError::MissingToken);
            }
            self.result.clone()
        }
    }

    fn jane() -> UserProfile {
        UserProfile::new(
            "u1",
            Some("Jane".into()),
            Some("jane@x.com".into()),
            Some("admin".into()),
        )
    }

    fn harness(
        verifier: StubVerifier,
    ) -> (
        DelegatedLogin,
        Arc<StubVerifier>,
        SessionStore,
        Arc<RecordingNavigator>,
    ) {
        let store = SessionStore::new(Arc::new(MemoryBackend::new()));
        let verifier = Arc::new(StubVerifier {
            store: Some(store.clone()),
            ..verifier
        });
        let navigator = Arc::new(RecordingNavigator::default());
        let login = DelegatedLogin::new(
            verifier.clone(),
            store.clone(),
            navigator.clone(),
            FlowSettings::default(),
        );
        (login, verifier, store, navigator)
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_state_is_verifying() {
        let (login, _, _, _) = harness(StubVerifier::new(Flow::DirectLogin, Ok(jane())));
        assert_eq!(
            login.status(),
            LoginStatus::Verifying {
                message: "Verifying login token...".into()
            }
        );
        assert!(login.pending_navigation().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_token_errors_without_verifying() {
        let (mut login, verifier, store, navigator) =
            harness(StubVerifier::new(Flow::Impersonation, Ok(jane())));

        let status = login.start("https://app.example.com/admin-login").await.unwrap();

        assert_eq!(
            status,
            LoginStatus::Error {
                message: "No impersonation token provided".into()
            }
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.read(), None);

        let pending = login.pending_navigation().unwrap();
        assert_eq!(pending.route(), "/signin");
        assert!(pending.delay() <= Duration::from_secs(3));

        tokio::time::sleep(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        assert_eq!(
            navigator.navigations(),
            vec![Navigation {
                route: "/signin".into(),
                kind: NavigationKind::Soft
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_establishes_then_soft_navigates() {
        let (mut login, verifier, store, navigator) =
            harness(StubVerifier::new(Flow::Impersonation, Ok(jane())));

        let status = login.start("/admin-login?token=abc123").await.unwrap();

        assert!(status.is_success());
        assert_eq!(status.message(), "Successfully logged in as Jane");
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);

        let session = store.read().unwrap();
        assert_eq!(session.mode, Mode::Impersonated);
        assert_eq!(session.profile.name.as_deref(), Some("Jane"));
        assert_eq!(session.delivery_token, "abc123");

        // Not before the grace period.
        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(navigator.navigations().is_empty());

        tokio::time::sleep(Duration::from_millis(1)).await;
        tokio::task::yield_now().await;
        assert_eq!(
            navigator.navigations(),
            vec![Navigation {
                route: "/dashboard".into(),
                kind: NavigationKind::Soft
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_login_success_hard_reloads() {
        let (mut login, _, store, navigator) =
            harness(StubVerifier::new(Flow::DirectLogin, Ok(jane())));

        login.start_with_token(Some("jwt")).await.unwrap();
        assert_eq!(store.read().unwrap().mode, Mode::Normal);

        login.finish().await;
        assert_eq!(
            navigator.navigations(),
            vec![Navigation {
                route: "/dashboard".into(),
                kind: NavigationKind::Hard
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_backend_message() {
        let (mut login, _, store, navigator) = harness(StubVerifier::new(
            Flow::Impersonation,
            Err(VerificationError::VerificationFailed("Token expired".into())),
        ));

        let status = login.start_with_token(Some("bad")).await.unwrap();
        assert_eq!(
            status,
            LoginStatus::Error {
                message: "Token expired".into()
            }
        );
        assert_eq!(store.read(), None);

        login.finish().await;
        assert_eq!(navigator.navigations()[0].route, "/signin");
    }

    #[tokio::test(start_paused = true)]
    async fn test_persist_failure_reports_error_and_redirects() {
        let backend = Arc::new(RejectingBackend::new("impersonationMode"));
        let store = SessionStore::new(backend.clone());
        let navigator = Arc::new(RecordingNavigator::default());
        let mut login = DelegatedLogin::new(
            Arc::new(StubVerifier::new(Flow::Impersonation, Ok(jane()))),
            store.clone(),
            navigator.clone(),
            FlowSettings::default(),
        );

        let status = login.start_with_token(Some("abc123")).await.unwrap();
        assert!(status.is_error());
        assert!(backend.inner.keys().is_empty());
        assert_eq!(store.read(), None);

        let pending = login.pending_navigation().unwrap();
        assert_eq!(pending.route(), "/signin");
        assert_eq!(pending.kind(), NavigationKind::Soft);

        login.finish().await;
        assert_eq!(navigator.navigations()[0].route, "/signin");
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_pending_navigation() {
        let (mut login, _, _, navigator) =
            harness(StubVerifier::new(Flow::Impersonation, Ok(jane())));

        login.start_with_token(Some("abc")).await.unwrap();
        login.teardown();

        tokio::time::sleep(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert!(navigator.navigations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_navigation() {
        let (mut login, _, _, navigator) = harness(StubVerifier::new(
            Flow::DirectLogin,
            Err(VerificationError::VerificationFailed("nope".into())),
        ));

        login.start_with_token(Some("abc")).await.unwrap();
        drop(login);

        tokio::time::sleep(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert!(navigator.navigations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_rejected() {
        let (mut login, verifier, _, _) =
            harness(StubVerifier::new(Flow::Impersonation, Ok(jane())));

        login.start_with_token(Some("abc")).await.unwrap();
        assert_eq!(
            login.start_with_token(Some("def")).await,
            Err(FlowError::AlreadyStarted)
        );
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 1);
        assert!(login.status().is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_terminal_state() {
        let (mut login, _, _, _) = harness(StubVerifier::new(Flow::Impersonation, Ok(jane())));
        let mut rx = login.subscribe();
        assert!(!rx.borrow().is_terminal());

        login.start_with_token(Some("abc")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_success());
    }
}
