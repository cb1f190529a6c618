//! Shared host state.
//!
//! Holds what every delegated-login page in a host shares: configuration,
//! the session store and the navigator.

use std::sync::Arc;

use crate::config::ConfigV1;
use crate::flow::{
    exit_impersonation, DelayedNavigation, DelegatedLogin, FlowSettings, ImpersonationBanner,
    Navigator,
};
use crate::models::{DelegatedSession, Flow};
use crate::store::{create_backend, SessionStore};
use crate::verifier::create_verifier;

/// State shared by all delegated-login pages of one host.
#[derive(Clone)]
pub struct AppState {
    /// Configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// The only writer of session keys.
    pub store: SessionStore,
    /// How pages leave themselves.
    pub navigator: Arc<dyn Navigator>,
}

impl AppState {
    /// Build the state from config, with the backend the config selects.
    pub fn new(config: Arc<ConfigV1>, navigator: Arc<dyn Navigator>) -> Self {
        let store = SessionStore::new(create_backend(&config.store));
        AppState {
            config,
            store,
            navigator,
        }
    }

    pub fn settings(&self) -> FlowSettings {
        FlowSettings::from(&self.config.flow)
    }

    /// A fresh page instance for `flow`.
    pub fn login_page(&self, flow: Flow) -> DelegatedLogin {
        DelegatedLogin::new(
            create_verifier(&self.config.verifier, flow),
            self.store.clone(),
            self.navigator.clone(),
            self.settings(),
        )
    }

    /// The session downstream views should render for.
    pub fn current_session(&self) -> Option<DelegatedSession> {
        self.store.read()
    }

    pub fn banner(&self) -> Option<ImpersonationBanner> {
        ImpersonationBanner::from_store(&self.store)
    }

    pub fn exit_impersonation(&self) -> DelayedNavigation {
        exit_impersonation(&self.store, self.navigator.clone(), &self.settings())
    }

    /// Standard sign-out: every scheme goes.
    pub fn sign_out(&self) {
        self.store.clear();
    }
}
