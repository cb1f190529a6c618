use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use super::navigator::{NavigationKind, Navigator};

/// A navigation that fires after a delay unless cancelled first.
///
/// Dropping the handle does not cancel; the owner of the view decides.
/// Must be created inside a tokio runtime.
pub struct DelayedNavigation {
    route: String,
    kind: NavigationKind,
    delay: Duration,
    handle: JoinHandle<()>,
}

impl DelayedNavigation {
    pub fn schedule(
        navigator: Arc<dyn Navigator>,
        route: impl Into<String>,
        kind: NavigationKind,
        delay: Duration,
    ) -> Self {
        let route = route.into();
        debug!(
            route = route.as_str(),
            kind = ?kind,
            delay_ms = delay.as_millis() as u64,
            "navigation scheduled"
        );

        let target = route.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(&target, kind);
        });

        DelayedNavigation {
            route,
            kind,
            delay,
            handle,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn kind(&self) -> NavigationKind {
        self.kind
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Stop the navigation if it has not fired yet. Harmless afterwards.
    pub fn cancel(&self) {
        if !self.handle.is_finished() {
            debug!(route = self.route.as_str(), "scheduled navigation cancelled");
        }
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait until the navigation has fired or been cancelled.
    pub async fn wait(self) {
        // A cancelled task reports a JoinError; either way it is over.
        let _ = self.handle.await;
    }
}
