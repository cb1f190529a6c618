use std::sync::{Mutex, MutexGuard};

use tracing::info;

/// How a route change is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// Client-side route change; already-initialised state survives.
    Soft,
    /// Full reload; everything re-initialises from the session store.
    Hard,
}

/// The hosting view's navigation capabilities.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str, kind: NavigationKind);
    /// Try to close the hosting tab/window. Hosts that cannot tell whether
    /// it worked return `false`.
    fn close_tab(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub route: String,
    pub kind: NavigationKind,
}

/// Records every call instead of acting on it.
pub struct RecordingNavigator {
    navigations: Mutex<Vec<Navigation>>,
    close_attempts: Mutex<usize>,
    close_allowed: bool,
}

impl RecordingNavigator {
    /// `close_allowed` is what `close_tab` reports.
    pub fn new(close_allowed: bool) -> Self {
        RecordingNavigator {
            navigations: Mutex::new(Vec::new()),
            close_attempts: Mutex::new(0),
            close_allowed,
        }
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        lock(&self.navigations).clone()
    }

    pub fn close_attempts(&self) -> usize {
        *lock(&self.close_attempts)
    }
}

impl Default for RecordingNavigator {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str, kind: NavigationKind) {
        lock(&self.navigations).push(Navigation {
            route: route.to_string(),
            kind,
        });
    }

    fn close_tab(&self) -> bool {
        *lock(&self.close_attempts) += 1;
        self.close_allowed
    }
}

/// Logs navigations. Used by the CLI, which has no view to move.
#[derive(Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn navigate(&self, route: &str, kind: NavigationKind) {
        info!(
            event_name = "navigation",
            event_domain = "flow",
            route,
            kind = ?kind,
            "navigating to {}",
            route
        );
    }

    fn close_tab(&self) -> bool {
        info!("close requested; no tab to close");
        false
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}
