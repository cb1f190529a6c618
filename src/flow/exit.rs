use std::sync::Arc;

use tracing::info;

use super::machine::FlowSettings;
use super::navigator::{NavigationKind, Navigator};
use super::scheduler::DelayedNavigation;
use crate::store::SessionStore;

/// Leave impersonation mode.
///
/// The impersonation keys are gone when this returns. Closing the tab is
/// attempted next, and a hard navigation to sign-in is always scheduled
/// behind it: hosts cannot reliably report whether the close worked, and the
/// fallback is a no-op once the tab is gone.
pub fn exit_impersonation(
    store: &SessionStore,
    navigator: Arc<dyn Navigator>,
    settings: &FlowSettings,
) -> DelayedNavigation {
    store.clear_impersonation();

    let closed = navigator.close_tab();
    info!(
        event_name = "impersonation.exit",
        event_domain = "flow",
        tab_closed = closed,
        "impersonation session cleared"
    );

    DelayedNavigation::schedule(
        navigator,
        settings.signin_route.clone(),
        NavigationKind::Hard,
        settings.exit_fallback_delay,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::navigator::{Navigation, RecordingNavigator};
    use crate::models::{Mode, UserProfile};
    use crate::store::MemoryBackend;
    use std::time::Duration;

    fn impersonating_store() -> (Arc<MemoryBackend>, SessionStore) {
        let backend = Arc::new(MemoryBackend::new());
        let store = SessionStore::new(backend.clone());
        store
            .establish(
                UserProfile::new("u1", Some("Jane".into()), None, None),
                "abc",
                Mode::Impersonated,
            )
            .unwrap();
        (backend, store)
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_clears_keys_before_returning() {
        for close_allowed in [true, false] {
            let (backend, store) = impersonating_store();
            let navigator = Arc::new(RecordingNavigator::new(close_allowed));

            let fallback = exit_impersonation(&store, navigator.clone(), &FlowSettings::default());

            assert!(backend.keys().is_empty());
            assert_eq!(store.read(), None);
            assert_eq!(navigator.close_attempts(), 1);
            assert_eq!(fallback.delay(), Duration::from_millis(100));

            fallback.wait().await;
            assert_eq!(
                navigator.navigations(),
                vec![Navigation {
                    route: "/signin".into(),
                    kind: NavigationKind::Hard
                }]
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exit_fallback_fires_even_if_handle_dropped() {
        let (_backend, store) = impersonating_store();
        let navigator = Arc::new(RecordingNavigator::new(true));

        drop(exit_impersonation(&store, navigator.clone(), &FlowSettings::default()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
        assert_eq!(navigator.navigations().len(), 1);
    }
}
