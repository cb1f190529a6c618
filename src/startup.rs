//! Running a single delegated-login page from the command line.

use std::sync::Arc;

use tracing::info;

use crate::config::ConfigV1;
use crate::flow::{LoginStatus, Navigator};
use crate::models::Flow;
use crate::state::AppState;

/// Runs one page instance for `page_url` and waits for its navigation.
///
/// # Errors
///
/// Returns an error if the page instance rejects the token. Verification
/// failures are not errors here; they are reported in the returned status.
pub async fn run(
    config: Arc<ConfigV1>,
    navigator: Arc<dyn Navigator>,
    flow: Flow,
    page_url: &str,
) -> Result<LoginStatus, Box<dyn std::error::Error>> {
    let state = AppState::new(config, navigator);
    let mut page = state.login_page(flow);
    info!(flow_id = %page.id(), "Starting {} login", flow);

    let status = page.start(page_url).await?;
    info!("{}: {}", status.title(), status.message());

    if let Some(banner) = state.banner() {
        info!(
            "{}: viewing as {} until {}",
            banner.label(),
            banner.viewing_as,
            banner.advisory_expiry
        );
    }

    page.finish().await;
    Ok(status)
}

/// Leaves impersonation mode and waits for the sign-in fallback.
pub async fn exit(config: Arc<ConfigV1>, navigator: Arc<dyn Navigator>) {
    let state = AppState::new(config, navigator);
    state.exit_impersonation().wait().await;
}
