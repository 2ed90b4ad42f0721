mod auth;
mod models;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use cosfs_core::config::WebSettings;
use cosfs_storage::locator::StorageLocator;
use cosfs_storage::management::StorageManagement;

pub use routes::build_router;
pub use state::AppState;

/// Start the management HTTP endpoint and serve until the process exits.
pub async fn start_management_server(
    settings: WebSettings,
    locator: Arc<StorageLocator>,
) -> anyhow::Result<()> {
    if settings.admin_token.is_none() {
        tracing::warn!("No admin token configured, management API is unauthenticated");
    }

    let state = Arc::new(AppState {
        management: StorageManagement::new(locator),
        admin_token: settings.admin_token,
    });

    let app = routes::build_router(state);

    let addr: SocketAddr = settings.listen_addr.parse()?;
    tracing::info!("Starting management API on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
