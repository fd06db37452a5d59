//! HTTP surface for piccache.
//!
//! One method-dispatched cache endpoint (mounted at `/`, `/pic` and
//! `/prepare`) plus health probes. [`serve`] runs the router until the
//! process is told to stop.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod range;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Header carrying HIT or MISS.
pub const STATUS_HEADER: &str = "x-piccache-status";
/// Header naming the served file, relative to the cache directory.
pub const FILE_HEADER: &str = "x-piccache-file";
/// Header carrying the error kind on an opaque 500.
pub const ERROR_HEADER: &str = "x-piccache-error";

/// Serve the API on an already-bound listener until ctrl-c.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), "Piccache listening");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
