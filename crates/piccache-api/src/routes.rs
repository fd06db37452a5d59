//! API route definitions.

use axum::{
    Router,
    routing::{any, get},
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{cache, health};
use crate::middleware;
use crate::state::AppState;

/// Paths the cache endpoint answers on.
pub const CACHE_PATHS: [&str; 3] = ["/", "/pic", "/prepare"];

/// Create the main API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new();
    for path in CACHE_PATHS {
        router = router.route(path, any(cache::dispatch));
    }

    router
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::request_id))
        .layer(middleware::cors_layer())
        .with_state(state)
}
