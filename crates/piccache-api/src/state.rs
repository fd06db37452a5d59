//! Application state shared across handlers.

use piccache_core::Config;
use piccache_fetch::Engine;
use std::sync::Arc;

/// Application state shared across all handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, config: Arc<Config>) -> Self {
        Self { engine, config }
    }
}
