//! Liveness and readiness handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// `healthy`, or `degraded` when nothing can be written to the store.
    pub status: &'static str,
    pub version: &'static str,
    pub cache_writable: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let cache_writable = cache_dir_writable(state.engine.store().cache_dir()).await;
    Json(HealthResponse {
        status: if cache_writable { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        cache_writable,
    })
}

/// 200 once the store can accept writes, 503 otherwise.
pub async fn ready(State(state): State<Arc<AppState>>) -> StatusCode {
    let dir = state.engine.store().cache_dir();
    if cache_dir_writable(dir).await {
        StatusCode::OK
    } else {
        warn!(cache_dir = %dir.display(), "Cache directory is not writable");
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// The cache dir, or its nearest existing ancestor when it has not been
/// created yet, is a directory without the read-only flag.
async fn cache_dir_writable(dir: &Path) -> bool {
    for candidate in dir.ancestors() {
        match tokio::fs::metadata(candidate).await {
            Ok(meta) => return meta.is_dir() && !meta.permissions().readonly(),
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(_) => return false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_cache_dir_under_writable_parent() {
        let temp_dir = TempDir::new().unwrap();
        assert!(cache_dir_writable(temp_dir.path()).await);
        assert!(cache_dir_writable(&temp_dir.path().join("piccache/nested")).await);
    }

    #[tokio::test]
    async fn test_cache_dir_below_a_file_is_not_writable() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        assert!(!cache_dir_writable(&file).await);
        assert!(!cache_dir_writable(&file.join("piccache")).await);
    }
}
