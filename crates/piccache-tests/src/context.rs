//! Test context: a running server over a temporary cache root.

use crate::fixtures::test_config;
use crate::helpers::{ApiTestClient, start_test_server};
use piccache_core::Config;
use std::net::SocketAddr;
use std::path::Path;
use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Drop this to stop the server and delete the cache.
pub struct TestContext {
    pub addr: SocketAddr,
    pub api: ApiTestClient,
    pub cache_root: TempDir,
    handle: JoinHandle<()>,
}

impl TestContext {
    /// Server with the default test configuration.
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_config(|config| config).await
    }

    /// Server whose configuration is adjusted by `configure` before start.
    pub async fn with_config(configure: impl FnOnce(Config) -> Config) -> anyhow::Result<Self> {
        crate::init_test_logging();

        let cache_root = TempDir::new()?;
        let config = configure(test_config(cache_root.path()));
        let (addr, handle) = start_test_server(config).await?;

        Ok(Self {
            addr,
            api: ApiTestClient::new(addr),
            cache_root,
            handle,
        })
    }

    pub fn cache_root(&self) -> &Path {
        self.cache_root.path()
    }

    /// Regular files currently in the store, excluding temporaries.
    pub fn stored_files(&self) -> Vec<std::path::PathBuf> {
        fn walk(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
            let Ok(entries) = std::fs::read_dir(dir) else {
                return;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    walk(&path, out);
                } else if !entry.file_name().to_string_lossy().starts_with('.') {
                    out.push(path);
                }
            }
        }

        let mut files = Vec::new();
        walk(self.cache_root.path(), &mut files);
        files
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
