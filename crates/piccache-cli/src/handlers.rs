//! Command handlers.

use anyhow::Context;
use piccache_api::AppState;
use piccache_core::Config;
use piccache_fetch::Engine;
use piccache_store::FilesystemStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Run the HTTP server until ctrl-c.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let engine = Engine::from_config(&config).context("Failed to build fetch engine")?;
    let bind = config.server.bind.clone();
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    info!(
        bind = %bind,
        cache_dir = %config.store.cache_dir().display(),
        "Starting piccache"
    );
    let state = Arc::new(AppState::new(Arc::new(engine), Arc::new(config)));
    piccache_api::serve(listener, state)
        .await
        .context("Server error")?;
    Ok(())
}

/// Ensure one URL is cached and print the outcome as JSON.
pub async fn warm(config: &Config, url: &str) -> anyhow::Result<()> {
    let engine = Engine::from_config(config).context("Failed to build fetch engine")?;
    let outcome = engine
        .ensure_cached(url)
        .await
        .with_context(|| format!("Cannot cache {}", url))?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

pub fn locate(config: &Config, url: &str) -> anyhow::Result<()> {
    let store = FilesystemStore::from_config(&config.store);
    let location = store
        .locate(url)
        .with_context(|| format!("Cannot locate {}", url))?;

    println!("hash:     {}", location.url_hash);
    println!("shard:    {}", location.shard_dir.display());
    println!("basename: {}", location.basename);
    match store.find(&location)? {
        Some(object) => println!("cached:   {} ({} bytes)", object.path.display(), object.size),
        None => println!("cached:   (not cached)"),
    }
    Ok(())
}

pub fn show_config(config: &Config) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&config.redacted())?);
    Ok(())
}
