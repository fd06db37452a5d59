//! Test helper functions and utilities.

use piccache_api::{AppState, create_router};
use piccache_core::Config;
use piccache_fetch::Engine;
use reqwest::{Client, redirect};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Start an API server for testing and return its address.
pub async fn start_test_server(
    config: Config,
) -> anyhow::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    let engine = Engine::from_config(&config)?;
    let state = Arc::new(AppState::new(Arc::new(engine), Arc::new(config)));

    let app = create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Test server stopped");
        }
    });

    Ok((addr, handle))
}

/// HTTP client for tests. Redirects are not followed so misses can be
/// asserted on.
pub fn test_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create test client")
}

/// Client for the cache endpoint of one test server.
pub struct ApiTestClient {
    client: Client,
    base_url: String,
}

impl ApiTestClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            client: test_client(),
            base_url: format!("http://{}", addr),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Endpoint path with `url` as the query parameter.
    pub fn cache_path(media_url: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(media_url.as_bytes()).collect();
        format!("/pic?url={}", encoded)
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client.get(self.url(path)).send().await
    }

    /// GET a media URL through the cache.
    pub async fn get_url(&self, media_url: &str) -> reqwest::Result<reqwest::Response> {
        self.get(&Self::cache_path(media_url)).await
    }

    /// GET a media URL with a `Range` header.
    pub async fn get_range(
        &self,
        media_url: &str,
        range: &str,
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(self.url(&Self::cache_path(media_url)))
            .header(reqwest::header::RANGE, range)
            .send()
            .await
    }

    pub async fn head_url(&self, media_url: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .head(self.url(&Self::cache_path(media_url)))
            .send()
            .await
    }

    pub async fn post<T: serde::Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> reqwest::Result<reqwest::Response> {
        self.client.post(self.url(path)).json(body).send().await
    }

    /// POST `{"url": ...}` to the warm endpoint.
    pub async fn warm(&self, media_url: &str) -> reqwest::Result<reqwest::Response> {
        self.post("/prepare", &serde_json::json!({ "url": media_url }))
            .await
    }

    pub async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> reqwest::Result<reqwest::Response> {
        self.client.request(method, self.url(path)).send().await
    }

    /// Check health endpoint.
    pub async fn health(&self) -> anyhow::Result<bool> {
        let resp = self.get("/health").await?;
        Ok(resp.status().is_success())
    }
}
