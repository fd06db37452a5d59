//! Test data and configuration builders.

use piccache_core::Config;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration rooted at `cache_root`, with short outbound timeouts.
pub fn test_config(cache_root: &Path) -> Config {
    let mut config = Config::default();
    config.store.root = cache_root.to_path_buf();
    config.user_agent = Some("piccache-tests".to_string());
    config.fetch.timeout_secs = 5;
    config.fetch.connect_timeout_secs = 2;
    config
}

/// Point every platform endpoint at `base`.
pub fn with_platform_endpoints(mut config: Config, base: &str) -> Config {
    config.endpoints.redgifs_api = base.to_string();
    config.endpoints.imgur_api = base.to_string();
    config.endpoints.imgur_media = base.to_string();
    config.endpoints.vidble_media = base.to_string();
    config
}

/// Deterministic bytes that are not valid text.
pub fn media_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// A minimal JPEG-looking payload.
pub fn jpeg_bytes() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
    bytes.extend(media_bytes(512));
    bytes.extend([0xFF, 0xD9]);
    bytes
}

/// Serve `body` at `route` with the given content type, expecting exactly
/// `expected_gets` GETs.
pub async fn mount_media(
    server: &MockServer,
    route: &str,
    content_type: &str,
    body: Vec<u8>,
    expected_gets: u64,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", content_type)
                .set_body_bytes(body),
        )
        .expect(expected_gets)
        .mount(server)
        .await;
}

/// Answer GETs on `route` with a bare status.
pub async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
