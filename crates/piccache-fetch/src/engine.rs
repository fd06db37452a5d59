//! The fetch-and-persist engine.

use crate::classifier::Classifier;
use crate::client::ReqwestClient;
use crate::resolver::ResolverRegistry;
use piccache_core::{
    Config, FetchOutcome, MediaClient, ResponseHeaders, Result, ServeOutcome, media,
};
use piccache_store::{FilesystemStore, store_basename};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Ensures URLs are cached and answers serve lookups.
///
/// Holds no per-request state; one instance is shared by every request.
pub struct Engine {
    store: FilesystemStore,
    client: Arc<dyn MediaClient>,
    resolvers: ResolverRegistry,
    classifier: Classifier,
}

impl Engine {
    pub fn new(
        store: FilesystemStore,
        client: Arc<dyn MediaClient>,
        resolvers: ResolverRegistry,
    ) -> Self {
        Self {
            store,
            client,
            resolvers,
            classifier: Classifier::new(),
        }
    }

    /// Production wiring: reqwest client, standard resolver table.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = ReqwestClient::new(&config.fetch, &config.user_agent())?;
        Ok(Self::new(
            FilesystemStore::from_config(&config.store),
            Arc::new(client),
            ResolverRegistry::standard(config),
        ))
    }

    pub fn store(&self) -> &FilesystemStore {
        &self.store
    }

    /// Make sure `url` is in the store, fetching it at most once.
    ///
    /// Expected failures (resolution, transport, 404, HTML) come back as
    /// outcomes. `Err` means the URL itself is unusable or the store failed.
    pub async fn ensure_cached(&self, url: &str) -> Result<FetchOutcome> {
        let location = self.store.locate(url)?;

        if let Some(existing) = self.store.probe(&location).await? {
            debug!(url = %url, path = %existing.path.display(), "Cache hit");
            return Ok(FetchOutcome::already_exists(existing.path));
        }

        let parsed = Url::parse(url)?;
        let resolved = match self.resolvers.resolve(&parsed, self.client.as_ref()).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(url = %url, error = %e, "Resolution failed");
                return Ok(FetchOutcome::resolution_failed());
            }
        };

        let response = match self.client.get(&resolved, &[]).await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, resolved = %resolved, error = %e, "Fetch failed");
                return Ok(FetchOutcome::fetch_failed(ResponseHeaders::new()));
            }
        };

        if !response.is_success() || response.body.is_empty() {
            if response.is_not_found() {
                debug!(url = %url, status = ?response.status, "Origin reports not found");
                return Ok(FetchOutcome::not_found(response.headers));
            }
            warn!(url = %url, status = ?response.status, bytes = response.body.len(), "Fetch returned no media");
            return Ok(FetchOutcome::fetch_failed(response.headers));
        }

        if media::looks_like_html(response.content_type(), &response.body) {
            warn!(url = %url, resolved = %resolved, "Rejected HTML response");
            return Ok(FetchOutcome::rejected_html(response.headers));
        }

        let forced = self.resolvers.forces_resolution(&parsed);
        let signal_name = classification_name(url, &resolved, &location.basename);
        let ext = self
            .classifier
            .classify(
                &signal_name,
                &resolved,
                response.content_type(),
                forced,
                self.client.as_ref(),
            )
            .await;

        let object = self.store.write(&location, &ext, response.body).await?;
        info!(
            url = %url,
            path = %object.path.display(),
            bytes = object.size,
            "Added to cache"
        );
        Ok(FetchOutcome::added(object.path, response.headers))
    }

    /// Ensure the URL is cached, then report what can be served.
    pub async fn lookup(&self, url: &str) -> Result<ServeOutcome> {
        let outcome = self.ensure_cached(url).await?;
        debug!(url = %url, comment = %outcome.comment, "Ensure-cached finished");

        Ok(match self.store.lookup(url).await? {
            Some(object) => {
                let content_type = object.content_type();
                ServeOutcome::hit(object.path, object.size, content_type)
            }
            None => ServeOutcome::miss(),
        })
    }
}

/// Basename whose extension feeds classification.
///
/// A resolver that substituted other media (an imgur `.gif` answered by its
/// `.mp4`) makes the requested basename a lie, so the resolved URL's is used.
fn classification_name(url: &str, resolved: &str, requested_basename: &str) -> String {
    if resolved == url {
        return requested_basename.to_string();
    }
    match Url::parse(resolved) {
        Ok(resolved) => store_basename(&resolved),
        Err(_) => requested_basename.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{Imgur, Redgifs};
    use async_trait::async_trait;
    use bytes::Bytes;
    use piccache_core::outcome::comment;
    use piccache_core::{Error, FetchedResponse};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// In-memory origin that counts GETs.
    #[derive(Default)]
    struct CountingClient {
        responses: HashMap<String, FetchedResponse>,
        heads: HashMap<String, FetchedResponse>,
        gets: AtomicUsize,
    }

    impl CountingClient {
        fn with(mut self, url: &str, status: u16, content_type: Option<&str>, body: &[u8]) -> Self {
            let mut headers = ResponseHeaders::new();
            if let Some(ct) = content_type {
                headers.insert("content-type", ct);
            }
            self.responses.insert(
                url.to_string(),
                FetchedResponse {
                    status: Some(status),
                    headers,
                    body: Bytes::copy_from_slice(body),
                },
            );
            self
        }

        fn with_head(mut self, url: &str, content_type: &str) -> Self {
            let mut headers = ResponseHeaders::new();
            headers.insert("content-type", content_type);
            self.heads.insert(
                url.to_string(),
                FetchedResponse {
                    status: Some(200),
                    headers,
                    body: Bytes::new(),
                },
            );
            self
        }

        fn gets(&self) -> usize {
            self.gets.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaClient for CountingClient {
        async fn get(&self, url: &str, _headers: &[(String, String)]) -> Result<FetchedResponse> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Network(format!("connection refused: {}", url)))
        }

        async fn head(&self, url: &str) -> Result<FetchedResponse> {
            self.heads
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Network(format!("connection refused: {}", url)))
        }
    }

    fn engine(client: Arc<CountingClient>, resolvers: ResolverRegistry) -> (Engine, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FilesystemStore::new(temp_dir.path().join("piccache"), 3);
        (Engine::new(store, client, resolvers), temp_dir)
    }

    const JPG_URL: &str = "https://i.redd.it/abc.jpg";

    #[tokio::test]
    async fn test_second_call_does_not_fetch() {
        let client = Arc::new(CountingClient::default().with(JPG_URL, 200, Some("image/jpeg"), b"JFIF"));
        let (engine, _temp_dir) = engine(client.clone(), ResolverRegistry::new());

        let first = engine.ensure_cached(JPG_URL).await.unwrap();
        assert!(first.cached && first.fetched);
        assert_eq!(first.comment, comment::ADDED_TO_CACHE);

        let second = engine.ensure_cached(JPG_URL).await.unwrap();
        assert!(second.cached && !second.fetched);
        assert_eq!(second.comment, comment::ALREADY_EXISTS);
        assert_eq!(second.filename, first.filename);
        assert_eq!(client.gets(), 1);
    }

    #[tokio::test]
    async fn test_stored_bytes_match_origin() {
        let body: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let client = Arc::new(CountingClient::default().with(JPG_URL, 200, Some("image/jpeg"), &body));
        let (engine, _temp_dir) = engine(client, ResolverRegistry::new());

        let outcome = engine.ensure_cached(JPG_URL).await.unwrap();
        let path = outcome.filename.unwrap();
        assert!(path.to_string_lossy().ends_with("-abc.jpg"));
        assert_eq!(std::fs::read(path).unwrap(), body);
        assert_eq!(outcome.response_headers.content_type(), Some("image/jpeg"));
    }

    #[tokio::test]
    async fn test_not_found_is_negative_cached_without_a_file() {
        let url = "https://i.redd.it/gone.jpg";
        let client = Arc::new(CountingClient::default().with(url, 404, None, b""));
        let (engine, _temp_dir) = engine(client.clone(), ResolverRegistry::new());

        let outcome = engine.ensure_cached(url).await.unwrap();
        assert!(outcome.cached && !outcome.fetched);
        assert_eq!(outcome.comment, comment::GOT_404);
        assert!(outcome.filename.is_none());

        let served = engine.lookup(url).await.unwrap();
        assert!(!served.hit);
        // One GET per ensure-cached call, none extra for the serve check.
        assert_eq!(client.gets(), 2);
    }

    #[tokio::test]
    async fn test_other_statuses_and_empty_bodies_fail() {
        let error_url = "https://example.com/err.png";
        let empty_url = "https://example.com/empty.png";
        let client = Arc::new(
            CountingClient::default()
                .with(error_url, 503, Some("image/png"), b"png")
                .with(empty_url, 200, Some("image/png"), b""),
        );
        let (engine, _temp_dir) = engine(client, ResolverRegistry::new());

        for url in [error_url, empty_url] {
            let outcome = engine.ensure_cached(url).await.unwrap();
            assert!(!outcome.cached && !outcome.fetched, "{url}");
            assert_eq!(outcome.comment, comment::FETCH_FAILED);
        }
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let (engine, _temp_dir) = engine(Arc::new(CountingClient::default()), ResolverRegistry::new());
        let outcome = engine.ensure_cached("https://dead.example/a.gif").await.unwrap();
        assert_eq!(outcome.comment, comment::FETCH_FAILED);
        assert!(!outcome.cached);
    }

    #[tokio::test]
    async fn test_html_is_rejected_and_not_stored() {
        let declared = "https://example.com/login.jpg";
        let sniffed = "https://example.com/sniffed.jpg";
        let client = Arc::new(
            CountingClient::default()
                .with(declared, 200, Some("text/html; charset=utf-8"), b"<html></html>")
                .with(sniffed, 200, Some("image/jpeg"), b"\n<!DOCTYPE html><html>"),
        );
        let (engine, _temp_dir) = engine(client, ResolverRegistry::new());

        for url in [declared, sniffed] {
            let outcome = engine.ensure_cached(url).await.unwrap();
            assert!(!outcome.cached && outcome.fetched, "{url}");
            assert_eq!(outcome.comment, comment::RESPONSE_WAS_HTML);
            assert!(!engine.store().is_cached(url).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_resolution_failure() {
        let resolvers = ResolverRegistry::new().with(Redgifs::new("https://api.test", None));
        let (engine, _temp_dir) = engine(Arc::new(CountingClient::default()), resolvers);

        let outcome = engine.ensure_cached("https://www.redgifs.com/watch/abc").await.unwrap();
        assert!(!outcome.cached && !outcome.fetched);
        assert_eq!(outcome.comment, comment::RESOLUTION_FAILED);
    }

    #[tokio::test]
    async fn test_forced_platform_is_stored_as_mp4() {
        let client = Arc::new(
            CountingClient::default()
                .with(
                    "https://api.test/v2/gifs/abc/hd.m3u8",
                    200,
                    None,
                    b"#EXTM3U\nhttps://media.test/abc.m4s\n",
                )
                .with("https://media.test/abc.m4s", 200, None, b"video bytes"),
        );
        let resolvers = ResolverRegistry::new().with(Redgifs::new("https://api.test", None));
        let (engine, _temp_dir) = engine(client, resolvers);

        let url = "https://www.redgifs.com/watch/abc";
        let outcome = engine.ensure_cached(url).await.unwrap();
        assert_eq!(outcome.comment, comment::ADDED_TO_CACHE);

        let served = engine.lookup(url).await.unwrap();
        assert!(served.hit);
        assert_eq!(served.content_type.as_deref(), Some("video/mp4"));
        assert_eq!(served.length, 11);
        assert!(served.filename.unwrap().to_string_lossy().ends_with("-abc.mp4"));
    }

    #[tokio::test]
    async fn test_substituted_media_is_classified_by_resolved_url() {
        let client = Arc::new(
            CountingClient::default()
                .with_head("https://media.test/Ab12.mp4", "video/mp4")
                .with("https://media.test/Ab12.mp4", 200, None, b"mp4 bytes"),
        );
        let resolvers = ResolverRegistry::new().with(Imgur::new(
            "https://api.test",
            "https://media.test",
            None,
        ));
        let (engine, _temp_dir) = engine(client, resolvers);

        let url = "https://i.imgur.com/Ab12.gif";
        let outcome = engine.ensure_cached(url).await.unwrap();
        assert_eq!(outcome.comment, comment::ADDED_TO_CACHE);
        assert!(outcome.filename.unwrap().to_string_lossy().ends_with("-Ab12.gif.mp4"));

        let served = engine.lookup(url).await.unwrap();
        assert_eq!(served.content_type.as_deref(), Some("video/mp4"));
    }

    #[test]
    fn test_classification_name() {
        assert_eq!(classification_name("https://a.test/x.gif", "https://a.test/x.gif", "x.gif"), "x.gif");
        assert_eq!(classification_name("https://a.test/x.gif", "https://b.test/x.mp4", "x.gif"), "x.mp4");
    }

    #[tokio::test]
    async fn test_unusable_url_is_an_error() {
        let (engine, _temp_dir) = engine(Arc::new(CountingClient::default()), ResolverRegistry::new());
        assert!(matches!(
            engine.ensure_cached("not a url").await,
            Err(Error::InvalidUrl(_))
        ));
    }
}
