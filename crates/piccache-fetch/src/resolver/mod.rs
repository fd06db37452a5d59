//! URL resolution.
//!
//! A requested URL is not always the URL that serves the bytes. Each
//! platform with its own indirection gets a [`Resolver`]; the
//! [`ResolverRegistry`] tries them in a fixed order and falls back to
//! [`Identity`].

mod identity;
mod imgur;
mod redgifs;
mod vidble;

pub use identity::Identity;
pub use imgur::Imgur;
pub use redgifs::Redgifs;
pub use vidble::Vidble;

use async_trait::async_trait;
use piccache_core::{Config, MediaClient, Result};
use tracing::debug;
use url::Url;

/// One platform's resolution strategy.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether this strategy handles the URL.
    fn matches(&self, url: &Url) -> bool;

    /// True for platforms whose requested URLs never name the media file
    /// itself; classification then skips the basename and defaults to mp4.
    fn forces_resolution(&self) -> bool {
        false
    }

    /// Produce the byte-fetchable URL.
    async fn resolve(&self, url: &Url, client: &dyn MediaClient) -> Result<String>;
}

/// Ordered strategy table with an identity fallback.
pub struct ResolverRegistry {
    resolvers: Vec<Box<dyn Resolver>>,
    fallback: Identity,
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverRegistry {
    /// Registry with no platform strategies; everything resolves to itself.
    pub fn new() -> Self {
        Self {
            resolvers: Vec::new(),
            fallback: Identity,
        }
    }

    /// Append a strategy. Earlier strategies win.
    pub fn with(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    /// The standard table: redgifs, vidble, imgur.
    pub fn standard(config: &Config) -> Self {
        let endpoints = &config.endpoints;
        Self::new()
            .with(Redgifs::new(
                &endpoints.redgifs_api,
                config.redgifs_bearer().map(str::to_string),
            ))
            .with(Vidble::new(&endpoints.vidble_media))
            .with(Imgur::new(
                &endpoints.imgur_api,
                &endpoints.imgur_media,
                config.imgur_client_id().map(str::to_string),
            ))
    }

    pub fn select(&self, url: &Url) -> &dyn Resolver {
        self.resolvers
            .iter()
            .find(|r| r.matches(url))
            .map(|r| r.as_ref())
            .unwrap_or(&self.fallback)
    }

    pub fn forces_resolution(&self, url: &Url) -> bool {
        self.select(url).forces_resolution()
    }

    pub async fn resolve(&self, url: &Url, client: &dyn MediaClient) -> Result<String> {
        let resolver = self.select(url);
        let resolved = resolver.resolve(url, client).await?;
        debug!(resolver = resolver.name(), url = %url, resolved = %resolved, "URL resolved");
        Ok(resolved)
    }
}

/// True when the URL's host is `domain` or one of its subdomains.
pub fn host_matches(url: &Url, domain: &str) -> bool {
    match url.host_str() {
        Some(host) => {
            let host = host.to_ascii_lowercase();
            host == domain
                || host
                    .strip_suffix(domain)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => false,
    }
}

/// Last path segment of a URL, or empty.
pub(crate) fn last_segment(url: &Url) -> &str {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("")
}

/// Join a base URL and a path, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use piccache_core::{Error, FetchedResponse, MediaClient, Result};

    /// Client for resolvers that must not touch the network.
    pub struct OfflineClient;

    #[async_trait]
    impl MediaClient for OfflineClient {
        async fn get(&self, url: &str, _headers: &[(String, String)]) -> Result<FetchedResponse> {
            Err(Error::Network(format!("offline: {}", url)))
        }

        async fn head(&self, url: &str) -> Result<FetchedResponse> {
            Err(Error::Network(format!("offline: {}", url)))
        }
    }
}
