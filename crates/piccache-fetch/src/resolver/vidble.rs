//! Vidble watch pages: `/watch?v=<id>` rewrites to `<media>/<id>.mp4`.

use super::{Resolver, endpoint, host_matches};
use async_trait::async_trait;
use piccache_core::{Error, MediaClient, Result};
use url::Url;

const DOMAIN: &str = "vidble.com";

pub struct Vidble {
    media_base: String,
}

impl Vidble {
    pub fn new(media_base: &str) -> Self {
        Self {
            media_base: media_base.to_string(),
        }
    }

    /// Direct video URL for a watch page. No network access.
    pub fn rewrite(&self, url: &Url) -> Result<String> {
        let id = url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| Error::Resolution(format!("no v= parameter in {}", url)))?;

        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Resolution(format!("malformed vidble id {:?}", id)));
        }
        Ok(endpoint(&self.media_base, &format!("{}.mp4", id)))
    }
}

#[async_trait]
impl Resolver for Vidble {
    fn name(&self) -> &'static str {
        "vidble"
    }

    fn matches(&self, url: &Url) -> bool {
        host_matches(url, DOMAIN) && url.path().starts_with("/watch")
    }

    fn forces_resolution(&self) -> bool {
        true
    }

    async fn resolve(&self, url: &Url, _client: &dyn MediaClient) -> Result<String> {
        self.rewrite(url)
    }
}
