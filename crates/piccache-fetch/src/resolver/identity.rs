//! Identity resolution: the requested URL is the fetch target.

use super::Resolver;
use async_trait::async_trait;
use piccache_core::{MediaClient, Result};
use url::Url;

#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

#[async_trait]
impl Resolver for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn matches(&self, _url: &Url) -> bool {
        true
    }

    async fn resolve(&self, url: &Url, _client: &dyn MediaClient) -> Result<String> {
        Ok(url.to_string())
    }
}
