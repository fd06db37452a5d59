//! Redgifs: watch/embed pages resolve through the platform's HLS manifest.

use super::{Resolver, endpoint, host_matches, last_segment};
use async_trait::async_trait;
use piccache_core::{Error, MediaClient, Result, media};
use tracing::warn;
use url::Url;

const DOMAIN: &str = "redgifs.com";

pub struct Redgifs {
    api_base: String,
    bearer: Option<String>,
}

impl Redgifs {
    pub fn new(api_base: &str, bearer: Option<String>) -> Self {
        Self {
            api_base: api_base.to_string(),
            bearer,
        }
    }

    /// Media ID embedded in the path: last segment, extension dropped,
    /// lowercased.
    pub fn media_id(url: &Url) -> Result<String> {
        let segment = last_segment(url);
        let id = segment.split('.').next().unwrap_or("").to_ascii_lowercase();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Resolution(format!("no redgifs id in {}", url)));
        }
        Ok(id)
    }

    fn manifest_url(&self, id: &str) -> String {
        endpoint(&self.api_base, &format!("v2/gifs/{}/hd.m3u8", id))
    }
}

/// First line of an HLS manifest that is neither blank nor a comment/tag.
pub fn first_media_line(manifest: &str) -> Option<&str> {
    manifest
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
}

#[async_trait]
impl Resolver for Redgifs {
    fn name(&self) -> &'static str {
        "redgifs"
    }

    /// Pages on redgifs hosts. Direct media files on its CDN carry a media
    /// extension and are left to the identity strategy.
    fn matches(&self, url: &Url) -> bool {
        host_matches(url, DOMAIN)
            && media::known_extension(media::extension_of(last_segment(url))).is_none()
    }

    fn forces_resolution(&self) -> bool {
        true
    }

    async fn resolve(&self, url: &Url, client: &dyn MediaClient) -> Result<String> {
        let id = Self::media_id(url)?;
        let manifest_url = self.manifest_url(&id);

        let mut headers = Vec::new();
        if let Some(bearer) = &self.bearer {
            headers.push(("Authorization".to_string(), format!("Bearer {}", bearer)));
        }

        let response = client
            .get(&manifest_url, &headers)
            .await
            .map_err(|e| Error::Resolution(format!("manifest fetch failed: {}", e)))?;
        if !response.is_success() {
            warn!(id = %id, status = ?response.status, "Redgifs manifest request rejected");
            return Err(Error::Resolution(format!(
                "manifest request returned {:?}",
                response.status
            )));
        }

        let manifest = String::from_utf8_lossy(&response.body);
        let line = first_media_line(&manifest)
            .ok_or_else(|| Error::Resolution(format!("empty manifest for {}", id)))?;

        // Manifest entries may be relative to the manifest itself.
        let media_url = Url::parse(&manifest_url)
            .and_then(|base| base.join(line))
            .map_err(|e| Error::Resolution(format!("bad manifest entry {:?}: {}", line, e)))?;
        Ok(media_url.to_string())
    }
}
