//! Storage extension selection.

use piccache_core::{MediaClient, media};
use tracing::debug;

/// Extension used when a forced-resolution platform gives no other signal.
pub const FORCED_DEFAULT_EXTENSION: &str = "mp4";

/// Picks the extension a fetched object is stored under.
///
/// Precedence, first match wins:
/// 1. a known media extension on the basename, unless the platform forces
///    resolution (its page URLs never name the media file);
/// 2. the `Content-Type` of the media response, or of a HEAD probe against
///    the resolved URL when the response carried none;
/// 3. `mp4` for forced-resolution platforms;
/// 4. the raw basename extension, possibly empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct Classifier;

impl Classifier {
    pub fn new() -> Self {
        Self
    }

    /// Step 1 alone. Pure.
    pub fn from_basename(&self, basename: &str, forced: bool) -> Option<&'static str> {
        if forced {
            return None;
        }
        media::known_extension(media::extension_of(basename))
    }

    pub async fn classify(
        &self,
        basename: &str,
        resolved_url: &str,
        fetched_content_type: Option<&str>,
        forced: bool,
        client: &dyn MediaClient,
    ) -> String {
        if let Some(ext) = self.from_basename(basename, forced) {
            return ext.to_string();
        }

        let from_header = match fetched_content_type {
            Some(content_type) => media::extension_from_content_type(content_type),
            None => probe_content_type(resolved_url, client)
                .await
                .and_then(|ct| media::extension_from_content_type(&ct)),
        };
        if let Some(ext) = from_header {
            return ext;
        }

        if forced {
            return FORCED_DEFAULT_EXTENSION.to_string();
        }
        media::extension_of(basename).to_string()
    }
}

/// `Content-Type` reported by a HEAD request, if any.
async fn probe_content_type(url: &str, client: &dyn MediaClient) -> Option<String> {
    match client.head(url).await {
        Ok(response) => response.content_type().map(str::to_string),
        Err(e) => {
            debug!(url = %url, error = %e, "Content-Type probe failed");
            None
        }
    }
}
