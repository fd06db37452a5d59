//! Imgur: animated links prefer the sibling `.mp4`; pages and albums go
//! through the metadata API.

use super::{Resolver, endpoint, host_matches, last_segment};
use async_trait::async_trait;
use piccache_core::{Error, MediaClient, Result, media};
use serde::Deserialize;
use tracing::debug;
use url::Url;

const DOMAIN: &str = "imgur.com";

/// Extensions imgur serves as (pseudo-)animations.
const ANIMATED_SUFFIXES: &[&str] = &["gifv", "gif"];

pub struct Imgur {
    api_base: String,
    media_base: String,
    client_id: Option<String>,
}

/// What an imgur URL points at.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Image(String),
    Album(String),
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    success: bool,
    data: Option<ApiData>,
}

#[derive(Debug, Deserialize)]
struct ApiData {
    link: Option<String>,
    mp4: Option<String>,
    #[serde(default)]
    images: Vec<ApiImage>,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
    link: Option<String>,
    mp4: Option<String>,
}

impl Imgur {
    pub fn new(api_base: &str, media_base: &str, client_id: Option<String>) -> Self {
        Self {
            api_base: api_base.to_string(),
            media_base: media_base.to_string(),
            client_id,
        }
    }

    fn target(url: &Url) -> Result<Target> {
        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|p| !p.is_empty()).collect())
            .unwrap_or_default();

        let (is_album, raw) = match segments.as_slice() {
            ["a" | "gallery", id, ..] => (true, *id),
            [.., last] => (false, *last),
            [] => return Err(Error::Resolution(format!("no imgur id in {}", url))),
        };
        let id = raw.split('.').next().unwrap_or("");
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Resolution(format!("malformed imgur id {:?}", raw)));
        }
        Ok(if is_album {
            Target::Album(id.to_string())
        } else {
            Target::Image(id.to_string())
        })
    }

    /// HEAD the direct `.mp4` for an animated image. Accepted only when the
    /// origin answers with an image or video content type.
    async fn probe_video(&self, id: &str, client: &dyn MediaClient) -> Option<String> {
        let candidate = endpoint(&self.media_base, &format!("{}.mp4", id));
        match client.head(&candidate).await {
            Ok(response)
                if response.is_success()
                    && response
                        .content_type()
                        .and_then(media::extension_from_content_type)
                        .is_some() =>
            {
                Some(candidate)
            }
            Ok(response) => {
                debug!(url = %candidate, status = ?response.status, "Imgur video probe rejected");
                None
            }
            Err(e) => {
                debug!(url = %candidate, error = %e, "Imgur video probe failed");
                None
            }
        }
    }

    async fn metadata_link(&self, target: &Target, client: &dyn MediaClient) -> Result<String> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| Error::Resolution("imgur client id not configured".to_string()))?;

        let api_url = match target {
            Target::Image(id) => endpoint(&self.api_base, &format!("3/image/{}", id)),
            Target::Album(id) => endpoint(&self.api_base, &format!("3/album/{}", id)),
        };
        let headers = [("Authorization".to_string(), format!("Client-ID {}", client_id))];

        let response = client
            .get(&api_url, &headers)
            .await
            .map_err(|e| Error::Resolution(format!("imgur API unreachable: {}", e)))?;
        if !response.is_success() {
            return Err(Error::Resolution(format!(
                "imgur API returned {:?}",
                response.status
            )));
        }
        if media::looks_like_html(response.content_type(), &response.body) {
            return Err(Error::Resolution("imgur API returned HTML".to_string()));
        }

        let payload: ApiResponse = serde_json::from_slice(&response.body)
            .map_err(|e| Error::Resolution(format!("imgur API returned invalid JSON: {}", e)))?;
        if !payload.success {
            return Err(Error::Resolution("imgur API reported failure".to_string()));
        }

        let data = payload
            .data
            .ok_or_else(|| Error::Resolution("imgur API returned no data".to_string()))?;
        let link = match target {
            Target::Image(_) => data.mp4.or(data.link),
            Target::Album(_) => data
                .images
                .into_iter()
                .next()
                .and_then(|image| image.mp4.or(image.link)),
        };
        link.filter(|l| !l.is_empty())
            .ok_or_else(|| Error::Resolution("imgur API returned no media link".to_string()))
    }
}

#[async_trait]
impl Resolver for Imgur {
    fn name(&self) -> &'static str {
        "imgur"
    }

    fn matches(&self, url: &Url) -> bool {
        host_matches(url, DOMAIN)
    }

    async fn resolve(&self, url: &Url, client: &dyn MediaClient) -> Result<String> {
        let ext = media::extension_of(last_segment(url)).to_ascii_lowercase();
        let target = Self::target(url)?;

        if ANIMATED_SUFFIXES.contains(&ext.as_str()) {
            if let Target::Image(id) = &target {
                if let Some(video) = self.probe_video(id, client).await {
                    return Ok(video);
                }
            }
        } else if media::known_extension(&ext).is_some() {
            return Ok(url.to_string());
        }

        self.metadata_link(&target, client).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ReqwestClient;
    use piccache_core::config::FetchConfig;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ReqwestClient {
        ReqwestClient::new(&FetchConfig::default(), "test").unwrap()
    }

    fn imgur(server: &MockServer, client_id: Option<&str>) -> Imgur {
        Imgur::new(&server.uri(), &server.uri(), client_id.map(str::to_string))
    }

    #[test]
    fn test_target_parsing() {
        let parse = |s: &str| Imgur::target(&Url::parse(s).unwrap());
        assert_eq!(parse("https://imgur.com/AbC12").unwrap(), Target::Image("AbC12".into()));
        assert_eq!(parse("https://i.imgur.com/AbC12.gifv").unwrap(), Target::Image("AbC12".into()));
        assert_eq!(parse("https://imgur.com/a/XyZ").unwrap(), Target::Album("XyZ".into()));
        assert_eq!(parse("https://imgur.com/gallery/XyZ").unwrap(), Target::Album("XyZ".into()));
        assert!(parse("https://imgur.com/").is_err());
        assert!(parse("https://imgur.com/bad-id!").is_err());
    }

    #[tokio::test]
    async fn test_static_direct_link_is_identity() {
        let server = MockServer::start().await;
        let url = Url::parse("https://i.imgur.com/AbC12.jpg").unwrap();
        let resolved = imgur(&server, None).resolve(&url, &client()).await.unwrap();
        assert_eq!(resolved, "https://i.imgur.com/AbC12.jpg");
    }

    #[tokio::test]
    async fn test_animated_link_uses_video_probe() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/AbC12.mp4"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "video/mp4"))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse("https://i.imgur.com/AbC12.gifv").unwrap();
        let resolved = imgur(&server, None).resolve(&url, &client()).await.unwrap();
        assert_eq!(resolved, format!("{}/AbC12.mp4", server.uri()));
    }

    #[tokio::test]
    async fn test_failed_probe_falls_back_to_api() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/AbC12.mp4"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/3/image/AbC12"))
            .and(header("authorization", "Client-ID cid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "link": "https://i.imgur.com/AbC12.gif" }
            })))
            .mount(&server)
            .await;

        let url = Url::parse("https://i.imgur.com/AbC12.gif").unwrap();
        let resolved = imgur(&server, Some("cid")).resolve(&url, &client()).await.unwrap();
        assert_eq!(resolved, "https://i.imgur.com/AbC12.gif");
    }

    #[tokio::test]
    async fn test_page_prefers_mp4_from_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/image/Page1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "link": "https://i.imgur.com/Page1.gif",
                    "mp4": "https://i.imgur.com/Page1.mp4"
                }
            })))
            .mount(&server)
            .await;

        let url = Url::parse("https://imgur.com/Page1").unwrap();
        let resolved = imgur(&server, Some("cid")).resolve(&url, &client()).await.unwrap();
        assert_eq!(resolved, "https://i.imgur.com/Page1.mp4");
    }

    #[tokio::test]
    async fn test_album_uses_first_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/album/Alb"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": { "images": [
                    { "link": "https://i.imgur.com/first.png" },
                    { "link": "https://i.imgur.com/second.png" }
                ]}
            })))
            .mount(&server)
            .await;

        let url = Url::parse("https://imgur.com/a/Alb").unwrap();
        let resolved = imgur(&server, Some("cid")).resolve(&url, &client()).await.unwrap();
        assert_eq!(resolved, "https://i.imgur.com/first.png");
    }

    #[tokio::test]
    async fn test_api_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/image/Fail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": false, "data": { "error": "Unauthorized" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/3/image/Html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<!DOCTYPE html><p>login</p>"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/3/image/Junk"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let resolver = imgur(&server, Some("cid"));
        for id in ["Fail", "Html", "Junk", "Missing"] {
            let url = Url::parse(&format!("https://imgur.com/{}", id)).unwrap();
            let err = resolver.resolve(&url, &client()).await.unwrap_err();
            assert!(matches!(err, Error::Resolution(_)), "{id}: {err}");
        }
    }

    #[tokio::test]
    async fn test_api_path_disabled_without_client_id() {
        let server = MockServer::start().await;
        let url = Url::parse("https://imgur.com/Page1").unwrap();
        let err = imgur(&server, None).resolve(&url, &client()).await.unwrap_err();
        assert!(err.to_string().contains("client id"));
    }
}
