//! reqwest-backed outbound HTTP client.

use async_trait::async_trait;
use piccache_core::config::FetchConfig;
use piccache_core::{Error, FetchedResponse, MediaClient, ResponseHeaders, Result};
use std::time::Duration;
use tracing::debug;

/// Production [`MediaClient`].
///
/// Every request carries the configured User-Agent and is bounded by the
/// configured timeouts, so a slow origin only stalls the request that
/// depends on it.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new(config: &FetchConfig, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn capture(response: reqwest::Response, with_body: bool) -> Result<FetchedResponse> {
        let status = response.status().as_u16();
        let headers = capture_headers(response.headers());
        let body = if with_body {
            response.bytes().await.map_err(map_error)?
        } else {
            Default::default()
        };
        Ok(FetchedResponse {
            status: Some(status),
            headers,
            body,
        })
    }
}

#[async_trait]
impl MediaClient for ReqwestClient {
    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<FetchedResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request.send().await.map_err(map_error)?;
        debug!(url = %url, status = %response.status(), "GET completed");
        Self::capture(response, true).await
    }

    async fn head(&self, url: &str) -> Result<FetchedResponse> {
        let response = self.client.head(url).send().await.map_err(map_error)?;
        debug!(url = %url, status = %response.status(), "HEAD completed");
        Self::capture(response, false).await
    }
}

fn capture_headers(headers: &reqwest::header::HeaderMap) -> ResponseHeaders {
    let mut captured = ResponseHeaders::new();
    for (name, value) in headers {
        // Values that are not visible ASCII are dropped.
        if let Ok(value) = value.to_str() {
            captured.insert(name.as_str(), value);
        }
    }
    captured
}

fn map_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else {
        Error::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> ReqwestClient {
        ReqwestClient::new(&FetchConfig::default(), "piccache-test/1.0").unwrap()
    }

    #[tokio::test]
    async fn test_get_captures_status_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.png"))
            .and(header("user-agent", "piccache-test/1.0"))
            .and(header("x-extra", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/png")
                    .set_body_bytes(b"\x89PNG".to_vec()),
            )
            .mount(&server)
            .await;

        let response = client()
            .get(
                &format!("{}/a.png", server.uri()),
                &[("x-extra".to_string(), "1".to_string())],
            )
            .await
            .unwrap();

        assert_eq!(response.status, Some(200));
        assert_eq!(response.content_type(), Some("image/png"));
        assert_eq!(&response.body[..], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_non_success_status_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let response = client()
            .get(&format!("{}/missing.jpg", server.uri()), &[])
            .await
            .unwrap();
        assert_eq!(response.status, Some(404));
        assert!(response.is_not_found());
    }

    #[tokio::test]
    async fn test_head_has_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/v.mp4"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "video/mp4"))
            .mount(&server)
            .await;

        let response = client()
            .head(&format!("{}/v.mp4", server.uri()))
            .await
            .unwrap();
        assert_eq!(response.content_type(), Some("video/mp4"));
        assert!(response.body.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_origin_is_network_error() {
        let err = client()
            .get("http://127.0.0.1:1/nothing.jpg", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = FetchConfig {
            timeout_secs: 1,
            ..Default::default()
        };
        let client = ReqwestClient::new(&config, "piccache-test/1.0").unwrap();
        let err = client
            .get(&format!("{}/slow.jpg", server.uri()), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }
}
