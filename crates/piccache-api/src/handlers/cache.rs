//! The cache endpoint: POST warms, GET serves or redirects, HEAD probes.

use axum::{
    Json,
    body::{Body, Bytes},
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use piccache_core::{Error, media};
use piccache_store::StoredObject;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::error::ApiError;
use crate::range::{self, ByteRange};
use crate::state::AppState;
use crate::{FILE_HEADER, STATUS_HEADER};

const HIT: &str = "HIT";
const MISS: &str = "MISS";

#[derive(Debug, Deserialize)]
pub struct CacheQuery {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WarmRequest {
    pub url: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

/// A cache hit ready to be answered.
struct Hit {
    object: StoredObject,
    content_type: String,
    file_header: Option<HeaderValue>,
}

pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    match method {
        Method::POST => warm(&state, &body).await,
        Method::GET => serve(&state, &uri, &headers).await,
        Method::HEAD => probe(&state, &uri).await,
        _ => Ok((
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, "GET, HEAD, POST")],
        )
            .into_response()),
    }
}

async fn warm(state: &AppState, body: &[u8]) -> Result<Response, ApiError> {
    let request: WarmRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?;

    if let Some(expected) = state.config.access_token() {
        if request.access_token.as_deref() != Some(expected) {
            return Err(ApiError::Forbidden);
        }
    }

    let outcome = state.engine.ensure_cached(&request.url).await?;
    Ok(Json(outcome).into_response())
}

async fn serve(state: &AppState, uri: &Uri, headers: &HeaderMap) -> Result<Response, ApiError> {
    let url = requested_url(uri)?;
    let Some(hit) = lookup(state, &url).await? else {
        debug!(url = %url, "Miss, redirecting to origin");
        let mut response = StatusCode::FOUND.into_response();
        response
            .headers_mut()
            .insert(header::LOCATION, location_header(&url)?);
        response
            .headers_mut()
            .insert(STATUS_HEADER, HeaderValue::from_static(MISS));
        return Ok(response);
    };

    let is_video = media::is_video(&hit.content_type);
    let requested_range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .filter(|_| is_video)
        .and_then(|v| range::parse_range(v, hit.object.size));

    match requested_range {
        Some(span) => partial_response(&hit, span).await,
        None => full_response(&hit, is_video).await,
    }
}

async fn probe(state: &AppState, uri: &Uri) -> Result<Response, ApiError> {
    let url = requested_url(uri)?;
    let Some(hit) = lookup(state, &url).await? else {
        return Ok((StatusCode::NOT_FOUND, [(STATUS_HEADER, MISS)]).into_response());
    };

    // 200 with an empty body: hyper drops Content-Length from a 204.
    let mut response = StatusCode::OK.into_response();
    let headers = response.headers_mut();
    hit_headers(headers, &hit)?;
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(hit.object.size));
    if media::is_video(&hit.content_type) {
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    }
    Ok(response)
}

async fn lookup(state: &AppState, url: &str) -> Result<Option<Hit>, ApiError> {
    let served = state.engine.lookup(url).await?;
    let (true, Some(path)) = (served.hit, served.filename) else {
        return Ok(None);
    };

    let file_header = ascii_header(&relative_name(state, &path));
    Ok(Some(Hit {
        content_type: served
            .content_type
            .unwrap_or_else(|| media::content_type_for_extension("").to_string()),
        object: StoredObject {
            path,
            size: served.length,
        },
        file_header,
    }))
}

async fn full_response(hit: &Hit, is_video: bool) -> Result<Response, ApiError> {
    let body = range::whole_body(&hit.object.path)
        .await
        .map_err(Error::from)?;

    let mut response = Response::new(body);
    let headers = response.headers_mut();
    hit_headers(headers, hit)?;
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(hit.object.size));
    if is_video {
        headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    }
    Ok(response)
}

async fn partial_response(hit: &Hit, span: ByteRange) -> Result<Response, ApiError> {
    let body: Body = range::ranged_body(&hit.object.path, span)
        .await
        .map_err(Error::from)?;

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::PARTIAL_CONTENT;
    let headers = response.headers_mut();
    hit_headers(headers, hit)?;
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(span.length()));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(
        header::CONTENT_RANGE,
        header_value(&span.content_range(hit.object.size))?,
    );
    let disposition = format!("inline; filename=\"{}\"", hit.object.display_name());
    if let Some(value) = ascii_header(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    Ok(response)
}

fn hit_headers(headers: &mut HeaderMap, hit: &Hit) -> Result<(), ApiError> {
    headers.insert(STATUS_HEADER, HeaderValue::from_static(HIT));
    headers.insert(header::CONTENT_TYPE, header_value(&hit.content_type)?);
    if let Some(file) = &hit.file_header {
        headers.insert(FILE_HEADER, file.clone());
    }
    Ok(())
}

fn requested_url(uri: &Uri) -> Result<String, ApiError> {
    let Query(query) = Query::<CacheQuery>::try_from_uri(uri)
        .map_err(|e| ApiError::BadRequest(format!("Invalid query: {}", e)))?;
    query
        .url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing url parameter".to_string()))
}

/// Location for a miss: the URL as received when it is a valid header
/// value, its serialized form otherwise.
fn location_header(url: &str) -> Result<HeaderValue, ApiError> {
    if let Ok(value) = HeaderValue::from_str(url) {
        return Ok(value);
    }
    let parsed = Url::parse(url).map_err(Error::from)?;
    header_value(parsed.as_str())
}

/// Stored path relative to the cache directory.
fn relative_name(state: &AppState, path: &Path) -> String {
    let cache_dir = state.engine.store().cache_dir();
    path.strip_prefix(cache_dir)
        .map(PathBuf::from)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Header value with anything outside printable ASCII replaced.
fn ascii_header(value: &str) -> Option<HeaderValue> {
    let cleaned: String = value
        .chars()
        .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '_' })
        .collect();
    HeaderValue::from_str(&cleaned).ok()
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|e| ApiError::Internal(Error::Internal(format!("Invalid header value: {}", e))))
}
