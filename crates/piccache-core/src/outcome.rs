//! Results of cache operations.

use crate::http::ResponseHeaders;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Comment attached to each fetch outcome.
pub mod comment {
    pub const ALREADY_EXISTS: &str = "already exists";
    pub const RESOLUTION_FAILED: &str = "resolution failed";
    pub const GOT_404: &str = "got 404";
    pub const FETCH_FAILED: &str = "fetch failed";
    pub const RESPONSE_WAS_HTML: &str = "response was HTML";
    pub const ADDED_TO_CACHE: &str = "added to cache";
}

/// Result of one ensure-cached attempt.
///
/// `cached` means a usable answer exists now, including a confirmed 404;
/// `fetched` means network bytes were received during this call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOutcome {
    pub cached: bool,
    pub fetched: bool,
    pub filename: Option<PathBuf>,
    #[serde(default)]
    pub response_headers: ResponseHeaders,
    pub comment: String,
}

impl FetchOutcome {
    fn new(cached: bool, fetched: bool, comment: &str) -> Self {
        Self {
            cached,
            fetched,
            filename: None,
            response_headers: ResponseHeaders::default(),
            comment: comment.to_string(),
        }
    }

    pub fn already_exists(filename: PathBuf) -> Self {
        Self {
            filename: Some(filename),
            ..Self::new(true, false, comment::ALREADY_EXISTS)
        }
    }

    pub fn resolution_failed() -> Self {
        Self::new(false, false, comment::RESOLUTION_FAILED)
    }

    /// Confirmed missing upstream. Reported as cached so callers stop
    /// retrying, but nothing is written to disk.
    pub fn not_found(headers: ResponseHeaders) -> Self {
        Self {
            response_headers: headers,
            ..Self::new(true, false, comment::GOT_404)
        }
    }

    pub fn fetch_failed(headers: ResponseHeaders) -> Self {
        Self {
            response_headers: headers,
            ..Self::new(false, false, comment::FETCH_FAILED)
        }
    }

    pub fn rejected_html(headers: ResponseHeaders) -> Self {
        Self {
            response_headers: headers,
            ..Self::new(false, true, comment::RESPONSE_WAS_HTML)
        }
    }

    pub fn added(filename: PathBuf, headers: ResponseHeaders) -> Self {
        Self {
            filename: Some(filename),
            response_headers: headers,
            ..Self::new(true, true, comment::ADDED_TO_CACHE)
        }
    }
}

/// What the HTTP layer needs to answer a GET or HEAD.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeOutcome {
    pub hit: bool,
    pub filename: Option<PathBuf>,
    pub length: u64,
    pub content_type: Option<String>,
}

impl ServeOutcome {
    pub fn miss() -> Self {
        Self::default()
    }

    pub fn hit(filename: PathBuf, length: u64, content_type: impl Into<String>) -> Self {
        Self {
            hit: true,
            filename: Some(filename),
            length,
            content_type: Some(content_type.into()),
        }
    }
}
