//! Captured outbound responses.
//!
//! A network call returns status, headers and body as plain data; content
//! type and status checks are pure functions over that data.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Response headers keyed by lowercase name.
///
/// Repeated headers keep the last value seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseHeaders(BTreeMap<String, String>);

impl ResponseHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a header. Names are case-insensitive; values are trimmed.
    pub fn insert(&mut self, name: &str, value: &str) {
        self.0
            .insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
    }

    /// Parse one raw `Name: value` header line. Lines without a colon or
    /// with an empty name are ignored.
    pub fn insert_line(&mut self, line: &str) {
        if let Some((name, value)) = line.split_once(':') {
            if !name.trim().is_empty() {
                self.insert(name, value);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Raw `Content-Type` value, if present and non-empty.
    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type").filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for ResponseHeaders {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// A completed outbound request.
#[derive(Debug, Clone, Default)]
pub struct FetchedResponse {
    /// Status code, when a status line was received.
    pub status: Option<u16>,
    pub headers: ResponseHeaders,
    pub body: Bytes,
}

impl FetchedResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(code) if (200..300).contains(&code))
    }

    /// True when there was no status line or the origin answered 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self.status, None | Some(404))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.content_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_are_case_insensitive() {
        let mut headers = ResponseHeaders::new();
        headers.insert("Content-Type", " image/png ");
        assert_eq!(headers.get("content-type"), Some("image/png"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("image/png"));
        assert_eq!(headers.content_type(), Some("image/png"));
    }

    #[test]
    fn test_insert_line_ignores_invalid_lines() {
        let mut headers = ResponseHeaders::new();
        headers.insert_line("HTTP/1.1 200 OK");
        headers.insert_line(": orphan");
        headers.insert_line("X-Empty:");
        headers.insert_line("content-type: video/mp4; charset=binary");
        assert_eq!(headers.get("x-empty"), Some(""));
        assert_eq!(headers.content_type(), Some("video/mp4; charset=binary"));
        assert_eq!(headers.iter().count(), 2);
    }

    #[test]
    fn test_empty_content_type_is_absent() {
        let headers: ResponseHeaders = [("Content-Type", "")].into_iter().collect();
        assert!(headers.content_type().is_none());
    }

    #[test]
    fn test_status_predicates() {
        let ok = FetchedResponse {
            status: Some(204),
            ..Default::default()
        };
        assert!(ok.is_success());
        assert!(!ok.is_not_found());

        let missing = FetchedResponse {
            status: Some(404),
            ..Default::default()
        };
        assert!(missing.is_not_found());

        let no_status = FetchedResponse::default();
        assert!(no_status.is_not_found());
        assert!(!no_status.is_success());
    }
}
