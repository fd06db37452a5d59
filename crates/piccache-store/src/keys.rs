//! Store key derivation: URL hash, shard segments and file-name parts.

use piccache_core::{Error, Result};
use sha2::{Digest, Sha256};
use url::Url;

/// Placeholder used when a hash is shorter than the shard depth.
pub const SHARD_PLACEHOLDER: char = '_';

/// Basename used when the URL path has no last segment.
pub const DEFAULT_BASENAME: &str = "media";

/// Longest basename kept, in bytes. Leaves room for the hash and extension
/// under the usual 255-byte file name limit.
const MAX_BASENAME_BYTES: usize = 150;

/// SHA-256 hex digest of the URL exactly as received.
pub fn url_hash(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// First `depth` characters of the hash, one directory level each.
pub fn shard_segments(hash: &str, depth: usize) -> Vec<String> {
    let mut chars = hash.chars();
    (0..depth)
        .map(|_| chars.next().unwrap_or(SHARD_PLACEHOLDER).to_string())
        .collect()
}

/// Directory name for the URL's domain.
pub fn domain_folder(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| Error::InvalidUrl(format!("no host in {}", url)))?;
    Ok(sanitize_component(&host.to_ascii_lowercase()))
}

/// Last path segment of the URL, without the query string.
pub fn store_basename(url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    let sanitized = sanitize_component(last);
    if sanitized.is_empty() {
        return DEFAULT_BASENAME.to_string();
    }

    let mut end = sanitized.len().min(MAX_BASENAME_BYTES);
    while !sanitized.is_char_boundary(end) {
        end -= 1;
    }
    sanitized[..end].to_string()
}

/// Sanitize one path component for use in file names.
pub fn sanitize_component(component: &str) -> String {
    if component == "." || component == ".." {
        return "_".to_string();
    }
    component
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '[' | ']' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect()
}
