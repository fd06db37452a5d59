//! Store types.

use piccache_core::media;
use std::path::{Path, PathBuf};

/// Where a URL lives in the store. Pure data; nothing on disk is implied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// SHA-256 hex digest of the URL.
    pub url_hash: String,
    /// Shard directory: `<cache-dir>/<domain>/<h0>/<h1>/...`.
    pub shard_dir: PathBuf,
    /// Sanitized last path segment of the URL.
    pub basename: String,
}

impl Location {
    /// Glob pattern matching any stored object for this URL.
    pub fn pattern(&self) -> String {
        let dir = glob::Pattern::escape(&self.shard_dir.to_string_lossy());
        format!("{}/{}*", dir, self.url_hash)
    }

    /// File name for the object once its extension is known.
    pub fn object_name(&self, ext: &str) -> String {
        let base = format!("{}-{}", self.url_hash, self.basename);
        let suffix = format!(".{}", ext.to_ascii_lowercase());
        if ext.is_empty() || self.basename.to_ascii_lowercase().ends_with(&suffix) {
            base
        } else {
            format!("{}.{}", base, ext)
        }
    }

    pub fn object_path(&self, ext: &str) -> PathBuf {
        self.shard_dir.join(self.object_name(ext))
    }
}

/// A file present in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: PathBuf,
    pub size: u64,
}

impl StoredObject {
    pub fn extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
    }

    /// Content type to serve, derived from the stored extension.
    pub fn content_type(&self) -> &'static str {
        media::content_type_for_extension(self.extension())
    }

    /// File name without the leading `<hash>-`.
    pub fn display_name(&self) -> &str {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("");
        name.split_once('-').map(|(_, rest)| rest).unwrap_or(name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
