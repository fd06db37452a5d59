//! Byte-range support for video responses.
//!
//! Only single `bytes=` ranges are honored. Anything else (other units,
//! multiple ranges, unsatisfiable spans, garbage) is treated as if no
//! `Range` header had been sent, so the client gets the whole file.

use axum::body::Body;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// An inclusive byte span within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes in the span. Never zero.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a file of `total` bytes.
    pub fn content_range(&self, total: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total)
    }
}

/// Parse a `Range` header against a file of `total` bytes.
///
/// Accepts `bytes=S-E`, `bytes=S-` and the suffix form `bytes=-N`. An end
/// past the file is clamped to the last byte.
pub fn parse_range(header: &str, total: u64) -> Option<ByteRange> {
    if total == 0 {
        return None;
    }
    let last = total - 1;

    let header = header.trim();
    let (unit, bounds) = header.split_once('=')?;
    if !unit.trim().eq_ignore_ascii_case("bytes") || bounds.contains(',') {
        return None;
    }
    let (start, end) = bounds.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        let suffix: u64 = end.parse().ok()?;
        if suffix == 0 {
            return None;
        }
        return Some(ByteRange {
            start: total.saturating_sub(suffix),
            end: last,
        });
    }

    let start: u64 = start.parse().ok()?;
    if start > last {
        return None;
    }
    let end = if end.is_empty() {
        last
    } else {
        let end: u64 = end.parse().ok()?;
        if end < start {
            return None;
        }
        end.min(last)
    };
    Some(ByteRange { start, end })
}

/// Stream a whole file.
pub async fn whole_body(path: &Path) -> std::io::Result<Body> {
    let file = File::open(path).await?;
    Ok(Body::from_stream(ReaderStream::new(file)))
}

/// Stream exactly the bytes of `range`.
pub async fn ranged_body(path: &Path, range: ByteRange) -> std::io::Result<Body> {
    let mut file = File::open(path).await?;
    file.seek(SeekFrom::Start(range.start)).await?;
    Ok(Body::from_stream(ReaderStream::new(file.take(range.length()))))
}
