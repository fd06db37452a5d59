//! Media-type tables and Content-Type parsing.
//!
//! These are the pure halves of classification: no network access happens
//! here. The network-aware classifier in `piccache-fetch` builds on them.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Recognized media extensions and the storage extension each maps to.
const EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "jpg"),
    ("jpeg", "jpg"),
    ("png", "png"),
    ("gif", "gif"),
    ("svg", "svg"),
    ("svg+xml", "svg"),
    ("webp", "webp"),
    ("avif", "avif"),
    ("tiff", "tiff"),
    ("mp4", "mp4"),
    ("webm", "webm"),
    ("aac", "aac"),
    ("mp3", "mp3"),
    ("mpeg", "mp3"),
];

/// Storage extension for a known media extension or MIME subtype.
pub fn known_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_ascii_lowercase();
    EXTENSIONS
        .iter()
        .find(|(from, _)| *from == ext)
        .map(|(_, to)| *to)
}

/// Normalize an extension: known ones are mapped, others pass through as-is.
pub fn map_extension(ext: &str) -> String {
    known_extension(ext)
        .map(str::to_string)
        .unwrap_or_else(|| ext.to_string())
}

/// Extension of a file name, without the dot. Empty when there is none.
pub fn extension_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}

/// A parsed header value such as `video/mp4; charset=binary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHeaderValue {
    /// Primary value, lowercased.
    pub value: String,
    /// Parameters keyed by lowercase name, quotes and escapes removed.
    pub params: BTreeMap<String, String>,
}

/// Primary value, then everything after the first `;`.
static VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^;\s][^;]*?)\s*(?:;(.*))?$").expect("invalid header value regex")
});

/// One `name=value` parameter; the value is quoted (with backslash escapes)
/// or runs to the next `;`.
static PARAM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|;)\s*([^=;\s]+)\s*=\s*(?:"((?:\\.|[^"\\])*)"[^;]*|([^;]*))"#)
        .expect("invalid header parameter regex")
});

static ESCAPE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\(.)").expect("invalid escape regex"));

/// Parse a `Content-Type`-style header value.
///
/// Returns `None` for an empty value. Parameters without `=` are skipped;
/// quoted parameter values may contain `;` and backslash-escaped quotes.
pub fn parse_content_header_value(raw: &str) -> Option<ContentHeaderValue> {
    let caps = VALUE_PATTERN.captures(raw)?;
    let value = caps.get(1)?.as_str().to_ascii_lowercase();
    let rest = caps.get(2).map_or("", |m| m.as_str());

    let params = PARAM_PATTERN
        .captures_iter(rest)
        .filter_map(|param| {
            let name = param.get(1)?.as_str().to_ascii_lowercase();
            let value = match (param.get(2), param.get(3)) {
                (Some(quoted), _) => ESCAPE_PATTERN.replace_all(quoted.as_str(), "$1").into_owned(),
                (None, Some(bare)) => bare.as_str().trim().to_string(),
                (None, None) => String::new(),
            };
            Some((name, value))
        })
        .collect();

    Some(ContentHeaderValue { value, params })
}

/// Storage extension for an image, video or audio `Content-Type`.
pub fn extension_from_content_type(content_type: &str) -> Option<String> {
    let parsed = parse_content_header_value(content_type)?;
    let (kind, subtype) = parsed.value.split_once('/')?;
    match kind {
        "image" | "video" | "audio" if !subtype.is_empty() => Some(map_extension(subtype)),
        _ => None,
    }
}

/// `Content-Type` to serve for a stored extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "ico" => "image/x-icon",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "ogv" => "video/ogg",
        "aac" => "audio/aac",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

pub fn is_video(content_type: &str) -> bool {
    parse_content_header_value(content_type).is_some_and(|ct| ct.value.starts_with("video/"))
}

/// True when a response is an HTML document rather than media: either the
/// declared type says so, or the body opens with an HTML doctype.
pub fn looks_like_html(content_type: Option<&str>, body: &[u8]) -> bool {
    if content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html")) {
        return true;
    }
    let body = body.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(body);
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    let head = &body[start..];
    const DOCTYPE: &[u8] = b"<!doctype html";
    head.len() >= DOCTYPE.len() && head[..DOCTYPE.len()].eq_ignore_ascii_case(DOCTYPE)
}
