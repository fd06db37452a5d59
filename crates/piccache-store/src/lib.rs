//! Sharded on-disk media store for piccache.
//!
//! Maps a URL to `<cache-dir>/<domain>/<h0>/<h1>/.../<hash>-<basename>.<ext>`
//! and answers "is it cached?" with a glob on `<hash>*`, because the final
//! extension is only known after classification.

pub mod keys;
pub mod locator;
pub mod types;

pub use keys::{domain_folder, sanitize_component, shard_segments, store_basename, url_hash};
pub use locator::FilesystemStore;
pub use types::{Location, StoredObject};
