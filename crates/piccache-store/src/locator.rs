//! Filesystem store: locating, probing and writing cached objects.

use crate::keys::{domain_folder, shard_segments, store_basename, url_hash};
use crate::types::{Location, StoredObject};
use bytes::Bytes;
use piccache_core::config::StoreConfig;
use piccache_core::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Mode new directories are created with, before tightening.
#[cfg(unix)]
const DIR_CREATE_MODE: u32 = 0o777;

/// Mode directories and stored files are left with.
#[cfg(unix)]
const STORE_MODE: u32 = 0o775;

/// Sharded on-disk media store.
///
/// Concurrent writers for the same URL are not serialized: each writes a
/// private temporary file and renames it into place, so readers only ever
/// see complete files and the last writer wins.
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    cache_dir: PathBuf,
    shard_depth: usize,
}

impl FilesystemStore {
    pub fn new(cache_dir: PathBuf, shard_depth: usize) -> Self {
        Self {
            cache_dir,
            shard_depth,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.cache_dir(), config.shard_depth)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Compute where a URL is stored. Pure; touches nothing on disk.
    pub fn locate(&self, url: &str) -> Result<Location> {
        let parsed = Url::parse(url)?;
        let hash = url_hash(url);

        let mut shard_dir = self.cache_dir.join(domain_folder(&parsed)?);
        for segment in shard_segments(&hash, self.shard_depth) {
            shard_dir.push(segment);
        }

        Ok(Location {
            basename: store_basename(&parsed),
            url_hash: hash,
            shard_dir,
        })
    }

    /// Find any stored object for a location via its `<hash>*` glob.
    pub fn find(&self, location: &Location) -> Result<Option<StoredObject>> {
        let entries = glob::glob(&location.pattern())
            .map_err(|e| Error::Internal(format!("Invalid store pattern: {}", e)))?;

        for path in entries.flatten() {
            let metadata = match std::fs::metadata(&path) {
                Ok(metadata) if metadata.is_file() => metadata,
                _ => continue,
            };
            return Ok(Some(StoredObject {
                size: metadata.len(),
                path,
            }));
        }
        Ok(None)
    }

    /// Cached object for a URL, if any.
    pub async fn lookup(&self, url: &str) -> Result<Option<StoredObject>> {
        let location = self.locate(url)?;
        self.probe(&location).await
    }

    /// [`find`](Self::find) off the async runtime.
    pub async fn probe(&self, location: &Location) -> Result<Option<StoredObject>> {
        let store = self.clone();
        let location = location.clone();
        tokio::task::spawn_blocking(move || store.find(&location))
            .await
            .map_err(|e| Error::Internal(format!("Store lookup task failed: {}", e)))?
    }

    pub async fn is_cached(&self, url: &str) -> Result<bool> {
        Ok(self.lookup(url).await?.is_some())
    }

    /// Write an object and return it. The body goes to a hidden temporary
    /// file in the shard directory first and is renamed into place once
    /// complete, then given its final permissions.
    pub async fn write(&self, location: &Location, ext: &str, body: Bytes) -> Result<StoredObject> {
        let shard_dir = location.shard_dir.clone();
        let path = location.object_path(ext);
        let cache_dir = self.cache_dir.clone();

        tokio::task::spawn_blocking(move || -> Result<StoredObject> {
            create_dirs(&cache_dir, &shard_dir)?;
            write_atomic(&shard_dir, &path, &body)?;
            debug!(path = %path.display(), bytes = body.len(), "Stored object written");
            Ok(StoredObject {
                size: body.len() as u64,
                path,
            })
        })
        .await
        .map_err(|e| Error::Internal(format!("Store write task failed: {}", e)))?
    }
}

/// Create every missing directory from the cache dir down to `shard_dir`.
fn create_dirs(cache_dir: &Path, shard_dir: &Path) -> std::io::Result<()> {
    if !cache_dir.exists() {
        std::fs::create_dir_all(cache_dir)?;
    }

    let mut missing = Vec::new();
    let mut current = shard_dir;
    while !current.exists() {
        missing.push(current.to_path_buf());
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    for dir in missing.iter().rev() {
        match create_dir(dir) {
            Ok(()) => set_store_mode(dir)?,
            // Another request created it first.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn create_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new().mode(DIR_CREATE_MODE).create(dir)
}

#[cfg(not(unix))]
fn create_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir(dir)
}

#[cfg(unix)]
fn set_store_mode(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(STORE_MODE))
}

#[cfg(not(unix))]
fn set_store_mode(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

fn write_atomic(dir: &Path, path: &Path, body: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".piccache-")
        .suffix(".part")
        .tempfile_in(dir)?;
    tmp.write_all(body)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    set_store_mode(path)
}
