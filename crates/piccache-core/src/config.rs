//! Configuration document.
//!
//! Loaded once at process start from a JSON file and then shared read-only
//! (`Arc<Config>`) with every component that needs it. All keys are
//! optional; an unset credential disables the platform path that needs it.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Default location of the configuration document.
pub const DEFAULT_CONFIG_PATH: &str = "/cache/config.json";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Bearer token for the redgifs manifest endpoint.
    #[serde(default)]
    pub redgifs_bearer: Option<String>,
    /// User-Agent sent with every outbound request.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Client ID for the imgur metadata API.
    #[serde(default)]
    pub imgur_client_id: Option<String>,
    /// Token POST callers must present, if set.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// On-disk store layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Cache root directory.
    #[serde(default = "default_store_root")]
    pub root: PathBuf,
    /// Folder under the root that holds the domain directories.
    #[serde(default = "default_store_folder")]
    pub folder: String,
    /// Number of single-hex-character directory levels under each domain.
    #[serde(default = "default_shard_depth")]
    pub shard_depth: usize,
}

fn default_store_root() -> PathBuf {
    PathBuf::from("/cache")
}

fn default_store_folder() -> String {
    "piccache".to_string()
}

fn default_shard_depth() -> usize {
    3
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
            folder: default_store_folder(),
            shard_depth: default_shard_depth(),
        }
    }
}

impl StoreConfig {
    /// Directory that contains the per-domain folders.
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.folder)
    }
}

/// Outbound request settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Whole-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Maximum redirects followed per request.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    5
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_redirects: default_max_redirects(),
        }
    }
}

/// Base URLs of the platforms the resolvers talk to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "default_redgifs_api")]
    pub redgifs_api: String,
    #[serde(default = "default_imgur_api")]
    pub imgur_api: String,
    #[serde(default = "default_imgur_media")]
    pub imgur_media: String,
    #[serde(default = "default_vidble_media")]
    pub vidble_media: String,
}

fn default_redgifs_api() -> String {
    "https://api.redgifs.com".to_string()
}

fn default_imgur_api() -> String {
    "https://api.imgur.com".to_string()
}

fn default_imgur_media() -> String {
    "https://i.imgur.com".to_string()
}

fn default_vidble_media() -> String {
    "https://vidble.com".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            redgifs_api: default_redgifs_api(),
            imgur_api: default_imgur_api(),
            imgur_media: default_imgur_media(),
            vidble_media: default_vidble_media(),
        }
    }
}

impl Config {
    /// Load the configuration document. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse a configuration document.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        if config.store.folder.is_empty() {
            return Err(Error::Config("store.folder must not be empty".into()));
        }
        Ok(config)
    }

    pub fn redgifs_bearer(&self) -> Option<&str> {
        non_empty(&self.redgifs_bearer)
    }

    pub fn imgur_client_id(&self) -> Option<&str> {
        non_empty(&self.imgur_client_id)
    }

    pub fn access_token(&self) -> Option<&str> {
        non_empty(&self.access_token)
    }

    /// Configured User-Agent, or `piccache/<version>`.
    pub fn user_agent(&self) -> String {
        non_empty(&self.user_agent)
            .map(str::to_string)
            .unwrap_or_else(|| format!("piccache/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Copy with every credential replaced by a marker, for display.
    pub fn redacted(&self) -> Self {
        let mask = |value: &Option<String>| value.as_ref().map(|_| "<redacted>".to_string());
        Self {
            redgifs_bearer: mask(&self.redgifs_bearer),
            imgur_client_id: mask(&self.imgur_client_id),
            access_token: mask(&self.access_token),
            ..self.clone()
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
