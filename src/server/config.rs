// src/server/config.rs
//! Configuration file parsing for the Larder server
//!
//! Supports TOML configuration files with the following sections:
//! - [server] - Bind address, upload limit
//! - [storage] - Root directory for the database and archives
//! - [upstream] - Upstream recipe service
//! - [import] - GitHub import endpoints
//! - [search] - Search behaviour
//! - [security] - Registration key, login lockout

use crate::recipe::ImportConfig;
use crate::recipe::search::DEFAULT_SENTINEL;
use crate::server::ServerConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `security.registration_key`
pub const REGISTRATION_KEY_ENV: &str = "LARDER_REGISTRATION_KEY";

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize)]
pub struct LarderConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub upstream: UpstreamSection,

    #[serde(default)]
    pub import: ImportSection,

    #[serde(default)]
    pub search: SearchSection,

    #[serde(default)]
    pub security: SecuritySection,
}

/// Server configuration section
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Public API bind address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Largest accepted multipart upload (e.g., "50MB")
    #[serde(default = "default_max_upload")]
    pub max_upload: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload: default_max_upload(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3333".to_string()
}

fn default_max_upload() -> String {
    "50MB".to_string()
}

/// Storage configuration section
#[derive(Debug, Deserialize)]
pub struct StorageSection {
    /// Holds `larder.db` and `recipes/`
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("/var/lib/larder")
}

/// Upstream recipe service
#[derive(Debug, Deserialize)]
pub struct UpstreamSection {
    #[serde(default = "default_upstream_url")]
    pub url: String,

    /// Request timeout (e.g., "30s")
    #[serde(default = "default_upstream_timeout")]
    pub timeout: String,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout: default_upstream_timeout(),
        }
    }
}

fn default_upstream_url() -> String {
    "https://api.franzinfra.com".to_string()
}

fn default_upstream_timeout() -> String {
    "30s".to_string()
}

/// GitHub import endpoints
#[derive(Debug, Deserialize)]
pub struct ImportSection {
    #[serde(default = "default_raw_base")]
    pub raw_base: String,

    #[serde(default = "default_archive_base")]
    pub archive_base: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_manifest")]
    pub manifest: String,
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            raw_base: default_raw_base(),
            archive_base: default_archive_base(),
            branch: default_branch(),
            manifest: default_manifest(),
        }
    }
}

fn default_raw_base() -> String {
    ImportConfig::default().raw_base
}

fn default_archive_base() -> String {
    ImportConfig::default().archive_base
}

fn default_branch() -> String {
    ImportConfig::default().branch
}

fn default_manifest() -> String {
    ImportConfig::default().manifest
}

/// Search settings
#[derive(Debug, Deserialize)]
pub struct SearchSection {
    /// Needle that lists every published local recipe
    #[serde(default = "default_sentinel")]
    pub sentinel: String,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            sentinel: default_sentinel(),
        }
    }
}

fn default_sentinel() -> String {
    DEFAULT_SENTINEL.to_string()
}

/// Security configuration
#[derive(Debug, Deserialize)]
pub struct SecuritySection {
    /// Shared key required to register an admin (empty = registration closed)
    #[serde(default)]
    pub registration_key: String,

    /// Failed logins before an identifier is locked
    #[serde(default = "default_login_failure_threshold")]
    pub login_failure_threshold: u32,

    /// Lockout duration (e.g., "5m", "1h")
    #[serde(default = "default_login_lockout")]
    pub login_lockout: String,
}

impl Default for SecuritySection {
    fn default() -> Self {
        Self {
            registration_key: String::new(),
            login_failure_threshold: default_login_failure_threshold(),
            login_lockout: default_login_lockout(),
        }
    }
}

fn default_login_failure_threshold() -> u32 {
    5
}

fn default_login_lockout() -> String {
    "5m".to_string()
}

impl LarderConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: LarderConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise, then apply environment overrides
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Ok(key) = std::env::var(REGISTRATION_KEY_ENV) {
            config.security.registration_key = key;
        }
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid server.bind address: {}", self.server.bind))?;

        parse_size(&self.server.max_upload)
            .with_context(|| format!("Invalid server.max_upload: {}", self.server.max_upload))?;

        let upstream = url::Url::parse(&self.upstream.url)
            .with_context(|| format!("Invalid upstream.url: {}", self.upstream.url))?;
        if !matches!(upstream.scheme(), "http" | "https") {
            anyhow::bail!("upstream.url must be http or https, got '{}'", self.upstream.url);
        }

        parse_duration(&self.upstream.timeout)
            .with_context(|| format!("Invalid upstream.timeout: {}", self.upstream.timeout))?;

        parse_duration(&self.security.login_lockout).with_context(|| {
            format!("Invalid security.login_lockout: {}", self.security.login_lockout)
        })?;

        if self.security.login_failure_threshold == 0 {
            anyhow::bail!("security.login_failure_threshold must be at least 1");
        }

        if self.search.sentinel.is_empty() {
            anyhow::bail!("search.sentinel must not be empty");
        }

        Ok(())
    }

    /// Convert to the internal ServerConfig structure
    pub fn to_server_config(&self) -> Result<ServerConfig> {
        Ok(ServerConfig {
            bind_addr: self.server.bind.parse()?,
            db_path: self.db_path(),
            recipe_dir: self.recipe_dir(),
            max_upload_bytes: usize::try_from(parse_size(&self.server.max_upload)?)
                .context("server.max_upload does not fit in memory")?,
            upstream_url: self.upstream.url.clone(),
            upstream_timeout: parse_duration(&self.upstream.timeout)?,
            import: ImportConfig {
                raw_base: self.import.raw_base.clone(),
                archive_base: self.import.archive_base.clone(),
                branch: self.import.branch.clone(),
                manifest: self.import.manifest.clone(),
            },
            sentinel: self.search.sentinel.clone(),
            registration_key: Some(self.security.registration_key.clone())
                .filter(|k| !k.is_empty()),
            login_failure_threshold: self.security.login_failure_threshold,
            login_lockout: parse_duration(&self.security.login_lockout)?,
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage.root.join("larder.db")
    }

    pub fn recipe_dir(&self) -> PathBuf {
        self.storage.root.join("recipes")
    }
}

/// Parse a human-readable size string (e.g., "50MB", "1GB", "512KB")
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("GB") {
        (n, 1024u64 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024u64 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024u64)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1u64)
    } else {
        // Assume bytes
        (s.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid size number: {}", num_str))?;
    if num < 0.0 {
        anyhow::bail!("Size must not be negative: {}", s);
    }

    Ok((num * multiplier as f64) as u64)
}

/// Parse a human-readable duration string (e.g., "15m", "1h", "30s")
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('d') {
        (n, 24 * 60 * 60)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 60 * 60)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1)
    } else {
        // Assume seconds
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid duration number: {}", num_str))?;

    Ok(Duration::from_secs(num * multiplier))
}
