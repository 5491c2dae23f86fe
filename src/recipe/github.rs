// src/recipe/github.rs

//! Importing recipes from public GitHub repositories
//!
//! The manifest is read from the raw-content host and the branch tarball from
//! the archive host. Both bases are configurable so a mirror (or a test
//! server) can stand in for GitHub.

use crate::error::{Error, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

static REPO_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://github\.com/(\w+)/([^/]+)/?$").expect("repository link pattern")
});

/// Where to fetch manifests and tarballs from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// Raw file host, e.g. `https://raw.githubusercontent.com`
    pub raw_base: String,
    /// Archive host, e.g. `https://github.com`
    pub archive_base: String,
    /// Default branch to import
    pub branch: String,
    /// Manifest path inside the repository
    pub manifest: String,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            raw_base: "https://raw.githubusercontent.com".to_string(),
            archive_base: "https://github.com".to_string(),
            branch: "master".to_string(),
            manifest: "package.json".to_string(),
        }
    }
}

/// `owner/repo` extracted from a repository link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl RepoRef {
    /// Parse `https://github.com/<owner>/<repo>[/]`; anything else is `None`
    pub fn parse(link: &str) -> Option<Self> {
        let caps = REPO_LINK.captures(link)?;
        let owner = caps.get(1)?.as_str();
        let repo = caps.get(2)?.as_str();
        let repo = repo.strip_suffix(".git").unwrap_or(repo);
        if repo.is_empty() || repo == "." || repo == ".." {
            return None;
        }
        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// The subset of `package.json` an import needs
///
/// Fields stay loosely typed: `author` is commonly either a string or an
/// object with a `name`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub version: Option<Value>,
}

impl PackageManifest {
    pub fn name(&self) -> Option<String> {
        self.name.as_ref().and_then(scalar_text)
    }

    pub fn id(&self) -> Option<String> {
        self.id.as_ref().and_then(scalar_text)
    }

    pub fn version(&self) -> Option<String> {
        self.version.as_ref().and_then(scalar_text)
    }

    pub fn author(&self) -> Option<String> {
        match self.author.as_ref()? {
            Value::Object(map) => map.get("name").and_then(scalar_text),
            other => scalar_text(other),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// HTTP side of an import
#[derive(Debug, Clone)]
pub struct Importer {
    client: reqwest::Client,
    config: ImportConfig,
}

impl Importer {
    pub fn new(client: reqwest::Client, config: ImportConfig) -> Self {
        Self { client, config }
    }

    pub fn manifest_url(&self, repo: &RepoRef) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.raw_base.trim_end_matches('/'),
            repo.slug(),
            self.config.branch,
            self.config.manifest
        )
    }

    pub fn tarball_url(&self, repo: &RepoRef) -> String {
        format!(
            "{}/{}/archive/{}.tar.gz",
            self.config.archive_base.trim_end_matches('/'),
            repo.slug(),
            self.config.branch
        )
    }

    /// Fetch and parse the manifest; `None` if missing or not a JSON object
    pub async fn fetch_manifest(&self, repo: &RepoRef) -> Result<Option<PackageManifest>> {
        let url = self.manifest_url(repo);
        debug!("Fetching manifest {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            debug!("Manifest fetch for {} returned {}", repo.slug(), response.status());
            return Ok(None);
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice::<PackageManifest>(&body).ok())
    }

    /// Stream the branch tarball to `dest`; returns bytes written
    pub async fn download_tarball(&self, repo: &RepoRef, dest: &Path) -> Result<u64> {
        let url = self.tarball_url(repo);
        info!("Downloading {} to {}", url, dest.display());

        let mut response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Tarball download from {} failed with status {}",
                url,
                response.status()
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;

        Ok(written)
    }
}
