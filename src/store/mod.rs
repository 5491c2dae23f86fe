// src/store/mod.rs

//! Two-tier recipe archive store
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<id>.tar.gz           published archives
//! <root>/private/<id>.tar.gz   archives awaiting review
//! ```
//!
//! An archive lives in exactly one tier; publishing renames it across.
//! Partially written archives carry a `.part` suffix and never match an id.

pub mod archive;

use crate::error::{Error, Result};
use crate::recipe::RecipeId;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const ARCHIVE_SUFFIX: &str = ".tar.gz";
const PARTIAL_SUFFIX: &str = ".part";

/// Which tier an archive was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Public,
    Private,
}

/// An archive opened for reading
#[derive(Debug)]
pub struct OpenArchive {
    pub file: tokio::fs::File,
    pub len: u64,
    pub tier: Tier,
    /// `<id>.tar.gz`, for Content-Disposition
    pub file_name: String,
}

/// Archive ids present in each tier
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreListing {
    pub public: Vec<String>,
    pub private: Vec<String>,
}

/// Filesystem archive store keyed by recipe id
#[derive(Debug, Clone)]
pub struct RecipeStore {
    root: PathBuf,
}

impl RecipeStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn private_dir(&self) -> PathBuf {
        self.root.join("private")
    }

    /// Create both tier directories
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.private_dir())?;
        Ok(())
    }

    pub fn public_path(&self, id: &RecipeId) -> PathBuf {
        self.root.join(id.archive_name())
    }

    pub fn private_path(&self, id: &RecipeId) -> PathBuf {
        self.private_dir().join(id.archive_name())
    }

    /// Scratch path a new private archive is written to before `commit_private`
    pub fn staging_path(&self, id: &RecipeId) -> PathBuf {
        self.private_dir()
            .join(format!("{}{}", id.archive_name(), PARTIAL_SUFFIX))
    }

    /// Published archive exists
    pub fn exists(&self, id: &RecipeId) -> bool {
        self.public_path(id).is_file()
    }

    /// Pending archive exists
    pub fn exists_private(&self, id: &RecipeId) -> bool {
        self.private_path(id).is_file()
    }

    /// Locate an archive, preferring the public tier
    ///
    /// The private tier is only consulted when `include_private` is set.
    pub fn resolve(&self, id: &RecipeId, include_private: bool) -> Option<(PathBuf, Tier)> {
        let public = self.public_path(id);
        if public.is_file() {
            debug!("Resolved {} to public archive {}", id, public.display());
            return Some((public, Tier::Public));
        }

        if include_private {
            let private = self.private_path(id);
            if private.is_file() {
                debug!("Resolved {} to private archive {}", id, private.display());
                return Some((private, Tier::Private));
            }
        }

        None
    }

    /// Open an archive for streaming; see [`RecipeStore::resolve`] for tier order
    pub async fn open(&self, id: &RecipeId, include_private: bool) -> Result<Option<OpenArchive>> {
        let Some((path, tier)) = self.resolve(id, include_private) else {
            return Ok(None);
        };

        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            // Moved or deleted between resolve and open
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata().await?.len();

        Ok(Some(OpenArchive {
            file,
            len,
            tier,
            file_name: id.archive_name(),
        }))
    }

    /// Move a pending archive into the public tier
    ///
    /// A private archive that is missing when the move happens, including one
    /// removed by a concurrent review, is `NotFound`.
    pub fn publish(&self, id: &RecipeId) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let moved = fs::rename(self.private_path(id), self.public_path(id));
        missing_as_not_found(moved, || format!("Private archive for '{id}'"))
    }

    /// Move a published archive back to the private tier
    pub(crate) fn unpublish(&self, id: &RecipeId) -> Result<()> {
        fs::create_dir_all(self.private_dir())?;
        let moved = fs::rename(self.public_path(id), self.private_path(id));
        missing_as_not_found(moved, || format!("Public archive for '{id}'"))
    }

    /// Delete a pending archive
    pub fn remove(&self, id: &RecipeId) -> Result<()> {
        let removed = fs::remove_file(self.private_path(id));
        missing_as_not_found(removed, || format!("Private archive for '{id}'"))
    }

    /// Build the private archive for `id` from the tree at `src_dir`
    pub fn compress_into_private(&self, id: &RecipeId, src_dir: &Path) -> Result<u64> {
        self.ensure_dirs()?;
        let staged = self.staging_path(id);
        let size = match archive::compress_dir(src_dir, &staged) {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&staged);
                return Err(e);
            }
        };
        self.commit_private(id, &staged)?;
        Ok(size)
    }

    /// Rename a fully written staging file into the private tier
    pub fn commit_private(&self, id: &RecipeId, staged: &Path) -> Result<()> {
        fs::rename(staged, self.private_path(id))?;
        Ok(())
    }

    /// Ids of every archive, per tier, sorted
    pub fn list(&self) -> Result<StoreListing> {
        Ok(StoreListing {
            public: archive_ids(&self.root)?,
            private: archive_ids(&self.private_dir())?,
        })
    }
}

fn archive_ids(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(stem) = name.strip_suffix(ARCHIVE_SUFFIX)
            && crate::recipe::is_valid_recipe_id(stem)
        {
            ids.push(stem.to_string());
        }
    }
    ids.sort();
    Ok(ids)
}

fn missing_as_not_found(result: io::Result<()>, what: impl FnOnce() -> String) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::NotFound(what())),
        Err(e) => Err(e.into()),
    }
}
