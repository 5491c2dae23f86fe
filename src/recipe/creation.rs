// src/recipe/creation.rs

//! Turning uploads and repository links into pending recipes
//!
//! Both paths end the same way: a registry record with `is_public = false`
//! and an archive in the private tier. The record goes in first so the
//! `UNIQUE` constraint settles concurrent submissions of one id; if the
//! archive cannot be written the record is removed again.

use crate::db::Registry;
use crate::db::models::Recipe;
use crate::error::{Error, Result};
use crate::recipe::data::{Icons, RecipeData, UPLOAD_VERSION};
use crate::recipe::github::{Importer, PackageManifest, RepoRef};
use crate::recipe::{RecipeId, is_valid_recipe_id};
use crate::runtime;
use crate::store::RecipeStore;
use crate::validation::{Rule, ValidationErrors, Validator};
use rusqlite::Connection;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

const INVALID_LINK: &str =
    "Invalid GitHub link. Must be in the format \"https://github.com/user/repo\"";
const MISSING_MANIFEST: &str =
    "Invalid GitHub link. Your repository must contain a valid package.json file";

/// One file from a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied name; only its final component is used
    pub file_name: String,
    pub contents: Vec<u8>,
}

/// Direct upload form
#[derive(Debug, Clone, Default)]
pub struct NewRecipeForm {
    pub id: Option<String>,
    pub name: Option<String>,
    pub author: Option<String>,
    pub png: Option<String>,
    pub svg: Option<String>,
    pub files: Vec<UploadedFile>,
}

/// Repository import form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubForm {
    pub link: Option<String>,
    pub png: Option<String>,
    pub svg: Option<String>,
}

/// A submission that passed validation
#[derive(Debug)]
struct Submission {
    id: RecipeId,
    name: String,
    data: RecipeData,
}

/// Submission pipeline over the registry and the archive store
#[derive(Debug, Clone)]
pub struct Creation {
    registry: Registry,
    store: RecipeStore,
}

impl Creation {
    pub fn new(registry: Registry, store: RecipeStore) -> Self {
        Self { registry, store }
    }

    /// Store an uploaded file set as a pending recipe
    ///
    /// Blocking; call from [`runtime::blocking`] in async code.
    pub fn create(&self, form: &NewRecipeForm) -> Result<RecipeId> {
        let conn = self.registry.connect()?;
        let submission = validate_upload(&conn, form)?;

        let staging = tempfile::Builder::new()
            .prefix("larder-upload-")
            .tempdir()?;
        for file in &form.files {
            if let Some(name) = staged_name(&file.file_name) {
                fs::write(staging.path().join(name), &file.contents)?;
            }
        }

        insert_pending(&conn, &submission)?;
        let id = submission.id;

        match self.store.compress_into_private(&id, staging.path()) {
            Ok(size) => {
                info!("Recipe {} submitted ({} bytes, {} files)", id, size, form.files.len());
                Ok(id)
            }
            Err(e) => {
                forget(&conn, &id);
                Err(e)
            }
        }
    }

    /// Import a recipe from a GitHub repository as a pending recipe
    pub async fn import(&self, importer: &Importer, form: &GithubForm) -> Result<RecipeId> {
        let mut v = Validator::new();
        let link = v.url("link", form.link.as_deref()).and(form.link.as_deref());
        let png = v.url("png", form.png.as_deref()).and(form.png.as_deref());
        let svg = v.url("svg", form.svg.as_deref()).and(form.svg.as_deref());
        let (Some(link), Some(png), Some(svg)) = (link, png, svg) else {
            return Err(v.finish().err().unwrap_or_default().into());
        };

        let repo = RepoRef::parse(link)
            .ok_or_else(|| ValidationErrors::single("link", Rule::Format, INVALID_LINK))?;

        let manifest = importer
            .fetch_manifest(&repo)
            .await?
            .filter(|m| m.id().is_some())
            .ok_or_else(|| ValidationErrors::single("link", Rule::Format, MISSING_MANIFEST))?;

        let icons = Icons {
            png: png.to_string(),
            svg: svg.to_string(),
        };

        let this = self.clone();
        let id = runtime::blocking(move || {
            let conn = this.registry.connect()?;
            let submission = validate_manifest(&conn, &manifest, icons)?;
            this.store.ensure_dirs()?;
            insert_pending(&conn, &submission)?;
            Ok(submission.id)
        })
        .await?;

        if let Err(e) = self.fetch_archive(importer, &repo, &id).await {
            let registry = self.registry.clone();
            let undo_id = id.clone();
            let undo = runtime::blocking(move || {
                forget(&registry.connect()?, &undo_id);
                Ok(())
            })
            .await;
            if let Err(undo) = undo {
                error!("Failed to remove registry record for {}: {}", id, undo);
            }
            return Err(e);
        }

        info!("Recipe {} imported from {}", id, repo.slug());
        Ok(id)
    }

    /// Download the branch tarball into staging and move it into the private tier
    async fn fetch_archive(&self, importer: &Importer, repo: &RepoRef, id: &RecipeId) -> Result<()> {
        let staged = self.store.staging_path(id);

        if let Err(e) = importer.download_tarball(repo, &staged).await {
            if let Err(cleanup) = tokio::fs::remove_file(&staged).await
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                warn!("Failed to remove partial download {}: {}", staged.display(), cleanup);
            }
            return Err(e);
        }

        let store = self.store.clone();
        let id = id.clone();
        runtime::blocking(move || store.commit_private(&id, &staged)).await
    }
}

fn validate_upload(conn: &Connection, form: &NewRecipeForm) -> Result<Submission> {
    let mut v = Validator::new();
    let name = v.required("name", form.name.as_deref());
    let raw_id = v.required("id", form.id.as_deref());
    let author = v.required("author", form.author.as_deref());
    let png = v.url("png", form.png.as_deref()).and(form.png.as_deref());
    let svg = v.url("svg", form.svg.as_deref()).and(form.svg.as_deref());
    v.check(
        !form.files.is_empty(),
        "files",
        Rule::Required,
        "files is required",
    );
    v.check(
        form.files.iter().all(|f| staged_name(&f.file_name).is_some()),
        "files",
        Rule::Format,
        "Uploaded files must have plain file names",
    );
    check_id(&mut v, conn, raw_id)?;

    match (name, raw_id, author, png, svg) {
        (Some(name), Some(raw_id), Some(author), Some(png), Some(svg)) if v.is_valid() => {
            Ok(Submission {
                id: RecipeId::parse(raw_id)?,
                name: name.to_string(),
                data: RecipeData::new(
                    author,
                    UPLOAD_VERSION,
                    Icons {
                        png: png.to_string(),
                        svg: svg.to_string(),
                    },
                ),
            })
        }
        _ => Err(v.finish().err().unwrap_or_default().into()),
    }
}

fn validate_manifest(
    conn: &Connection,
    manifest: &PackageManifest,
    icons: Icons,
) -> Result<Submission> {
    let (name, raw_id, author, version) = (
        manifest.name(),
        manifest.id(),
        manifest.author(),
        manifest.version(),
    );

    let mut v = Validator::new();
    let name = v.required("name", name.as_deref());
    let raw_id = v.required("id", raw_id.as_deref());
    let author = v.required("author", author.as_deref());
    let version = v.required("version", version.as_deref());
    check_id(&mut v, conn, raw_id)?;

    match (name, raw_id, author, version) {
        (Some(name), Some(raw_id), Some(author), Some(version)) if v.is_valid() => {
            Ok(Submission {
                id: RecipeId::parse(raw_id)?,
                name: name.to_string(),
                data: RecipeData::new(author, version, icons),
            })
        }
        _ => Err(v.finish().err().unwrap_or_default().into()),
    }
}

/// Format and uniqueness rules for a present `id`
fn check_id(v: &mut Validator, conn: &Connection, raw_id: Option<&str>) -> Result<()> {
    let Some(raw_id) = raw_id else {
        return Ok(());
    };

    let well_formed = is_valid_recipe_id(raw_id);
    v.check(
        well_formed,
        "id",
        Rule::Format,
        Error::InvalidRecipeId(raw_id.to_string()).to_string(),
    );
    if well_formed {
        let taken = Recipe::exists(conn, raw_id)?;
        v.check(!taken, "id", Rule::Unique, taken_message(raw_id));
    }
    Ok(())
}

fn taken_message(raw_id: &str) -> String {
    format!("A recipe with id '{raw_id}' already exists")
}

fn insert_pending(conn: &Connection, submission: &Submission) -> Result<()> {
    let mut record = Recipe::new(
        submission.id.as_str(),
        submission.name.clone(),
        submission.data.to_json()?,
    );
    match record.insert(conn) {
        Ok(_) => Ok(()),
        // Lost a race with a concurrent submission of the same id
        Err(Error::AlreadyExists(_)) => Err(ValidationErrors::single(
            "id",
            Rule::Unique,
            taken_message(submission.id.as_str()),
        )
        .into()),
        Err(e) => Err(e),
    }
}

/// Drop the record of a submission whose archive never landed
fn forget(conn: &Connection, id: &RecipeId) {
    if let Err(e) = Recipe::delete(conn, id.as_str()) {
        error!("Failed to remove registry record for {}: {}", id, e);
    }
}

/// Final path component of an uploaded file name
fn staged_name(file_name: &str) -> Option<&str> {
    Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
}
