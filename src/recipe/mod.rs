// src/recipe/mod.rs

//! Recipe submission, review and discovery
//!
//! A recipe is a distributable service integration: a registry record plus a
//! gzip'd tarball in the archive store.
//!
//! - [`creation`]: direct uploads and GitHub imports, landing as pending
//! - [`lifecycle`]: admin review (accept, delete, audit)
//! - [`search`]: public search merged with the upstream service
//!
//! Every id that reaches storage goes through [`RecipeId::parse`] first.

pub mod creation;
pub mod data;
pub mod github;
mod id;
pub mod lifecycle;
pub mod search;

pub use creation::{Creation, GithubForm, NewRecipeForm, UploadedFile};
pub use data::{Icons, RecipeData};
pub use github::{ImportConfig, Importer, RepoRef};
pub use id::{RecipeId, is_valid_recipe_id};
pub use lifecycle::{Inconsistency, Lifecycle};
pub use search::SearchService;
