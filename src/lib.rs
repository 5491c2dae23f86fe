// src/lib.rs

//! Larder recipe distribution server
//!
//! Accepts recipe submissions (direct uploads or GitHub imports), holds them
//! for admin review, and serves published recipes alongside an upstream
//! recipe service.
//!
//! # Architecture
//!
//! - Registry: SQLite table of recipe records, admin users and sessions
//! - Store: two-tier archive directory (public, private) keyed by recipe id
//! - Lifecycle: pending -> public (accept) or pending -> gone (delete)
//! - Search: local published recipes first, upstream results appended

pub mod accounts;
pub mod db;
mod error;
pub mod recipe;
pub mod runtime;
pub mod server;
pub mod store;
pub mod upstream;
pub mod validation;

pub use db::Registry;
pub use error::{Error, Result};
pub use recipe::{Creation, Lifecycle, RecipeId, SearchService};
pub use store::RecipeStore;
pub use upstream::UpstreamClient;
pub use validation::{FieldMessage, Rule, ValidationErrors};
