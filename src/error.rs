// src/error.rs

//! Error types for Larder
//!
//! Domain outcomes that callers are expected to act on (bad input, missing
//! recipe, wrong password) are distinct variants so the HTTP layer can map
//! them without string matching. Everything else is a system failure.

use crate::validation::ValidationErrors;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the registry, store, lifecycle and account operations
#[derive(Error, Debug)]
pub enum Error {
    /// Recipe identifier is empty or contains a path character
    #[error("Invalid recipe name '{0}'. Your recipe name may not contain \".\" or \"/\"")]
    InvalidRecipeId(String),

    /// One or more input fields failed validation
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// Requested recipe, archive or account does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Unique key collision in the registry
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Login attempt with a wrong identifier/password pair
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Identifier locked after too many failed logins
    #[error("Too many failed login attempts for '{0}', try again later")]
    LockedOut(String),

    /// Missing or unknown session token
    #[error("Authentication required")]
    Unauthorized,

    /// Registration key did not match
    #[error("Invalid registration key")]
    InvalidRegistrationKey,

    /// Remote service returned an unusable response
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A blocking worker panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),

    /// Setup or configuration problem
    #[error("Initialization error: {0}")]
    InitError(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}
