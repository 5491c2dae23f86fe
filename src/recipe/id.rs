// src/recipe/id.rs

//! Recipe identifiers
//!
//! An identifier doubles as an archive file stem, so anything that could walk
//! out of the store directory is refused. Matching is literal: no trimming,
//! no case folding.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A validated recipe identifier: non-empty, no `.` and no `/`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecipeId(String);

impl RecipeId {
    /// Validate and wrap a candidate identifier
    pub fn parse(candidate: &str) -> Result<Self> {
        if is_valid_recipe_id(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(Error::InvalidRecipeId(candidate.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Archive file name, `<id>.tar.gz`
    pub fn archive_name(&self) -> String {
        format!("{}.tar.gz", self.0)
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecipeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `^[^./]+$`
pub fn is_valid_recipe_id(candidate: &str) -> bool {
    !candidate.is_empty() && !candidate.contains(['.', '/'])
}
