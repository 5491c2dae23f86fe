// src/recipe/lifecycle.rs

//! Review transitions: pending -> public (accept) and pending -> gone (delete)
//!
//! Both transitions are keyed on the presence of a private archive, not on the
//! registry row. Registry and store are separate systems, so each transition
//! undoes its first step when the second one fails.

use crate::db::Registry;
use crate::db::models::Recipe;
use crate::error::{Error, Result};
use crate::recipe::RecipeId;
use crate::store::{RecipeStore, Tier};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{error, info, warn};

/// Registry/store divergence found by [`Lifecycle::audit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// Record exists but its archive is not in the tier its visibility implies
    MissingArchive {
        recipe_id: String,
        expected: Tier,
        found: Option<Tier>,
    },
    /// Archive exists with no record
    OrphanArchive { recipe_id: String, tier: Tier },
    /// Same id archived in both tiers
    DuplicateArchive { recipe_id: String },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inconsistency::MissingArchive {
                recipe_id,
                expected,
                found,
            } => match found {
                Some(tier) => write!(
                    f,
                    "{recipe_id}: record expects a {expected:?} archive but it is {tier:?}"
                ),
                None => write!(f, "{recipe_id}: record has no archive ({expected:?} expected)"),
            },
            Inconsistency::OrphanArchive { recipe_id, tier } => {
                write!(f, "{recipe_id}: {tier:?} archive has no record")
            }
            Inconsistency::DuplicateArchive { recipe_id } => {
                write!(f, "{recipe_id}: archived in both tiers")
            }
        }
    }
}

/// Admin-side transitions over the registry and the archive store
#[derive(Debug, Clone)]
pub struct Lifecycle {
    registry: Registry,
    store: RecipeStore,
}

impl Lifecycle {
    pub fn new(registry: Registry, store: RecipeStore) -> Self {
        Self { registry, store }
    }

    /// Records awaiting review
    pub fn list_pending(&self) -> Result<Vec<Recipe>> {
        let conn = self.registry.connect()?;
        Recipe::list_by_visibility(&conn, false)
    }

    /// Publish a pending recipe
    pub fn accept(&self, raw_id: &str) -> Result<RecipeId> {
        let id = RecipeId::parse(raw_id)?;
        if !self.store.exists_private(&id) {
            return Err(Error::NotFound("Recipe".to_string()));
        }

        let conn = self.registry.connect()?;
        self.store.publish(&id)?;

        match Recipe::set_public(&conn, id.as_str(), true) {
            Ok(0) => warn!("Published archive for {} has no registry record", id),
            Ok(_) => {}
            Err(e) => {
                if let Err(undo) = self.store.unpublish(&id) {
                    error!("Failed to restore private archive for {}: {}", id, undo);
                }
                return Err(e);
            }
        }

        info!("Recipe {} published", id);
        Ok(id)
    }

    /// Reject a pending recipe, dropping its record and archive
    ///
    /// Published recipes have no private archive and are reported not found.
    pub fn delete(&self, raw_id: &str) -> Result<RecipeId> {
        let id = RecipeId::parse(raw_id)?;
        if !self.store.exists_private(&id) {
            return Err(Error::NotFound("Recipe".to_string()));
        }

        let conn = self.registry.connect()?;
        let existing = Recipe::find_by_recipe_id(&conn, id.as_str())?;
        Recipe::delete(&conn, id.as_str())?;

        if let Err(e) = self.store.remove(&id) {
            if let Some(mut recipe) = existing
                && let Err(undo) = recipe.insert(&conn)
            {
                error!("Failed to restore registry record for {}: {}", id, undo);
            }
            return Err(e);
        }

        info!("Recipe {} deleted", id);
        Ok(id)
    }

    /// Compare every record with the archives on disk
    pub fn audit(&self) -> Result<Vec<Inconsistency>> {
        let conn = self.registry.connect()?;
        let records = Recipe::list_all(&conn)?;
        let listing = self.store.list()?;

        let public: BTreeSet<&str> = listing.public.iter().map(String::as_str).collect();
        let private: BTreeSet<&str> = listing.private.iter().map(String::as_str).collect();
        let known: BTreeSet<&str> = records.iter().map(|r| r.recipe_id.as_str()).collect();

        let mut findings = Vec::new();

        for recipe in &records {
            let id = recipe.recipe_id.as_str();
            let in_public = public.contains(id);
            let in_private = private.contains(id);
            let (expected, present, other) = if recipe.is_public {
                (Tier::Public, in_public, in_private.then_some(Tier::Private))
            } else {
                (Tier::Private, in_private, in_public.then_some(Tier::Public))
            };

            if !present {
                findings.push(Inconsistency::MissingArchive {
                    recipe_id: id.to_string(),
                    expected,
                    found: other,
                });
            }
        }

        for id in public.intersection(&private) {
            findings.push(Inconsistency::DuplicateArchive {
                recipe_id: id.to_string(),
            });
        }

        for (ids, tier) in [(&public, Tier::Public), (&private, Tier::Private)] {
            for id in ids.difference(&known) {
                findings.push(Inconsistency::OrphanArchive {
                    recipe_id: id.to_string(),
                    tier,
                });
            }
        }

        Ok(findings)
    }
}
