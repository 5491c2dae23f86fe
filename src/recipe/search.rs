// src/recipe/search.rs

//! Public recipe search
//!
//! Local published recipes are listed first, followed by whatever the
//! upstream service returns for the same needle. The upstream is best effort:
//! when it fails, only local results are returned.

use crate::db::Registry;
use crate::db::models::Recipe;
use crate::error::Result;
use crate::runtime;
use crate::upstream::UpstreamClient;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Default needle that lists every published local recipe
pub const DEFAULT_SENTINEL: &str = "ferdi:custom";

#[derive(Debug, Clone)]
pub struct SearchService {
    registry: Registry,
    upstream: UpstreamClient,
    sentinel: String,
}

impl SearchService {
    pub fn new(registry: Registry, upstream: UpstreamClient, sentinel: impl Into<String>) -> Self {
        Self {
            registry,
            upstream,
            sentinel: sentinel.into(),
        }
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub async fn search(&self, needle: &str) -> Result<Vec<Value>> {
        if needle == self.sentinel {
            let registry = self.registry.clone();
            let records = runtime::blocking(move || {
                let conn = registry.connect()?;
                Recipe::list_by_visibility(&conn, true)
            })
            .await?;
            return Ok(records.iter().map(decorate).collect());
        }

        let registry = self.registry.clone();
        let owned = needle.to_string();
        let local = runtime::blocking(move || {
            let conn = registry.connect()?;
            Recipe::search_public(&conn, &owned)
        });

        let (local, remote) = tokio::join!(local, self.upstream.search(needle));

        let mut results: Vec<Value> = local?.iter().map(decorate).collect();
        debug!("{} local results for '{}'", results.len(), needle);
        match remote {
            Ok(remote) => results.extend(remote),
            Err(e) => warn!("Upstream search for '{}' failed: {}", needle, e),
        }
        Ok(results)
    }
}

/// `{id, name, ...data}` for a published record
///
/// `id` and `name` always come from the record, even if `data` carries keys
/// of the same name.
pub fn decorate(recipe: &Recipe) -> Value {
    let mut fields = match serde_json::from_str::<Value>(&recipe.data) {
        Ok(Value::Object(map)) => map,
        _ => {
            warn!("Recipe {} has malformed data", recipe.recipe_id);
            Map::new()
        }
    };
    fields.insert("id".to_string(), Value::String(recipe.recipe_id.clone()));
    fields.insert("name".to_string(), Value::String(recipe.name.clone()));
    Value::Object(fields)
}
