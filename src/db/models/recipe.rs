// src/db/models/recipe.rs

//! Recipe model - one row per uploaded or imported recipe

use crate::error::{Error, Result};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

const COLUMNS: &str = "id, recipe_id, name, is_public, data, created_at, updated_at";

/// Database representation of a recipe
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: Option<i64>,
    /// Externally supplied identifier, also the archive file stem
    pub recipe_id: String,
    /// Display name, matched by search
    pub name: String,
    /// False while pending review
    pub is_public: bool,
    /// Serialized metadata blob (author, version, icons, featured)
    pub data: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Recipe {
    /// Create a new pending (private) recipe
    pub fn new(recipe_id: impl Into<String>, name: impl Into<String>, data: String) -> Self {
        Self {
            id: None,
            recipe_id: recipe_id.into(),
            name: name.into(),
            is_public: false,
            data,
            created_at: None,
            updated_at: None,
        }
    }

    /// Insert this recipe; a taken `recipe_id` yields `AlreadyExists`
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        let result = conn.execute(
            "INSERT INTO recipes (recipe_id, name, is_public, data) VALUES (?1, ?2, ?3, ?4)",
            params![&self.recipe_id, &self.name, self.is_public as i32, &self.data],
        );

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(Error::AlreadyExists(format!("Recipe '{}'", self.recipe_id)));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a recipe by its external identifier
    pub fn find_by_recipe_id(conn: &Connection, recipe_id: &str) -> Result<Option<Self>> {
        let mut stmt =
            conn.prepare(&format!("SELECT {COLUMNS} FROM recipes WHERE recipe_id = ?1"))?;
        let recipe = stmt.query_row([recipe_id], Self::from_row).optional()?;
        Ok(recipe)
    }

    /// Whether any record uses `recipe_id`
    pub fn exists(conn: &Connection, recipe_id: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipes WHERE recipe_id = ?1",
            [recipe_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List recipes with the given visibility, oldest first
    pub fn list_by_visibility(conn: &Connection, is_public: bool) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM recipes WHERE is_public = ?1 ORDER BY id"
        ))?;

        let recipes = stmt
            .query_map([is_public as i32], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    /// List every recipe regardless of visibility
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM recipes ORDER BY id"))?;

        let recipes = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    /// Public recipes whose name contains `needle` (case-sensitive)
    ///
    /// `instr` is used instead of `LIKE`, which folds ASCII case in SQLite and
    /// treats `%`/`_` in the needle as wildcards.
    pub fn search_public(conn: &Connection, needle: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM recipes WHERE is_public = 1 AND instr(name, ?1) > 0 ORDER BY id"
        ))?;

        let recipes = stmt
            .query_map([needle], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    /// Set the visibility flag; returns the number of rows touched
    pub fn set_public(conn: &Connection, recipe_id: &str, is_public: bool) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE recipes SET is_public = ?1, updated_at = CURRENT_TIMESTAMP WHERE recipe_id = ?2",
            params![is_public as i32, recipe_id],
        )?;
        Ok(changed)
    }

    /// Delete by external identifier; returns the number of rows removed
    pub fn delete(conn: &Connection, recipe_id: &str) -> Result<usize> {
        let removed = conn.execute("DELETE FROM recipes WHERE recipe_id = ?1", [recipe_id])?;
        Ok(removed)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            recipe_id: row.get(1)?,
            name: row.get(2)?,
            is_public: row.get::<_, i32>(3)? != 0,
            data: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::migrate(&conn).unwrap();
        conn
    }

    fn insert(conn: &Connection, recipe_id: &str, name: &str, is_public: bool) {
        let mut recipe = Recipe::new(recipe_id, name, "{}".to_string());
        recipe.insert(conn).unwrap();
        if is_public {
            Recipe::set_public(conn, recipe_id, true).unwrap();
        }
    }

    #[test]
    fn test_insert_and_find() {
        let conn = test_conn();
        let mut recipe = Recipe::new("foo", "Foo", r#"{"author":"bar"}"#.to_string());
        let id = recipe.insert(&conn).unwrap();
        assert_eq!(recipe.id, Some(id));

        let found = Recipe::find_by_recipe_id(&conn, "foo").unwrap().unwrap();
        assert_eq!(found.name, "Foo");
        assert!(!found.is_public);
        assert_eq!(found.data, r#"{"author":"bar"}"#);
        assert!(found.created_at.is_some());

        assert!(Recipe::find_by_recipe_id(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_is_already_exists() {
        let conn = test_conn();
        insert(&conn, "foo", "Foo", false);

        let mut dup = Recipe::new("foo", "Other", "{}".to_string());
        let err = dup.insert(&conn).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_visibility_listing() {
        let conn = test_conn();
        insert(&conn, "a", "A", false);
        insert(&conn, "b", "B", true);
        insert(&conn, "c", "C", false);

        let pending: Vec<String> = Recipe::list_by_visibility(&conn, false)
            .unwrap()
            .into_iter()
            .map(|r| r.recipe_id)
            .collect();
        assert_eq!(pending, vec!["a", "c"]);

        let public = Recipe::list_by_visibility(&conn, true).unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].recipe_id, "b");
    }

    #[test]
    fn test_search_public_is_case_sensitive_substring() {
        let conn = test_conn();
        insert(&conn, "slack", "Slack", true);
        insert(&conn, "slackware", "slack mirror", true);
        insert(&conn, "hidden", "Slack Private", false);

        let hits: Vec<String> = Recipe::search_public(&conn, "Slack")
            .unwrap()
            .into_iter()
            .map(|r| r.recipe_id)
            .collect();
        assert_eq!(hits, vec!["slack"]);

        let hits = Recipe::search_public(&conn, "lack").unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let conn = test_conn();
        insert(&conn, "pct", "100% Chat", true);
        insert(&conn, "other", "Other", true);

        assert_eq!(Recipe::search_public(&conn, "%").unwrap().len(), 1);
        assert!(Recipe::search_public(&conn, "_").unwrap().is_empty());
    }

    #[test]
    fn test_set_public_and_delete() {
        let conn = test_conn();
        insert(&conn, "foo", "Foo", false);

        assert_eq!(Recipe::set_public(&conn, "foo", true).unwrap(), 1);
        assert!(Recipe::find_by_recipe_id(&conn, "foo").unwrap().unwrap().is_public);
        assert_eq!(Recipe::set_public(&conn, "missing", true).unwrap(), 0);

        assert!(Recipe::exists(&conn, "foo").unwrap());
        assert_eq!(Recipe::delete(&conn, "foo").unwrap(), 1);
        assert!(!Recipe::exists(&conn, "foo").unwrap());
        assert_eq!(Recipe::delete(&conn, "foo").unwrap(), 0);
    }
}
