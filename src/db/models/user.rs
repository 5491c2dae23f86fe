// src/db/models/user.rs

//! User and Session models - admin accounts and their bearer tokens

use crate::error::{Error, Result};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};

const USER_COLUMNS: &str = "id, username, email, password_hash, salt, created_at";

/// An admin account
#[derive(Debug, Clone)]
pub struct User {
    pub id: Option<i64>,
    pub username: String,
    pub email: String,
    /// Hex SHA-256 of salt || password
    pub password_hash: String,
    /// Hex random salt
    pub salt: String,
    pub created_at: Option<String>,
}

impl User {
    pub fn new(username: String, email: String, password_hash: String, salt: String) -> Self {
        Self {
            id: None,
            username,
            email,
            password_hash,
            salt,
            created_at: None,
        }
    }

    /// Insert this user; a taken username or email yields `AlreadyExists`
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        let result = conn.execute(
            "INSERT INTO users (username, email, password_hash, salt) VALUES (?1, ?2, ?3, ?4)",
            params![&self.username, &self.email, &self.password_hash, &self.salt],
        );

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(Error::AlreadyExists(format!("User '{}'", self.username)));
            }
            Err(e) => return Err(e.into()),
        }

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;
        Ok(stmt.query_row([id], Self::from_row).optional()?)
    }

    pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<Self>> {
        let mut stmt =
            conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))?;
        Ok(stmt.query_row([username], Self::from_row).optional()?)
    }

    pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<Self>> {
        let mut stmt =
            conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"))?;
        Ok(stmt.query_row([email], Self::from_row).optional()?)
    }

    pub fn username_taken(conn: &Connection, username: &str) -> Result<bool> {
        Ok(Self::find_by_username(conn, username)?.is_some())
    }

    pub fn email_taken(conn: &Connection, email: &str) -> Result<bool> {
        Ok(Self::find_by_email(conn, email)?.is_some())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            salt: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

/// A bearer token issued at login
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub created_at: Option<String>,
}

impl Session {
    pub fn new(token: String, user_id: i64) -> Self {
        Self {
            token,
            user_id,
            created_at: None,
        }
    }

    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO sessions (token, user_id) VALUES (?1, ?2)",
            params![&self.token, self.user_id],
        )?;
        Ok(())
    }

    pub fn find(conn: &Connection, token: &str) -> Result<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT token, user_id, created_at FROM sessions WHERE token = ?1")?;
        let session = stmt
            .query_row([token], |row| {
                Ok(Self {
                    token: row.get(0)?,
                    user_id: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .optional()?;
        Ok(session)
    }

    /// Revoke a token; returns whether it existed
    pub fn delete(conn: &Connection, token: &str) -> Result<bool> {
        Ok(conn.execute("DELETE FROM sessions WHERE token = ?1", [token])? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();
        schema::migrate(&conn).unwrap();
        conn
    }

    fn alice() -> User {
        User::new(
            "alice".to_string(),
            "alice@example.com".to_string(),
            "hash".to_string(),
            "salt".to_string(),
        )
    }

    #[test]
    fn test_user_lookup() {
        let conn = test_conn();
        let id = alice().insert(&conn).unwrap();

        assert_eq!(User::find_by_id(&conn, id).unwrap().unwrap().username, "alice");
        assert!(User::find_by_username(&conn, "alice").unwrap().is_some());
        assert!(User::find_by_email(&conn, "alice@example.com").unwrap().is_some());
        assert!(User::username_taken(&conn, "alice").unwrap());
        assert!(!User::email_taken(&conn, "bob@example.com").unwrap());
    }

    #[test]
    fn test_duplicate_user() {
        let conn = test_conn();
        alice().insert(&conn).unwrap();
        let err = alice().insert(&conn).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
    }

    #[test]
    fn test_session_lifecycle() {
        let conn = test_conn();
        let user_id = alice().insert(&conn).unwrap();

        Session::new("tok".to_string(), user_id).insert(&conn).unwrap();
        let session = Session::find(&conn, "tok").unwrap().unwrap();
        assert_eq!(session.user_id, user_id);

        assert!(Session::delete(&conn, "tok").unwrap());
        assert!(!Session::delete(&conn, "tok").unwrap());
        assert!(Session::find(&conn, "tok").unwrap().is_none());
    }
}
