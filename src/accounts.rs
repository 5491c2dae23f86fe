// src/accounts.rs

//! Admin accounts and bearer sessions
//!
//! Passwords are stored as hex SHA-256 over a per-user random salt followed
//! by the password. Login failures never reveal whether the identifier
//! exists.

use crate::db::Registry;
use crate::db::models::{Session, User};
use crate::error::{Error, Result};
use crate::validation::{Rule, Validator, looks_like_email};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;

/// `POST /admin/register` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub key: Option<String>,
    pub terms: Option<String>,
}

/// `POST /admin/login` body; `identifier` is a username or an email
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub identifier: Option<String>,
    pub password: Option<String>,
}

/// Account operations over the registry
#[derive(Debug, Clone)]
pub struct Accounts {
    registry: Registry,
    registration_key: Option<String>,
}

impl Accounts {
    /// `registration_key` of `None` (or empty) disables registration
    pub fn new(registry: Registry, registration_key: Option<String>) -> Self {
        Self {
            registry,
            registration_key: registration_key.filter(|k| !k.is_empty()),
        }
    }

    /// Create an account and open a session for it
    pub fn register(&self, form: &RegisterForm) -> Result<(User, Session)> {
        let conn = self.registry.connect()?;

        let mut v = Validator::new();
        let username = v.required("username", form.username.as_deref());
        let email = v.email("email", form.email.as_deref());
        let password = v.required("password", form.password.as_deref());
        let key = v.required("key", form.key.as_deref());
        v.required("terms", form.terms.as_deref());
        if let Some(username) = username {
            let taken = User::username_taken(&conn, username)?;
            v.check(!taken, "username", Rule::Unique, "username is already taken");
        }
        if let Some(email) = email {
            let taken = User::email_taken(&conn, email)?;
            v.check(!taken, "email", Rule::Unique, "email is already registered");
        }

        let (Some(username), Some(email), Some(password), Some(key)) =
            (username, email, password, key)
        else {
            return Err(v.finish().err().unwrap_or_default().into());
        };
        v.finish()?;

        match &self.registration_key {
            Some(expected) if expected == key => {}
            _ => return Err(Error::InvalidRegistrationKey),
        }

        let salt = hex::encode(rand::random::<[u8; 16]>());
        let mut user = User::new(
            username.to_string(),
            email.to_string(),
            hash_password(&salt, password),
            salt,
        );
        let user_id = user.insert(&conn)?;
        let session = open_session(&conn, user_id)?;

        info!("Registered admin account {}", user.username);
        Ok((user, session))
    }

    /// Verify credentials and issue a session token
    pub fn login(&self, form: &LoginForm) -> Result<Session> {
        let (Some(identifier), Some(password)) = (
            form.identifier.as_deref().filter(|s| !s.is_empty()),
            form.password.as_deref().filter(|s| !s.is_empty()),
        ) else {
            return Err(Error::InvalidCredentials);
        };

        let conn = self.registry.connect()?;
        let user = if looks_like_email(identifier) {
            User::find_by_email(&conn, identifier)?
        } else {
            User::find_by_username(&conn, identifier)?
        };

        match user {
            Some(User {
                id: Some(user_id),
                ref password_hash,
                ref salt,
                ..
            }) if verify_password(salt, password, password_hash) => {
                let session = open_session(&conn, user_id)?;
                info!("Admin {} logged in", identifier);
                Ok(session)
            }
            _ => Err(Error::InvalidCredentials),
        }
    }

    /// Resolve a bearer token to its account
    pub fn authenticate(&self, token: &str) -> Result<User> {
        let conn = self.registry.connect()?;
        let Some(session) = Session::find(&conn, token)? else {
            return Err(Error::Unauthorized);
        };
        User::find_by_id(&conn, session.user_id)?.ok_or(Error::Unauthorized)
    }

    /// Revoke a session token
    pub fn logout(&self, token: &str) -> Result<()> {
        let conn = self.registry.connect()?;
        if Session::delete(&conn, token)? {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }
}

fn open_session(conn: &rusqlite::Connection, user_id: i64) -> Result<Session> {
    let session = Session::new(uuid::Uuid::new_v4().to_string(), user_id);
    session.insert(conn)?;
    Ok(session)
}

fn password_digest(salt: &str, password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

fn hash_password(salt: &str, password: &str) -> String {
    hex::encode(password_digest(salt, password))
}

/// Compare against a stored hex digest without exiting on the first differing byte
fn verify_password(salt: &str, password: &str, stored: &str) -> bool {
    let Ok(stored) = hex::decode(stored) else {
        return false;
    };
    let computed = password_digest(salt, password);
    stored.len() == computed.len()
        && stored
            .iter()
            .zip(computed.iter())
            .fold(0u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::validation::ValidationErrors;
    use tempfile::TempDir;

    fn accounts(key: Option<&str>) -> (TempDir, Accounts) {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("larder.db");
        db::init(&db_path).unwrap();
        let accounts = Accounts::new(Registry::new(&db_path), key.map(str::to_string));
        (temp, accounts)
    }

    fn form(username: &str, email: &str) -> RegisterForm {
        RegisterForm {
            username: Some(username.to_string()),
            email: Some(email.to_string()),
            password: Some("hunter22".to_string()),
            key: Some("sesame".to_string()),
            terms: Some("on".to_string()),
        }
    }

    fn login(identifier: &str, password: &str) -> LoginForm {
        LoginForm {
            identifier: Some(identifier.to_string()),
            password: Some(password.to_string()),
        }
    }

    fn validation(err: Error) -> ValidationErrors {
        match err {
            Error::Validation(errors) => errors,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_register_and_login() {
        let (_temp, accounts) = accounts(Some("sesame"));
        let (user, session) = accounts.register(&form("admin", "admin@example.com")).unwrap();
        assert_ne!(user.password_hash, "hunter22");
        assert_eq!(accounts.authenticate(&session.token).unwrap().username, "admin");

        let by_name = accounts.login(&login("admin", "hunter22")).unwrap();
        let by_mail = accounts.login(&login("admin@example.com", "hunter22")).unwrap();
        assert_ne!(by_name.token, by_mail.token);
    }

    #[test]
    fn test_verify_password() {
        let stored = hash_password("pepper", "hunter22");
        assert!(verify_password("pepper", "hunter22", &stored));
        assert!(!verify_password("pepper", "hunter23", &stored));
        assert!(!verify_password("salt", "hunter22", &stored));
        assert!(!verify_password("pepper", "hunter22", &stored[..62]));
        assert!(!verify_password("pepper", "hunter22", "not hex"));
        assert!(!verify_password("pepper", "hunter22", ""));
    }

    #[test]
    fn test_login_failures_are_indistinguishable() {
        let (_temp, accounts) = accounts(Some("sesame"));
        accounts.register(&form("admin", "admin@example.com")).unwrap();

        for attempt in [
            login("admin", "wrong"),
            login("nobody", "hunter22"),
            login("nobody@example.com", "hunter22"),
            LoginForm::default(),
        ] {
            assert!(matches!(accounts.login(&attempt), Err(Error::InvalidCredentials)));
        }
    }

    #[test]
    fn test_register_validation() {
        let (_temp, accounts) = accounts(Some("sesame"));
        accounts.register(&form("admin", "admin@example.com")).unwrap();

        let errors = validation(accounts.register(&form("admin", "admin@example.com")).unwrap_err());
        assert!(errors.has("username", Rule::Unique));
        assert!(errors.has("email", Rule::Unique));

        let errors = validation(accounts.register(&form("other", "not-an-email")).unwrap_err());
        assert!(errors.has("email", Rule::Email));

        let errors = validation(accounts.register(&RegisterForm::default()).unwrap_err());
        for field in ["username", "email", "password", "key", "terms"] {
            assert!(errors.has(field, Rule::Required), "{field}");
        }
    }

    #[test]
    fn test_registration_key() {
        let (_temp, accounts) = accounts(Some("sesame"));
        let mut wrong = form("admin", "admin@example.com");
        wrong.key = Some("open".to_string());
        assert!(matches!(accounts.register(&wrong), Err(Error::InvalidRegistrationKey)));

        let (_temp, disabled) = self::accounts(Some(""));
        assert!(matches!(
            disabled.register(&form("admin", "admin@example.com")),
            Err(Error::InvalidRegistrationKey)
        ));
    }

    #[test]
    fn test_logout_revokes_token() {
        let (_temp, accounts) = accounts(Some("sesame"));
        let (_, session) = accounts.register(&form("admin", "admin@example.com")).unwrap();

        accounts.logout(&session.token).unwrap();
        assert!(matches!(accounts.authenticate(&session.token), Err(Error::Unauthorized)));
        assert!(matches!(accounts.logout(&session.token), Err(Error::Unauthorized)));
    }
}
