use crate::backend::AuthProvider;
use crate::db::{format_timestamp, open_connection, DB_FILE};
use crate::error::{Error, Result};
use crate::types::User;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

const SESSION_FILE: &str = "_session.yaml";

/// Auth provider backed by the workspace database, with the signed-in user
/// persisted next to it so the session survives between invocations
pub struct LocalAuth {
    conn: Connection,
    session_file: Option<PathBuf>,
    current: Option<User>,
}

impl LocalAuth {
    pub fn open(circle_path: &Path) -> Result<Self> {
        let conn = open_connection(&circle_path.join(DB_FILE))?;
        let session_file = circle_path.join(SESSION_FILE);
        let current = load_session(&session_file)?;

        Ok(Self {
            conn,
            session_file: Some(session_file),
            current,
        })
    }

    /// In-memory provider without a session file (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: crate::db::open_in_memory()?,
            session_file: None,
            current: None,
        })
    }

    /// Register a new account and sign it in
    pub fn sign_up(&mut self, email: &str, name: &str, password: &str) -> Result<User> {
        let email = normalize_email(email)?;
        if password.len() < 6 {
            return Err(Error::Validation(
                "password must be at least 6 characters".to_string(),
            ));
        }

        let taken: Option<String> = self
            .conn
            .query_row("SELECT id FROM users WHERE email = ?1", params![email], |row| row.get(0))
            .optional()?;
        if taken.is_some() {
            return Err(Error::Validation(format!("an account already exists for {}", email)));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            email,
            name: name.trim().to_string(),
        };
        let salt = uuid::Uuid::new_v4().simple().to_string();

        self.conn.execute(
            "INSERT INTO users (id, email, name, password_hash, salt, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                user.email,
                user.name,
                hash_password(&salt, password),
                salt,
                format_timestamp(chrono::Utc::now()),
            ],
        )?;
        log::info!("registered user {}", user.id);

        self.set_session(Some(user.clone()))?;
        Ok(user)
    }

    /// Change the display name of the signed-in user
    pub fn update_user(&mut self, name: &str) -> Result<User> {
        let mut user = self.current.clone().ok_or(Error::NotSignedIn)?;

        self.conn.execute(
            "UPDATE users SET name = ?1 WHERE id = ?2",
            params![name.trim(), user.id],
        )?;

        user.name = name.trim().to_string();
        self.set_session(Some(user.clone()))?;
        Ok(user)
    }

    /// The signed-in user, or `NotSignedIn`
    pub fn require_user(&self) -> Result<&User> {
        self.current.as_ref().ok_or(Error::NotSignedIn)
    }

    fn set_session(&mut self, user: Option<User>) -> Result<()> {
        if let Some(path) = &self.session_file {
            match &user {
                Some(u) => fs::write(path, serde_yaml::to_string(u)?)?,
                None => {
                    if path.exists() {
                        fs::remove_file(path)?;
                    }
                }
            }
        }
        self.current = user;
        Ok(())
    }
}

impl AuthProvider for LocalAuth {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email)?;

        let row: Option<(String, String, String, String)> = self
            .conn
            .query_row(
                "SELECT id, name, password_hash, salt FROM users WHERE email = ?1",
                params![email],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let Some((id, name, stored_hash, salt)) = row else {
            log::warn!("sign-in rejected for unknown account {}", email);
            return Err(Error::Auth("invalid email or password".to_string()));
        };

        if hash_password(&salt, password) != stored_hash {
            log::warn!("sign-in rejected for {}", email);
            return Err(Error::Auth("invalid email or password".to_string()));
        }

        let user = User { id, email, name };
        self.set_session(Some(user.clone()))?;
        Ok(user)
    }

    fn sign_out(&mut self) -> Result<()> {
        self.set_session(None)
    }

    fn current_user(&self) -> Option<&User> {
        self.current.as_ref()
    }
}

fn load_session(path: &Path) -> Result<Option<User>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    match serde_yaml::from_str::<User>(&content) {
        Ok(user) => Ok(Some(user)),
        Err(e) => {
            // A corrupt session just means signing in again
            log::warn!("ignoring unreadable session file {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::Validation(format!("invalid email address '{}'", email)));
    }
    Ok(email)
}

/// Salted SHA-256 digest for the local user table. Single pass, no key
/// stretching; suitable only for a database that never leaves this machine.
fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
