//! Directory file - danh sách teller/admin với mật khẩu argon2.
//!
//! Thay thế directory service thật (Active Directory, LDAP) khi chạy offline.
//! File JSON:
//!
//! ```json
//! {
//!   "users": [
//!     {
//!       "username": "jdoe",
//!       "display_name": "Jane Doe",
//!       "password_hash": "$argon2id$v=19$...",
//!       "groups": ["Bank Teller"]
//!     }
//!   ]
//! }
//! ```

use crate::error::{PersistenceError, PersistenceResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tellerbank_core::{AuthError, Authenticator, Principal};
use tracing::{debug, warn};

/// Một user trong directory file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// PHC string (argon2id)
    pub password_hash: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

impl DirectoryUser {
    /// Tạo user mới, hash secret bằng argon2
    pub fn new(username: &str, secret: &str) -> PersistenceResult<Self> {
        Ok(Self {
            username: username.trim().to_string(),
            display_name: None,
            password_hash: hash_secret(secret)?,
            groups: Vec::new(),
        })
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.groups.push(group.to_string());
        self
    }

    fn verify(&self, secret: &str) -> bool {
        let parsed = match PasswordHash::new(&self.password_hash) {
            Ok(hash) => hash,
            Err(e) => {
                warn!(username = %self.username, error = %e, "malformed password hash in directory");
                return false;
            }
        };
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }

    fn principal(&self) -> Principal {
        Principal {
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            groups: self.groups.clone(),
        }
    }
}

/// Directory được load từ file JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryFile {
    #[serde(default)]
    pub users: Vec<DirectoryUser>,
}

impl DirectoryFile {
    /// Load directory từ file
    pub fn load<P: AsRef<Path>>(path: P) -> PersistenceResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let directory: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), users = directory.users.len(), "directory loaded");
        Ok(directory)
    }

    pub fn from_users(users: Vec<DirectoryUser>) -> Self {
        Self { users }
    }

    /// Ghi directory ra file (pretty JSON)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> PersistenceResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    fn find(&self, username: &str) -> Option<&DirectoryUser> {
        let username = username.trim();
        self.users
            .iter()
            .find(|u| u.username.eq_ignore_ascii_case(username))
    }
}

impl Authenticator for DirectoryFile {
    fn authenticate(&self, username: &str, secret: &str) -> Result<Principal, AuthError> {
        match self.find(username) {
            Some(user) if user.verify(secret) => Ok(user.principal()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

/// Hash secret thành PHC string argon2id với salt ngẫu nhiên
pub fn hash_secret(secret: &str) -> PersistenceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PersistenceError::PasswordHash(e.to_string()))
}
