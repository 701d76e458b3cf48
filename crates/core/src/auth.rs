//! # Auth Module
//!
//! Interface tới directory service: xác thực teller/admin và kiểm tra group.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Username + secret do người dùng nhập
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    secret: String,
}

impl Credentials {
    pub fn new(username: &str, secret: &str) -> Self {
        Self {
            username: username.trim().to_string(),
            secret: secret.to_string(),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Người dùng đã xác thực thành công
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Các group trong directory
    #[serde(default)]
    pub groups: Vec<String>,
}

impl Principal {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            display_name: None,
            groups: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.groups.push(group.to_string());
        self
    }

    /// So sánh tên group không phân biệt hoa thường
    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.eq_ignore_ascii_case(group))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.display_name {
            Some(name) => write!(f, "{} ({})", name, self.username),
            None => write!(f, "{}", self.username),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Directory service unavailable: {0}")]
    Directory(String),
}

/// Directory service (LDAP, AD, file, ...).
pub trait Authenticator: Send + Sync {
    /// Xác thực username/secret, trả về principal nếu đúng
    fn authenticate(&self, username: &str, secret: &str) -> Result<Principal, AuthError>;

    /// Principal có thuộc role (group) không
    fn has_role(&self, principal: &Principal, role: &str) -> bool {
        principal.is_member_of(role)
    }
}
