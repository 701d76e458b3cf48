//! # Persistence Errors
//!
//! Error types cho persistence layer, wrapping IO, serde và core errors.

use tellerbank_core::CoreError;
use thiserror::Error;

/// Persistence layer errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    // === Repository errors ===
    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate id: {entity} with id {id}")]
    DuplicateId { entity: String, id: String },

    /// Mutation bị core từ chối (insufficient funds, invalid amount)
    #[error(transparent)]
    Rejected(#[from] CoreError),

    // === File errors ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // === Security errors ===
    #[error("Cipher error: {0}")]
    Cipher(#[from] crate::cipher::CipherError),

    #[error("Password hash error: {0}")]
    PasswordHash(String),

    // === Other errors ===
    #[error("{0}")]
    Other(String),
}

/// Result type alias cho PersistenceError
pub type PersistenceResult<T> = Result<T, PersistenceError>;

impl PersistenceError {
    /// Tạo NotFound error
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Tạo DuplicateId error
    pub fn duplicate_id(entity: &str, id: &str) -> Self {
        Self::DuplicateId {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }

    /// Kiểm tra có phải lỗi not found không
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Lỗi nghiệp vụ từ core (nếu có)
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Rejected(err) => Some(err),
            _ => None,
        }
    }
}
