//! Business layer errors
//!
//! Typed errors so the console can tell re-promptable input errors apart from
//! audited failures.

use rust_decimal::Decimal;
use tellerbank_core::CoreError;
use tellerbank_persistence::PersistenceError;
use thiserror::Error;

/// Business operation errors
#[derive(Debug, Error)]
pub enum BusinessError {
    // === Validation errors (re-prompt, not audited) ===
    #[error("{0}")]
    Validation(CoreError),

    // === Audited failures ===
    #[error("Invalid account number format: {0}")]
    InvalidAccountNumber(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Account closure cancelled by user")]
    ClosureCancelled,

    #[error("Admin approval failed")]
    AdminApprovalFailed,

    #[error("Authentication failed after {attempts} attempt(s)")]
    AuthenticationFailed { attempts: u32 },

    // === Configuration errors ===
    #[error("Invalid configuration: {0}")]
    Config(String),

    // === Wrapped errors ===
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type alias for business operations
pub type BusinessResult<T> = Result<T, BusinessError>;

impl From<CoreError> for BusinessError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientFunds {
                requested,
                available,
            } => Self::InsufficientFunds {
                requested,
                available,
            },
            CoreError::InvalidAccountNumber(raw) => Self::InvalidAccountNumber(raw),
            other => Self::Validation(other),
        }
    }
}

impl BusinessError {
    /// Input error the console should re-prompt for
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Reason string written to the audit trail for this failure
    pub fn audit_reason(&self) -> Option<&'static str> {
        match self {
            Self::InvalidAccountNumber(_) => Some("Invalid account number format"),
            Self::AccountNotFound(_) => Some("Account not found"),
            Self::InsufficientFunds { .. } => Some("Insufficient funds"),
            Self::ClosureCancelled => Some("User cancelled"),
            Self::AdminApprovalFailed => Some("Admin approval failed"),
            _ => None,
        }
    }
}
