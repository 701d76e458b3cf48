//! # Tellerbank Core
//!
//! Domain types cho Tellerbank - Account (Current/Savings), validation rules,
//! audit records và các traits cho collaborators bên ngoài (Authenticator, AuditSink).
//!
//! Crate này không làm I/O. Persistence và console nằm ở các crates khác.

pub mod account;
pub mod audit;
pub mod auth;
pub mod error;
pub mod validation;

pub use account::{Account, AccountId, AccountKind, AccountType, Holder, NewAccount};
pub use audit::{
    AppMetadata, AuditEntry, AuditError, AuditResult, AuditSink, AuthRecord, MachineContext,
    Outcome, TransactionKind, TransactionRecord, UNKNOWN_HOLDER,
};
pub use auth::{AuthError, Authenticator, Credentials, Principal};
pub use error::{CoreError, CoreResult};
pub use validation::{
    is_valid_name, parse_amount, parse_non_negative, require_non_empty, requires_justification,
    validate_positive_amount, DEFAULT_DISCLOSURE_THRESHOLD,
};
