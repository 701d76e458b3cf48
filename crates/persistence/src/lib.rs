//! # Tellerbank Persistence
//!
//! Persistence layer cho Tellerbank.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Persistence                            │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────────┐ │
//! │  │ Repository  │    │    JSONL    │    │   Directory     │ │
//! │  │ (in-memory) │    │   (audit)   │    │ (argon2 users)  │ │
//! │  └─────────────┘    └─────────────┘    └─────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tellerbank_persistence::{AccountRepository, JsonlAuditSink};
//!
//! let mut repo = AccountRepository::new();
//! let id = repo.create(new_account);
//!
//! let audit = JsonlAuditSink::new("data/audit")?;
//! audit.record_transaction(&record)?;
//! ```

pub mod audit;
pub mod cipher;
pub mod directory;
pub mod error;
pub mod repository;

pub use audit::{AuditFilter, AuditReader, JsonlAuditSink, MemoryAuditSink, StoredAuditRecord};
pub use cipher::{CipherError, FieldCipher};
pub use directory::{hash_secret, DirectoryFile, DirectoryUser};
pub use error::{PersistenceError, PersistenceResult};
pub use repository::AccountRepository;
