//! # Tellerbank Business
//!
//! Business logic layer - teller operations (open, close, query, lodge, withdraw),
//! session login against the directory, and runtime configuration.

pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod teller;

pub use config::BankConfig;
pub use error::{BusinessError, BusinessResult};
pub use services::ServiceContext;
pub use session::{CredentialPrompt, LoginFailure, SessionService, TellerSession};
pub use teller::{CloseApproval, TellerService};
