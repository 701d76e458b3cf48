//! Session login - teller authentication against the directory
//!
//! Up to `max_login_attempts` tries. A correct password without the teller
//! group still counts as a failed attempt. Every attempt is audited.

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use tellerbank_core::{AuthError, AuthRecord, Credentials, Outcome, Principal};
use tracing::{info, warn};

/// Source of login credentials (console, scripted tests)
pub trait CredentialPrompt {
    /// Credentials for attempt `attempt` of `max_attempts`; `None` ends the login
    fn next_credentials(&mut self, attempt: u32, max_attempts: u32) -> Option<Credentials>;

    /// Called after each rejected attempt
    fn report_failure(&mut self, _failure: &LoginFailure) {}
}

/// Why a single login attempt was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginFailure {
    InvalidCredentials,
    MissingRole(String),
    DirectoryUnavailable(String),
}

impl LoginFailure {
    /// Context string written to the auth audit record
    pub fn audit_context(&self) -> String {
        match self {
            Self::InvalidCredentials => "Invalid credentials".to_string(),
            Self::MissingRole(role) => format!("Not in {} group", role),
            Self::DirectoryUnavailable(_) => "Directory unavailable".to_string(),
        }
    }
}

impl std::fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Login failed."),
            Self::MissingRole(role) => write!(f, "You are not in the {} group.", role),
            Self::DirectoryUnavailable(msg) => write!(f, "Directory unavailable: {}", msg),
        }
    }
}

/// Authenticated teller
#[derive(Debug, Clone)]
pub struct TellerSession {
    principal: Principal,
}

impl TellerSession {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Name written as WHO_TELLER in audit records
    pub fn teller_name(&self) -> &str {
        &self.principal.username
    }
}

/// Session Service - handles teller login
pub struct SessionService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> SessionService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Single login attempt, audited
    pub fn attempt(&self, credentials: &Credentials) -> Result<Principal, LoginFailure> {
        let directory = self.ctx.authenticator();
        let teller_role = &self.ctx.config().teller_role;

        let result = match directory.authenticate(&credentials.username, credentials.secret()) {
            Ok(principal) if directory.has_role(&principal, teller_role) => Ok(principal),
            Ok(_) => Err(LoginFailure::MissingRole(teller_role.clone())),
            Err(AuthError::InvalidCredentials) => Err(LoginFailure::InvalidCredentials),
            Err(AuthError::Directory(msg)) => Err(LoginFailure::DirectoryUnavailable(msg)),
        };

        match &result {
            Ok(principal) => {
                self.ctx
                    .record_auth(AuthRecord::new(&principal.username, Outcome::Success, teller_role));
                info!(username = %principal.username, "teller logged in");
            }
            Err(failure) => {
                self.ctx.record_auth(AuthRecord::new(
                    &credentials.username,
                    Outcome::Fail,
                    &failure.audit_context(),
                ));
                warn!(username = %credentials.username, reason = %failure.audit_context(), "login refused");
            }
        }

        result
    }

    /// Prompt until a teller logs in or the attempts run out
    pub fn login(&self, prompt: &mut dyn CredentialPrompt) -> BusinessResult<TellerSession> {
        let max_attempts = self.ctx.config().max_login_attempts;
        let mut attempts = 0;

        for attempt in 1..=max_attempts {
            let Some(credentials) = prompt.next_credentials(attempt, max_attempts) else {
                break;
            };
            attempts = attempt;

            match self.attempt(&credentials) {
                Ok(principal) => return Ok(TellerSession { principal }),
                Err(failure) => prompt.report_failure(&failure),
            }
        }

        Err(BusinessError::AuthenticationFailed { attempts })
    }
}
