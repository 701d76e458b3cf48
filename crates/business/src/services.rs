//! Service context shared by teller and session operations
//!
//! Owns the account repository and holds the collaborators (audit sink,
//! directory). Audit writes are best-effort: a failing sink is logged and
//! never aborts the banking operation.

use crate::config::BankConfig;
use std::sync::Arc;
use tellerbank_core::{
    AppMetadata, AuditSink, AuthRecord, Authenticator, MachineContext, TransactionRecord,
};
use tellerbank_persistence::AccountRepository;
use tracing::warn;

/// Context for business operations - repository plus collaborators
pub struct ServiceContext {
    repository: AccountRepository,
    audit: Arc<dyn AuditSink>,
    authenticator: Arc<dyn Authenticator>,
    config: BankConfig,
    machine: MachineContext,
    app: AppMetadata,
}

impl ServiceContext {
    /// Create new service context with an empty repository
    pub fn new(
        audit: Arc<dyn AuditSink>,
        authenticator: Arc<dyn Authenticator>,
        config: BankConfig,
    ) -> Self {
        let app = config.app_metadata();
        Self {
            repository: AccountRepository::new(),
            audit,
            authenticator,
            config,
            machine: MachineContext::detect(),
            app,
        }
    }

    /// Override detected machine context (tests, fixed terminals)
    pub fn with_machine(mut self, machine: MachineContext) -> Self {
        self.machine = machine;
        self
    }

    pub fn repository(&self) -> &AccountRepository {
        &self.repository
    }

    pub fn repository_mut(&mut self) -> &mut AccountRepository {
        &mut self.repository
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// Stamp machine/app metadata and hand the record to the sink
    pub fn record_transaction(&self, record: TransactionRecord) {
        let record = record
            .with_machine(self.machine.clone())
            .with_app(self.app.clone());
        if let Err(e) = self.audit.record_transaction(&record) {
            warn!(
                error = %e,
                kind = %record.kind,
                account_id = %record.account_id,
                outcome = %record.outcome,
                "failed to write transaction audit record"
            );
        }
    }

    /// Stamp machine/app metadata and hand the auth record to the sink
    pub fn record_auth(&self, record: AuthRecord) {
        let record = record
            .with_machine(self.machine.clone())
            .with_app(self.app.clone());
        if let Err(e) = self.audit.record_auth(&record) {
            warn!(
                error = %e,
                username = %record.username,
                outcome = %record.outcome,
                "failed to write auth audit record"
            );
        }
    }
}
