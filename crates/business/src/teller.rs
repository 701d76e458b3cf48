//! Teller operations - open, close, query, lodge, withdraw
//!
//! Each operation validates input, resolves the account, applies the change
//! through the repository and writes exactly one transaction audit record
//! (plus an auth record for the admin approval on closure).

use crate::error::{BusinessError, BusinessResult};
use crate::services::ServiceContext;
use rust_decimal::Decimal;
use tellerbank_core::{
    requires_justification, validate_positive_amount, Account, AccountId, AuthRecord,
    Credentials, NewAccount, Outcome, TransactionKind, TransactionRecord,
};
use tellerbank_persistence::PersistenceError;
use tracing::{debug, info, warn};

/// Interactive steps of an account closure.
pub trait CloseApproval {
    /// Teller confirms the closure after seeing the account details
    fn confirm(&mut self, account: &Account) -> bool;

    /// Administrator credentials for the secondary authorization.
    /// `None` when nothing was supplied.
    fn admin_credentials(&mut self) -> Option<Credentials>;
}

/// Teller Service - account operations performed by a logged-in teller
pub struct TellerService<'a> {
    ctx: &'a mut ServiceContext,
    teller: &'a str,
}

impl<'a> TellerService<'a> {
    pub fn new(ctx: &'a mut ServiceContext, teller: &'a str) -> Self {
        Self { ctx, teller }
    }

    /// Amount at or above the disclosure threshold asks for a justification
    pub fn requires_justification(&self, amount: Decimal) -> bool {
        requires_justification(amount, self.ctx.config().disclosure_threshold)
    }

    /// Open a validated account, returns the new account number
    pub fn open_account(&mut self, new: NewAccount) -> BusinessResult<AccountId> {
        let account_type = new.kind.account_type();
        let holder_name = new.holder.name.clone();
        let opening_balance = new.opening_balance;

        let id = self.ctx.repository_mut().create(new);

        self.ctx.record_transaction(
            TransactionRecord::new(
                self.teller,
                &id.to_string(),
                &holder_name,
                TransactionKind::AccountCreation,
                Outcome::Success,
            )
            .with_amount(opening_balance)
            .with_extra(account_type.label()),
        );

        info!(account_id = %id, account_type = %account_type, teller = %self.teller, "account opened");
        Ok(id)
    }

    /// Parse the account number and look the account up.
    ///
    /// A malformed number or a missing account writes a FAIL record for `kind`
    /// with holder "Unknown" and amount 0.
    pub fn resolve_account(&self, raw_id: &str, kind: TransactionKind) -> BusinessResult<Account> {
        let id = match AccountId::parse(raw_id) {
            Ok(id) => id,
            Err(_) => {
                let err = BusinessError::InvalidAccountNumber(raw_id.trim().to_string());
                self.record_unresolved(raw_id, kind, &err);
                return Err(err);
            }
        };

        match self.ctx.repository().find(&id) {
            Ok(account) => {
                debug!(account_id = %id, "account resolved");
                Ok(account.clone())
            }
            Err(e) if e.is_not_found() => {
                let err = BusinessError::AccountNotFound(id.to_string());
                self.record_unresolved(&id.to_string(), kind, &err);
                Err(err)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Balance query
    pub fn query_account(&self, raw_id: &str) -> BusinessResult<Account> {
        let account = self.resolve_account(raw_id, TransactionKind::BalanceQuery)?;

        self.ctx.record_transaction(self.record_for(
            &account,
            TransactionKind::BalanceQuery,
            Outcome::Success,
        ));

        Ok(account)
    }

    /// Lodge funds, returns the new balance
    pub fn lodge(
        &mut self,
        raw_id: &str,
        amount: Decimal,
        reason: Option<&str>,
    ) -> BusinessResult<Decimal> {
        validate_positive_amount(amount)?;
        let account = self.resolve_account(raw_id, TransactionKind::Lodgement)?;

        let balance = self
            .ctx
            .repository_mut()
            .update(&account.id(), |acc| acc.lodge(amount))
            .map_err(rejected)?;

        self.ctx.record_transaction(
            self.record_for(&account, TransactionKind::Lodgement, Outcome::Success)
                .with_amount(amount)
                .with_reason(reason),
        );

        info!(account_id = %account.id(), %amount, %balance, "lodgement completed");
        Ok(balance)
    }

    /// Withdraw funds, returns the new balance.
    ///
    /// Fails with `InsufficientFunds` when `amount` exceeds the available funds;
    /// the balance is left unchanged.
    pub fn withdraw(
        &mut self,
        raw_id: &str,
        amount: Decimal,
        reason: Option<&str>,
    ) -> BusinessResult<Decimal> {
        validate_positive_amount(amount)?;
        let account = self.resolve_account(raw_id, TransactionKind::Withdrawal)?;

        let result = self
            .ctx
            .repository_mut()
            .update(&account.id(), |acc| acc.withdraw(amount))
            .map_err(rejected);

        match result {
            Ok(balance) => {
                self.ctx.record_transaction(
                    self.record_for(&account, TransactionKind::Withdrawal, Outcome::Success)
                        .with_amount(amount)
                        .with_reason(reason),
                );
                info!(account_id = %account.id(), %amount, %balance, "withdrawal completed");
                Ok(balance)
            }
            Err(err) => {
                if let Some(failure) = err.audit_reason() {
                    self.ctx.record_transaction(
                        self.record_for(&account, TransactionKind::Withdrawal, Outcome::Fail)
                            .with_amount(amount)
                            .with_reason(Some(failure)),
                    );
                    warn!(account_id = %account.id(), %amount, "withdrawal refused: {}", err);
                }
                Err(err)
            }
        }
    }

    /// Close an account after teller confirmation and administrator approval.
    ///
    /// Returns the removed account.
    pub fn close_account(
        &mut self,
        raw_id: &str,
        approval: &mut dyn CloseApproval,
    ) -> BusinessResult<Account> {
        let account = self.resolve_account(raw_id, TransactionKind::AccountClosure)?;

        if !approval.confirm(&account) {
            return Err(self.fail_closure(&account, BusinessError::ClosureCancelled));
        }

        let approver = match approval.admin_credentials() {
            Some(credentials) => self.authorize_admin(&credentials),
            None => {
                self.ctx
                    .record_auth(AuthRecord::new("", Outcome::Fail, "Admin approval failed"));
                None
            }
        };

        let Some(approver) = approver else {
            return Err(self.fail_closure(&account, BusinessError::AdminApprovalFailed));
        };

        let removed = self.ctx.repository_mut().remove(&account.id())?;

        self.ctx.record_transaction(
            self.record_for(&removed, TransactionKind::AccountClosure, Outcome::Success)
                .with_amount(removed.balance())
                .with_extra(&format!("ApprovedBy={}", approver)),
        );

        info!(account_id = %removed.id(), approved_by = %approver, "account closed");
        Ok(removed)
    }

    /// Returns the approving administrator's directory username
    fn authorize_admin(&self, credentials: &Credentials) -> Option<String> {
        let directory = self.ctx.authenticator();
        let admin_role = &self.ctx.config().admin_role;

        let approver = match directory.authenticate(&credentials.username, credentials.secret()) {
            Ok(principal) if directory.has_role(&principal, admin_role) => Some(principal.username),
            Ok(_) => None,
            Err(e) => {
                debug!(username = %credentials.username, error = %e, "admin bind failed");
                None
            }
        };

        match approver {
            Some(username) => {
                self.ctx
                    .record_auth(AuthRecord::new(&username, Outcome::Success, admin_role));
                Some(username)
            }
            None => {
                self.ctx.record_auth(AuthRecord::new(
                    &credentials.username,
                    Outcome::Fail,
                    "Admin approval failed",
                ));
                warn!(username = %credentials.username, "admin approval failed");
                None
            }
        }
    }

    fn fail_closure(&self, account: &Account, err: BusinessError) -> BusinessError {
        self.ctx.record_transaction(
            self.record_for(account, TransactionKind::AccountClosure, Outcome::Fail)
                .with_amount(account.balance())
                .with_reason(err.audit_reason()),
        );
        err
    }

    fn record_for(&self, account: &Account, kind: TransactionKind, outcome: Outcome) -> TransactionRecord {
        TransactionRecord::new(
            self.teller,
            &account.id().to_string(),
            account.holder_name(),
            kind,
            outcome,
        )
    }

    fn record_unresolved(&self, raw_id: &str, kind: TransactionKind, err: &BusinessError) {
        let reason = err.audit_reason().unwrap_or("Account not found");
        self.ctx
            .record_transaction(TransactionRecord::unresolved(self.teller, raw_id, kind, reason));
        warn!(account_id = %raw_id.trim(), kind = %kind, "{}", reason);
    }
}

/// Core rejections surface as business errors, not persistence wrappers
fn rejected(err: PersistenceError) -> BusinessError {
    match err {
        PersistenceError::Rejected(core) => core.into(),
        other => other.into(),
    }
}
