//! Interactive teller session: login, then the 1-6 menu loop.

use crate::console::{Console, ConsoleError, ConsoleResult};
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use tellerbank_business::{
    BusinessError, CloseApproval, CredentialPrompt, LoginFailure, ServiceContext, SessionService,
    TellerService,
};
use tellerbank_core::{
    is_valid_name, parse_amount, parse_non_negative, require_non_empty, validate_positive_amount,
    Account, AccountKind, AccountType, CoreError, CoreResult, Credentials, Holder, NewAccount,
    TransactionKind,
};
use tracing::{info, warn};

const MENU: &str = "
***Banking Menu***
1. Add Bank Account
2. Close Bank Account
3. View Account Information
4. Make Lodgement
5. Make Withdrawal
6. Exit";

/// How a console session finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Login attempts exhausted
    Refused,
    /// Teller chose Exit or input ended
    Completed { accounts: usize },
}

/// Log in, then serve the menu until Exit or end of input
pub fn run_session<R: BufRead, W: Write>(
    ctx: &mut ServiceContext,
    console: &mut Console<R, W>,
) -> ConsoleResult<SessionEnd> {
    let login = {
        let mut prompt = ConsoleLogin {
            console: &mut *console,
            error: None,
        };
        let result = SessionService::new(ctx).login(&mut prompt);
        match prompt.error {
            Some(ConsoleError::Closed) | None => result,
            Some(err) => return Err(err),
        }
    };

    let session = match login {
        Ok(session) => session,
        Err(e) => {
            warn!(error = %e, "teller session refused");
            console.say("Authentication failed. Exiting.")?;
            return Ok(SessionEnd::Refused);
        }
    };

    console.say(format!("Login successful! Welcome, {}.", session.principal()))?;
    let teller = session.teller_name().to_string();

    let mut menu = Menu {
        console: &mut *console,
        ctx: &mut *ctx,
        teller: teller.clone(),
    };
    match menu.run() {
        Ok(()) | Err(ConsoleError::Closed) => {}
        Err(e) => return Err(e),
    }

    let accounts = ctx.repository().len();
    info!(teller = %teller, accounts, "teller session ended");
    Ok(SessionEnd::Completed { accounts })
}

struct ConsoleLogin<'c, R, W> {
    console: &'c mut Console<R, W>,
    error: Option<ConsoleError>,
}

impl<R: BufRead, W: Write> ConsoleLogin<'_, R, W> {
    fn read_credentials(&mut self) -> ConsoleResult<Credentials> {
        let username = self.console.prompt("Enter your username:")?;
        let secret = self.console.prompt("Enter your password:")?;
        Ok(Credentials::new(&username, &secret))
    }
}

impl<R: BufRead, W: Write> CredentialPrompt for ConsoleLogin<'_, R, W> {
    fn next_credentials(&mut self, _attempt: u32, _max_attempts: u32) -> Option<Credentials> {
        match self.read_credentials() {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }

    fn report_failure(&mut self, failure: &LoginFailure) {
        let _ = self.console.say(failure);
    }
}

struct ConsoleApproval<'c, R, W> {
    console: &'c mut Console<R, W>,
    error: Option<ConsoleError>,
}

impl<R: BufRead, W: Write> ConsoleApproval<'_, R, W> {
    fn ask_confirmation(&mut self, account: &Account) -> ConsoleResult<bool> {
        self.console.say(account)?;
        loop {
            match self.console.prompt("Proceed With Deletion (Y/N)?")?.as_str() {
                "Y" | "y" => return Ok(true),
                "N" | "n" => return Ok(false),
                _ => self.console.say("INVALID OPTION CHOSEN - PLEASE TRY AGAIN")?,
            }
        }
    }

    fn ask_admin(&mut self) -> ConsoleResult<Credentials> {
        self.console.say("Admin approval required to delete account.")?;
        let username = self.console.prompt("Admin username:")?;
        let secret = self.console.prompt("Admin password:")?;
        Ok(Credentials::new(&username, &secret))
    }
}

impl<R: BufRead, W: Write> CloseApproval for ConsoleApproval<'_, R, W> {
    fn confirm(&mut self, account: &Account) -> bool {
        self.ask_confirmation(account).unwrap_or_else(|e| {
            self.error = Some(e);
            false
        })
    }

    fn admin_credentials(&mut self) -> Option<Credentials> {
        match self.ask_admin() {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }
}

struct Menu<'a, R, W> {
    console: &'a mut Console<R, W>,
    ctx: &'a mut ServiceContext,
    teller: String,
}

impl<R: BufRead, W: Write> Menu<'_, R, W> {
    fn run(&mut self) -> ConsoleResult<()> {
        loop {
            self.console.say(MENU)?;
            let choice = self.console.prompt("CHOOSE OPTION:")?;
            match choice.as_str() {
                "1" => self.add_account()?,
                "2" => self.close_account()?,
                "3" => self.view_account()?,
                "4" => self.lodge()?,
                "5" => self.withdraw()?,
                "6" => return Ok(()),
                _ => self.console.say("INVALID OPTION CHOSEN - PLEASE TRY AGAIN")?,
            }
        }
    }

    fn add_account(&mut self) -> ConsoleResult<()> {
        let account_type = self.console.prompt_until(
            "Select account type (1 = Current Account, 2 = Savings Account):",
            AccountType::from_menu_choice,
        )?;
        let name = self.console.prompt_until("Enter Name:", |s| {
            if is_valid_name(s) {
                Ok(s.to_string())
            } else {
                Err("Name must contain at least one letter")
            }
        })?;
        let line1 = self
            .console
            .prompt_until("Enter Address Line 1:", |s| require_non_empty("Address line 1", s))?;
        let line2 = self.console.prompt("Enter Address Line 2 (optional):")?;
        let line3 = self.console.prompt("Enter Address Line 3 (optional):")?;
        let town = self
            .console
            .prompt_until("Enter Town:", |s| require_non_empty("Town", s))?;
        let opening_balance = self
            .console
            .prompt_until("Enter Opening Balance:", parse_non_negative)?;

        let kind = match account_type {
            AccountType::Current => self.console.prompt_until("Enter Overdraft Limit:", |s| {
                parse_non_negative(s).and_then(AccountKind::current)
            })?,
            AccountType::Savings => self.console.prompt_until("Enter Interest Rate (%):", |s| {
                parse_non_negative(s).and_then(AccountKind::savings)
            })?,
        };

        let new = Holder::new(&name, &line1, &line2, &line3, &town)
            .and_then(|holder| NewAccount::new(holder, kind, opening_balance));
        let new = match new {
            Ok(new) => new,
            Err(e) => return self.console.say(format!("Account not created: {}", e)),
        };

        match TellerService::new(self.ctx, &self.teller).open_account(new) {
            Ok(id) => self.console.say(format!("New Account Number Is: {}", id)),
            Err(e) => report(self.console, &e),
        }
    }

    fn close_account(&mut self) -> ConsoleResult<()> {
        let raw_id = self.console.prompt("Enter Account Number:")?;

        let mut approval = ConsoleApproval {
            console: &mut *self.console,
            error: None,
        };
        let result = TellerService::new(self.ctx, &self.teller).close_account(&raw_id, &mut approval);
        if let Some(err) = approval.error {
            return Err(err);
        }

        match result {
            Ok(account) => self
                .console
                .say(format!("Account {} closed.", account.id())),
            Err(e) => report(self.console, &e),
        }
    }

    fn view_account(&mut self) -> ConsoleResult<()> {
        let raw_id = self.console.prompt("Enter Account Number:")?;

        match TellerService::new(self.ctx, &self.teller).query_account(&raw_id) {
            Ok(account) => {
                self.console.say(&account)?;
                if let Some(interest) = account.projected_annual_interest() {
                    self.console
                        .say(format!("Projected Annual Interest: {}", interest))?;
                }
                Ok(())
            }
            Err(e) => report(self.console, &e),
        }
    }

    fn lodge(&mut self) -> ConsoleResult<()> {
        let raw_id = self.console.prompt("Enter Account Number:")?;
        let mut teller = TellerService::new(self.ctx, &self.teller);

        let account = match teller.resolve_account(&raw_id, TransactionKind::Lodgement) {
            Ok(account) => account,
            Err(e) => return report(self.console, &e),
        };

        let balance = account.balance();
        let amount = self
            .console
            .prompt_until("Enter Amount To Lodge:", |text| lodgeable_amount(text, balance))?;
        let reason = ask_reason(self.console, teller.requires_justification(amount))?;

        match teller.lodge(&account.id().to_string(), amount, reason.as_deref()) {
            Ok(balance) => self
                .console
                .say(format!("Lodgement complete. New Balance: {}", balance)),
            Err(e) => report(self.console, &e),
        }
    }

    fn withdraw(&mut self) -> ConsoleResult<()> {
        let raw_id = self.console.prompt("Enter Account Number:")?;
        let mut teller = TellerService::new(self.ctx, &self.teller);

        let account = match teller.resolve_account(&raw_id, TransactionKind::Withdrawal) {
            Ok(account) => account,
            Err(e) => return report(self.console, &e),
        };

        self.console
            .say(format!("Available Funds: {}", account.available_funds()))?;
        let amount = self
            .console
            .prompt_until("Enter Amount To Withdraw:", positive_amount)?;
        let reason = ask_reason(self.console, teller.requires_justification(amount))?;

        match teller.withdraw(&account.id().to_string(), amount, reason.as_deref()) {
            Ok(balance) => self
                .console
                .say(format!("Withdrawal complete. New Balance: {}", balance)),
            Err(e) => report(self.console, &e),
        }
    }
}

fn positive_amount(text: &str) -> CoreResult<Decimal> {
    let amount = parse_amount(text)?;
    validate_positive_amount(amount)?;
    Ok(amount)
}

/// Positive amount that the current balance can absorb
fn lodgeable_amount(text: &str, balance: Decimal) -> CoreResult<Decimal> {
    let amount = positive_amount(text)?;
    balance
        .checked_add(amount)
        .map(|_| amount)
        .ok_or_else(|| CoreError::InvalidAmount(format!("amount too large: {}", amount)))
}

fn ask_reason<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    required: bool,
) -> ConsoleResult<Option<String>> {
    if !required {
        return Ok(None);
    }
    console.prompt_optional("Reason for transaction of this size (optional):")
}

fn report<R: BufRead, W: Write>(console: &mut Console<R, W>, err: &BusinessError) -> ConsoleResult<()> {
    let message = match err {
        BusinessError::InvalidAccountNumber(_) => "Invalid account number format.".to_string(),
        BusinessError::AccountNotFound(_) => "Account Does Not Exist".to_string(),
        BusinessError::InsufficientFunds { .. } => "Insufficient Funds Available".to_string(),
        BusinessError::ClosureCancelled => "Account not deleted.".to_string(),
        BusinessError::AdminApprovalFailed => {
            "Admin approval failed. Account not deleted.".to_string()
        }
        other => format!("Error: {}", other),
    };
    console.say(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Cursor;
    use std::sync::Arc;
    use tellerbank_business::BankConfig;
    use tellerbank_core::{AccountId, Outcome};
    use tellerbank_persistence::{DirectoryFile, DirectoryUser, MemoryAuditSink};

    const LOGIN: &str = "jdoe\nteller-pass\n";

    fn context() -> (ServiceContext, Arc<MemoryAuditSink>) {
        let sink = Arc::new(MemoryAuditSink::new());
        let directory = DirectoryFile::from_users(vec![
            DirectoryUser::new("jdoe", "teller-pass")
                .unwrap()
                .with_group("Bank Teller"),
            DirectoryUser::new("boss", "admin-pass")
                .unwrap()
                .with_group("Bank Teller Administrator"),
        ]);
        let ctx = ServiceContext::new(sink.clone(), Arc::new(directory), BankConfig::default());
        (ctx, sink)
    }

    fn seed_savings(ctx: &mut ServiceContext, balance: Decimal) -> AccountId {
        let holder = Holder::new("Alice Murphy", "1 Main Street", "", "", "Sligo").unwrap();
        let new = NewAccount::savings(holder, balance, dec!(2)).unwrap();
        ctx.repository_mut().create(new)
    }

    fn seed_current(ctx: &mut ServiceContext, balance: Decimal, overdraft: Decimal) -> AccountId {
        let holder = Holder::new("Bob Byrne", "2 High St", "", "", "Galway").unwrap();
        let new = NewAccount::current(holder, balance, overdraft).unwrap();
        ctx.repository_mut().create(new)
    }

    fn drive(ctx: &mut ServiceContext, script: &str) -> (SessionEnd, String) {
        let mut console = Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
        let end = run_session(ctx, &mut console).unwrap();
        (end, String::from_utf8(console.into_output()).unwrap())
    }

    #[test]
    fn test_login_refused_after_three_attempts() {
        let (mut ctx, sink) = context();
        let (end, out) = drive(&mut ctx, "jdoe\nx\njdoe\ny\njdoe\nz\n");

        assert_eq!(end, SessionEnd::Refused);
        assert!(out.contains("Authentication failed. Exiting."));
        assert_eq!(sink.auth_records().len(), 3);
    }

    #[test]
    fn test_add_current_account() {
        let (mut ctx, sink) = context();
        let script = format!(
            "{}1\n3\n1\n123\nBob Byrne\n\n2 High St\n\n\nGalway\n-5\n250\n100\n6\n",
            LOGIN
        );
        let (end, out) = drive(&mut ctx, &script);

        assert_eq!(end, SessionEnd::Completed { accounts: 1 });
        assert!(out.contains("New Account Number Is:"));
        assert!(out.contains("please try again"));

        let account = ctx.repository().list()[0].clone();
        assert_eq!(account.holder.name, "Bob Byrne");
        assert_eq!(account.holder.town, "Galway");
        assert_eq!(account.balance(), dec!(250));
        assert_eq!(account.overdraft_limit(), Some(dec!(100)));
        assert_eq!(
            sink.last_transaction().unwrap().kind,
            TransactionKind::AccountCreation
        );
    }

    #[test]
    fn test_large_lodgement_asks_for_reason() {
        let (mut ctx, sink) = context();
        let id = seed_savings(&mut ctx, dec!(0));
        let script = format!("{}4\n{}\n0\n15000\n\n6\n", LOGIN, id);
        let (_, out) = drive(&mut ctx, &script);

        assert!(out.contains("Reason for transaction"));
        assert!(out.contains("New Balance: 15000"));
        let record = sink.last_transaction().unwrap();
        assert_eq!(record.outcome, Outcome::Success);
        assert_eq!(record.reason, None);
    }

    #[test]
    fn test_small_lodgement_skips_reason() {
        let (mut ctx, _sink) = context();
        let id = seed_savings(&mut ctx, dec!(0));
        let script = format!("{}4\n{}\n50\n6\n", LOGIN, id);
        let (_, out) = drive(&mut ctx, &script);

        assert!(!out.contains("Reason for transaction"));
        assert!(out.contains("New Balance: 50"));
    }

    #[test]
    fn test_withdraw_insufficient_funds() {
        let (mut ctx, sink) = context();
        let id = seed_savings(&mut ctx, dec!(100));
        let script = format!("{}5\n{}\nabc\n500\n6\n", LOGIN, id);
        let (_, out) = drive(&mut ctx, &script);

        assert!(out.contains("Available Funds: 100"));
        assert!(out.contains("Insufficient Funds Available"));
        assert_eq!(ctx.repository().find(&id).unwrap().balance(), dec!(100));
        assert_eq!(sink.last_transaction().unwrap().outcome, Outcome::Fail);
    }

    #[test]
    fn test_large_withdrawal_asks_for_reason() {
        let (mut ctx, sink) = context();
        let id = seed_current(&mut ctx, dec!(0), dec!(50000));
        let script = format!("{}5\n{}\n15000\n\n6\n", LOGIN, id);
        let (_, out) = drive(&mut ctx, &script);

        assert!(out.contains("Available Funds: 50000"));
        assert!(out.contains("Reason for transaction"));
        assert!(out.contains("New Balance: -15000"));
        let record = sink.last_transaction().unwrap();
        assert_eq!(record.kind, TransactionKind::Withdrawal);
        assert_eq!(record.outcome, Outcome::Success);
        assert_eq!(record.reason, None);
    }

    #[test]
    fn test_small_withdrawal_skips_reason() {
        let (mut ctx, _sink) = context();
        let id = seed_current(&mut ctx, dec!(100), dec!(0));
        let script = format!("{}5\n{}\n40\n6\n", LOGIN, id);
        let (_, out) = drive(&mut ctx, &script);

        assert!(!out.contains("Reason for transaction"));
        assert!(out.contains("New Balance: 60"));
    }

    #[test]
    fn test_overflowing_lodgement_is_reprompted() {
        let (mut ctx, sink) = context();
        let id = seed_savings(&mut ctx, Decimal::MAX);
        let script = format!("{}4\n{}\n1\n", LOGIN, id);
        let (end, out) = drive(&mut ctx, &script);

        assert!(out.contains("amount too large"));
        assert!(out.contains("please try again"));
        assert!(!out.contains("Lodgement complete"));
        assert!(sink.transactions().is_empty());
        assert_eq!(ctx.repository().find(&id).unwrap().balance(), Decimal::MAX);
        assert_eq!(end, SessionEnd::Completed { accounts: 1 });
    }

    #[test]
    fn test_close_with_admin_approval() {
        let (mut ctx, _sink) = context();
        let id = seed_savings(&mut ctx, dec!(10));
        let script = format!("{}2\n{}\nmaybe\ny\nboss\nadmin-pass\n6\n", LOGIN, id);
        let (end, out) = drive(&mut ctx, &script);

        assert!(out.contains("INVALID OPTION CHOSEN"));
        assert!(out.contains("Admin approval required"));
        assert!(out.contains("closed."));
        assert_eq!(end, SessionEnd::Completed { accounts: 0 });
    }

    #[test]
    fn test_view_invalid_and_missing_account() {
        let (mut ctx, _sink) = context();
        let missing = AccountId::generate();
        let script = format!("{}3\n123\n3\n{}\n", LOGIN, missing);
        let (end, out) = drive(&mut ctx, &script);

        assert!(out.contains("Invalid account number format."));
        assert!(out.contains("Account Does Not Exist"));
        assert_eq!(end, SessionEnd::Completed { accounts: 0 });
    }

    #[test]
    fn test_view_shows_projected_interest() {
        let (mut ctx, _sink) = context();
        let id = seed_savings(&mut ctx, dec!(1000));
        let script = format!("{}3\n{}\n9\n6\n", LOGIN, id);
        let (_, out) = drive(&mut ctx, &script);

        assert!(out.contains("Interest Rate: 2%"));
        assert!(out.contains("Projected Annual Interest: 20"));
        assert!(out.contains("INVALID OPTION CHOSEN"));
    }
}
