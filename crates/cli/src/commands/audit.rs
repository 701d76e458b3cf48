//! Audit viewer - read the JSONL audit trail with filters

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::Path;
use tellerbank_business::BankConfig;
use tellerbank_core::{AuditEntry, Outcome, TransactionKind};
use tellerbank_persistence::{AuditFilter, AuditReader, FieldCipher, StoredAuditRecord};

use crate::OutcomeArg;

/// Audit query options from the command line
#[derive(Debug, Default)]
pub struct AuditQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub account: Option<String>,
    pub teller: Option<String>,
    pub kinds: Option<Vec<String>>,
    pub outcome: Option<OutcomeArg>,
    pub transactions_only: bool,
}

/// Print matching audit records and a summary
pub fn run_audit(config_path: Option<&Path>, audit_dir: &Path, query: AuditQuery) -> Result<()> {
    let config = BankConfig::load(config_path).context("Failed to load configuration")?;
    let filter = build_filter(&query)?;

    let mut reader = AuditReader::new(audit_dir);
    if let Some(cipher) = FieldCipher::from_env(&config.encryption_key_env)
        .with_context(|| format!("Invalid key in {}", config.encryption_key_env))?
    {
        reader = reader.with_cipher(cipher);
    }

    let records = match (&query.from, &query.to) {
        (Some(from), Some(to)) => reader.read_range(from, to)?,
        (Some(from), None) => {
            let today = Utc::now().format("%Y-%m-%d").to_string();
            reader.read_range(from, &today)?
        }
        _ => reader.read_all()?,
    };
    let records = filter.apply(records);

    println!("Audit trail: {}", audit_dir.display());
    if let Some(from) = &query.from {
        println!("   From: {}", from);
    }
    if let Some(to) = &query.to {
        println!("   To: {}", to);
    }
    if let Some(account) = &query.account {
        println!("   Account: {}", account);
    }
    println!();

    if records.is_empty() {
        println!("No audit records found matching criteria.");
        return Ok(());
    }

    for record in &records {
        println!("{} {}", record.record_id, record.entry);
    }

    println!();
    println!("{}", summary_text(&records));
    Ok(())
}

fn build_filter(query: &AuditQuery) -> Result<AuditFilter> {
    let mut filter = AuditFilter::new();
    if let Some(account) = &query.account {
        filter = filter.account(account);
    }
    if let Some(teller) = &query.teller {
        filter = filter.user(teller);
    }
    if let Some(kinds) = &query.kinds {
        filter = filter.kinds(parse_kinds(kinds)?);
    }
    if let Some(outcome) = query.outcome {
        filter = filter.outcome(outcome.to_core());
    }
    if query.transactions_only {
        filter = filter.transactions_only();
    }
    Ok(filter)
}

fn parse_kinds(kinds: &[String]) -> Result<Vec<TransactionKind>> {
    kinds
        .iter()
        .map(|k| {
            TransactionKind::from_str(k).with_context(|| format!("Unknown transaction kind: {}", k))
        })
        .collect()
}

/// Counts per outcome and per transaction kind
fn summary_text(records: &[StoredAuditRecord]) -> String {
    let total = records.len();
    let success = records
        .iter()
        .filter(|r| r.entry.outcome() == Outcome::Success)
        .count();

    let mut by_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut auth = 0;
    for record in records {
        match &record.entry {
            AuditEntry::Transaction(tx) => *by_kind.entry(tx.kind.label()).or_default() += 1,
            AuditEntry::Auth(_) => auth += 1,
        }
    }

    let mut text = format!(
        "Summary: {} record(s), {} SUCCESS, {} FAIL",
        total,
        success,
        total - success
    );
    for (kind, count) in by_kind {
        text.push_str(&format!("\n   {}: {}", kind, count));
    }
    if auth > 0 {
        text.push_str(&format!("\n   Authentication: {}", auth));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellerbank_core::{AuthRecord, TransactionRecord};

    fn stored(id: u64, entry: AuditEntry) -> StoredAuditRecord {
        StoredAuditRecord {
            record_id: format!("AUD_{:06}", id),
            entry,
        }
    }

    #[test]
    fn test_parse_kinds() {
        let kinds = parse_kinds(&["lodgement".to_string(), "Account Closure".to_string()]).unwrap();
        assert_eq!(
            kinds,
            vec![TransactionKind::Lodgement, TransactionKind::AccountClosure]
        );
        assert!(parse_kinds(&["transfer".to_string()]).is_err());
    }

    #[test]
    fn test_summary_text() {
        let records = vec![
            stored(
                1,
                AuditEntry::Auth(AuthRecord::new("jdoe", Outcome::Success, "Bank Teller")),
            ),
            stored(
                2,
                AuditEntry::Transaction(TransactionRecord::new(
                    "jdoe",
                    "acc",
                    "Alice",
                    TransactionKind::Lodgement,
                    Outcome::Success,
                )),
            ),
            stored(
                3,
                AuditEntry::Transaction(TransactionRecord::unresolved(
                    "jdoe",
                    "bad",
                    TransactionKind::Withdrawal,
                    "Invalid account number format",
                )),
            ),
        ];

        let text = summary_text(&records);
        assert!(text.contains("3 record(s), 2 SUCCESS, 1 FAIL"));
        assert!(text.contains("Lodgement: 1"));
        assert!(text.contains("Withdrawal: 1"));
        assert!(text.contains("Authentication: 1"));
    }

    #[test]
    fn test_build_filter() {
        let query = AuditQuery {
            account: Some("acc".to_string()),
            outcome: Some(OutcomeArg::Fail),
            transactions_only: true,
            ..Default::default()
        };
        let filter = build_filter(&query).unwrap();
        assert_eq!(filter.account_id.as_deref(), Some("acc"));
        assert_eq!(filter.outcome, Some(Outcome::Fail));
        assert!(filter.transactions_only);
    }
}
