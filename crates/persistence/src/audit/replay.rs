//! Audit Replay - read audit records from JSONL files
//!
//! Đọc audit records để xem lại và lọc theo account, teller, loại giao dịch.

use super::store::{file_name_for, is_audit_file};
use super::StoredAuditRecord;
use crate::cipher::FieldCipher;
use crate::error::{PersistenceError, PersistenceResult};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tellerbank_core::{AuditEntry, Outcome, TransactionKind};
use tracing::warn;

/// Audit Reader - đọc records từ files JSONL
pub struct AuditReader {
    base_path: PathBuf,
    cipher: Option<FieldCipher>,
}

impl AuditReader {
    /// Tạo reader mới
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            cipher: None,
        }
    }

    /// Giải mã field reason khi đọc
    pub fn with_cipher(mut self, cipher: FieldCipher) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Đọc tất cả records từ một file.
    ///
    /// Dòng hỏng (ghi dở, sai JSON) bị bỏ qua kèm warning.
    pub fn read_file(&self, file_path: &Path) -> PersistenceResult<Vec<StoredAuditRecord>> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut record: StoredAuditRecord = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(file = %file_path.display(), line = index + 1, error = %e, "skipping malformed audit line");
                    continue;
                }
            };
            self.reveal(&mut record);
            records.push(record);
        }

        Ok(records)
    }

    /// Đọc records theo ngày
    pub fn read_date(&self, date: NaiveDate) -> PersistenceResult<Vec<StoredAuditRecord>> {
        let file_path = self.base_path.join(file_name_for(date));
        if file_path.exists() {
            self.read_file(&file_path)
        } else {
            Ok(Vec::new())
        }
    }

    /// Đọc records trong khoảng ngày (YYYY-MM-DD, bao gồm hai đầu)
    pub fn read_range(&self, from: &str, to: &str) -> PersistenceResult<Vec<StoredAuditRecord>> {
        let from_date = parse_date(from)?;
        let to_date = parse_date(to)?;

        let mut all_records = Vec::new();
        let mut current = from_date;

        while current <= to_date {
            all_records.extend(self.read_date(current)?);
            match current.succ_opt() {
                Some(next) => current = next,
                None => break,
            }
        }

        Ok(all_records)
    }

    /// Đọc tất cả records
    pub fn read_all(&self) -> PersistenceResult<Vec<StoredAuditRecord>> {
        let mut all_records = Vec::new();

        if !self.base_path.exists() {
            return Ok(all_records);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.base_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_audit_file(p))
            .collect();

        files.sort();

        for file_path in files {
            all_records.extend(self.read_file(&file_path)?);
        }

        Ok(all_records)
    }

    fn reveal(&self, record: &mut StoredAuditRecord) {
        let (Some(cipher), AuditEntry::Transaction(tx)) = (&self.cipher, &mut record.entry) else {
            return;
        };
        if !tx.reason_encrypted {
            return;
        }
        let Some(reason) = tx.reason.as_deref() else {
            return;
        };

        match cipher.decrypt(reason) {
            Ok(plain) => {
                tx.reason = Some(plain);
                tx.reason_encrypted = false;
            }
            Err(e) => warn!(record_id = %record.record_id, error = %e, "cannot decrypt audit reason"),
        }
    }
}

fn parse_date(value: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| PersistenceError::Other(format!("Invalid date '{}': {}", value, e)))
}

/// Audit Filter - lọc records theo điều kiện
#[derive(Debug, Default, Clone)]
pub struct AuditFilter {
    /// Lọc theo số tài khoản
    pub account_id: Option<String>,
    /// Lọc theo teller (hoặc username với auth records)
    pub user: Option<String>,
    /// Lọc theo loại giao dịch (chỉ transaction records)
    pub kinds: Option<Vec<TransactionKind>>,
    /// Lọc theo kết quả
    pub outcome: Option<Outcome>,
    /// Chỉ lấy transaction records
    pub transactions_only: bool,
}

impl AuditFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(mut self, account_id: &str) -> Self {
        self.account_id = Some(account_id.to_string());
        self
    }

    pub fn user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn kinds(mut self, kinds: Vec<TransactionKind>) -> Self {
        self.kinds = Some(kinds);
        self
    }

    pub fn outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn transactions_only(mut self) -> Self {
        self.transactions_only = true;
        self
    }

    /// Kiểm tra record có match filter không
    pub fn matches(&self, record: &StoredAuditRecord) -> bool {
        if let Some(outcome) = self.outcome {
            if record.entry.outcome() != outcome {
                return false;
            }
        }

        match &record.entry {
            AuditEntry::Transaction(tx) => {
                if let Some(ref acc_id) = self.account_id {
                    if !tx.account_id.eq_ignore_ascii_case(acc_id) {
                        return false;
                    }
                }
                if let Some(ref user) = self.user {
                    if tx.teller != *user {
                        return false;
                    }
                }
                if let Some(ref kinds) = self.kinds {
                    if !kinds.contains(&tx.kind) {
                        return false;
                    }
                }
                true
            }
            AuditEntry::Auth(auth) => {
                if self.transactions_only || self.account_id.is_some() || self.kinds.is_some() {
                    return false;
                }
                if let Some(ref user) = self.user {
                    if auth.username != *user {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Lọc danh sách records
    pub fn apply(&self, records: Vec<StoredAuditRecord>) -> Vec<StoredAuditRecord> {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::JsonlAuditSink;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tellerbank_core::{AuditSink, AuthRecord, TransactionRecord};
    use tempfile::tempdir;

    const ACC: &str = "0b7e4f7e-3f0a-4c8e-9a51-0d3c2f1b9a10";

    fn seed(store: &JsonlAuditSink) {
        store
            .record_auth(&AuthRecord::new("teller1", Outcome::Success, "Bank Teller"))
            .unwrap();
        store
            .record_transaction(
                &TransactionRecord::new("teller1", ACC, "Alice", TransactionKind::Lodgement, Outcome::Success)
                    .with_amount(dec!(20000))
                    .with_reason(Some("Bonus")),
            )
            .unwrap();
        store
            .record_transaction(
                &TransactionRecord::new("teller1", ACC, "Alice", TransactionKind::Withdrawal, Outcome::Fail)
                    .with_amount(dec!(90000))
                    .with_reason(Some("Insufficient funds")),
            )
            .unwrap();
        store
            .record_transaction(&TransactionRecord::unresolved(
                "teller2",
                "garbage",
                TransactionKind::BalanceQuery,
                "Invalid account number format",
            ))
            .unwrap();
    }

    #[test]
    fn test_read_all() {
        let dir = tempdir().unwrap();
        let store = JsonlAuditSink::new(dir.path()).unwrap();
        seed(&store);
        store.flush().unwrap();

        let records = AuditReader::new(dir.path()).read_all().unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].record_id, "AUD_000001");

        let lodgement = records[1].entry.as_transaction().unwrap();
        assert_eq!(lodgement.amount, dec!(20000));
        assert_eq!(lodgement.reason.as_deref(), Some("Bonus"));
    }

    #[test]
    fn test_malformed_line_skipped() {
        let dir = tempdir().unwrap();
        let store = JsonlAuditSink::new(dir.path()).unwrap();
        seed(&store);
        store.flush().unwrap();

        let path = std::fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.path())
            .find(|p| is_audit_file(p))
            .unwrap();
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{\"record_id\":\"AUD_000005\",\"type\":").unwrap();
        writeln!(file, "not json").unwrap();

        let records = AuditReader::new(dir.path()).read_file(&path).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[3].record_id, "AUD_000004");
    }

    #[test]
    fn test_read_range_today() {
        let dir = tempdir().unwrap();
        let store = JsonlAuditSink::new(dir.path()).unwrap();
        seed(&store);
        store.flush().unwrap();

        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let records = AuditReader::new(dir.path())
            .read_range("2020-01-01", &today)
            .unwrap();
        assert_eq!(records.len(), 4);

        assert!(AuditReader::new(dir.path())
            .read_range("2020-01-01", "2020-01-05")
            .unwrap()
            .is_empty());
        assert!(AuditReader::new(dir.path()).read_range("yesterday", &today).is_err());
    }

    #[test]
    fn test_read_missing_dir() {
        let dir = tempdir().unwrap();
        let reader = AuditReader::new(dir.path().join("nope"));
        assert!(reader.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_reader_decrypts_reason() {
        let dir = tempdir().unwrap();
        let cipher = FieldCipher::from_hex(&FieldCipher::generate_key_hex()).unwrap();
        let store = JsonlAuditSink::new(dir.path())
            .unwrap()
            .with_cipher(cipher.clone());
        seed(&store);
        store.flush().unwrap();

        let locked = AuditReader::new(dir.path()).read_all().unwrap();
        let tx = locked[1].entry.as_transaction().unwrap();
        assert!(tx.reason_encrypted);
        assert_ne!(tx.reason.as_deref(), Some("Bonus"));

        let unlocked = AuditReader::new(dir.path())
            .with_cipher(cipher)
            .read_all()
            .unwrap();
        let tx = unlocked[1].entry.as_transaction().unwrap();
        assert!(!tx.reason_encrypted);
        assert_eq!(tx.reason.as_deref(), Some("Bonus"));
    }

    #[test]
    fn test_filters() {
        let dir = tempdir().unwrap();
        let store = JsonlAuditSink::new(dir.path()).unwrap();
        seed(&store);
        store.flush().unwrap();
        let records = AuditReader::new(dir.path()).read_all().unwrap();

        let by_account = AuditFilter::new().account(ACC).apply(records.clone());
        assert_eq!(by_account.len(), 2);

        let failures = AuditFilter::new().outcome(Outcome::Fail).apply(records.clone());
        assert_eq!(failures.len(), 2);

        let teller1 = AuditFilter::new().user("teller1").apply(records.clone());
        assert_eq!(teller1.len(), 3);

        let tx_only = AuditFilter::new().transactions_only().apply(records.clone());
        assert_eq!(tx_only.len(), 3);

        let lodgements = AuditFilter::new()
            .kinds(vec![TransactionKind::Lodgement])
            .apply(records);
        assert_eq!(lodgements.len(), 1);
    }
}
