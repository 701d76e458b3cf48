//! JSONL Audit Store - append-only writer
//!
//! Ghi audit records vào files JSONL theo ngày: `audit-2026-01-25.jsonl`.

use super::StoredAuditRecord;
use crate::cipher::FieldCipher;
use crate::error::PersistenceResult;
use chrono::NaiveDate;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tellerbank_core::{
    AuditEntry, AuditError, AuditResult, AuditSink, AuthRecord, TransactionRecord,
};

pub(crate) const FILE_PREFIX: &str = "audit-";
pub(crate) const FILE_EXTENSION: &str = "jsonl";

pub(crate) fn file_name_for(date: NaiveDate) -> String {
    format!("{}{}.{}", FILE_PREFIX, date.format("%Y-%m-%d"), FILE_EXTENSION)
}

pub(crate) fn is_audit_file(path: &Path) -> bool {
    let has_ext = path.extension().map_or(false, |ext| ext == FILE_EXTENSION);
    let has_prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .map_or(false, |name| name.starts_with(FILE_PREFIX));
    has_ext && has_prefix
}

/// Audit Store - ghi audit records vào files JSONL.
pub struct JsonlAuditSink {
    /// Thư mục chứa audit files
    base_path: PathBuf,
    /// Counter cho record ID
    record_counter: AtomicU64,
    /// Current file writer (thread-safe)
    current_writer: Mutex<Option<AuditWriter>>,
    /// Mã hóa field `reason` nếu có key
    cipher: Option<FieldCipher>,
}

struct AuditWriter {
    date: NaiveDate,
    writer: BufWriter<File>,
}

impl JsonlAuditSink {
    /// Tạo store mới
    ///
    /// # Arguments
    /// * `base_path` - Đường dẫn thư mục chứa audit files (e.g., "data/audit")
    pub fn new<P: AsRef<Path>>(base_path: P) -> PersistenceResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        // Tạo thư mục nếu chưa có
        fs::create_dir_all(&base_path)?;

        // Đọc counter từ existing files
        let record_counter = Self::load_record_counter(&base_path)?;

        Ok(Self {
            base_path,
            record_counter: AtomicU64::new(record_counter),
            current_writer: Mutex::new(None),
            cipher: None,
        })
    }

    /// Bật mã hóa cho field reason
    pub fn with_cipher(mut self, cipher: FieldCipher) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Lấy base path
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Load record counter từ files hiện có
    fn load_record_counter(base_path: &Path) -> PersistenceResult<u64> {
        let mut max_id: u64 = 0;

        for entry in fs::read_dir(base_path)?.flatten() {
            let path = entry.path();
            if !is_audit_file(&path) {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            for line in content.lines() {
                if let Ok(record) = serde_json::from_str::<StoredAuditRecord>(line) {
                    if let Some(num) = record.sequence() {
                        max_id = max_id.max(num);
                    }
                }
            }
        }

        Ok(max_id + 1)
    }

    /// Generate record ID mới
    pub fn next_record_id(&self) -> String {
        let id = self.record_counter.fetch_add(1, Ordering::SeqCst);
        format!("AUD_{:06}", id)
    }

    /// Ghi entry vào store, trả về record ID
    pub fn append(&self, entry: AuditEntry) -> AuditResult<String> {
        let date = entry.timestamp().date_naive();
        let record = StoredAuditRecord {
            record_id: self.next_record_id(),
            entry,
        };
        let json = serde_json::to_string(&record)?;

        let mut guard = self
            .current_writer
            .lock()
            .map_err(|_| AuditError::Unavailable("audit writer lock poisoned".to_string()))?;

        // Kiểm tra cần mở file mới không
        let needs_new_file = guard.as_ref().map_or(true, |w| w.date != date);

        if needs_new_file {
            let path = self.base_path.join(file_name_for(date));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            *guard = Some(AuditWriter {
                date,
                writer: BufWriter::new(file),
            });
        }

        if let Some(ref mut w) = *guard {
            writeln!(w.writer, "{}", json)?;
            w.writer.flush()?;
        }

        Ok(record.record_id)
    }

    /// Lấy tất cả audit files, sắp xếp theo ngày
    pub fn list_files(&self) -> PersistenceResult<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = fs::read_dir(&self.base_path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| is_audit_file(p))
            .collect();

        files.sort();
        Ok(files)
    }

    /// Flush pending writes
    pub fn flush(&self) -> AuditResult<()> {
        let mut guard = self
            .current_writer
            .lock()
            .map_err(|_| AuditError::Unavailable("audit writer lock poisoned".to_string()))?;
        if let Some(ref mut w) = *guard {
            w.writer.flush()?;
        }
        Ok(())
    }

    fn protect(&self, record: &TransactionRecord) -> AuditResult<TransactionRecord> {
        let mut record = record.clone();
        if let (Some(cipher), Some(reason)) = (&self.cipher, record.reason.as_deref()) {
            let encrypted = cipher
                .encrypt(reason)
                .map_err(|e| AuditError::Encryption(e.to_string()))?;
            record.reason = Some(encrypted);
            record.reason_encrypted = true;
        }
        Ok(record)
    }
}

impl AuditSink for JsonlAuditSink {
    fn record_transaction(&self, record: &TransactionRecord) -> AuditResult<()> {
        let record = self.protect(record)?;
        self.append(AuditEntry::Transaction(record)).map(|_| ())
    }

    fn record_auth(&self, record: &AuthRecord) -> AuditResult<()> {
        self.append(AuditEntry::Auth(record.clone())).map(|_| ())
    }
}

impl Drop for JsonlAuditSink {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tellerbank_core::{Outcome, TransactionKind};
    use tempfile::tempdir;

    fn lodgement(reason: Option<&str>) -> TransactionRecord {
        TransactionRecord::new(
            "teller1",
            "0b7e4f7e-3f0a-4c8e-9a51-0d3c2f1b9a10",
            "Alice",
            TransactionKind::Lodgement,
            Outcome::Success,
        )
        .with_amount(dec!(15000))
        .with_reason(reason)
    }

    #[test]
    fn test_audit_store_append() {
        let dir = tempdir().unwrap();
        let store = JsonlAuditSink::new(dir.path()).unwrap();

        store.record_transaction(&lodgement(Some("Inheritance"))).unwrap();
        store
            .record_auth(&AuthRecord::new("teller1", Outcome::Success, "Bank Teller"))
            .unwrap();
        store.flush().unwrap();

        let files = store.list_files().unwrap();
        assert_eq!(files.len(), 1);

        let content = fs::read_to_string(&files[0]).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("AUD_000001"));
        assert!(lines[0].contains("lodgement"));
        assert!(lines[0].contains("Inheritance"));
        assert!(lines[1].contains("AUD_000002"));
        assert!(lines[1].contains("\"category\":\"auth\""));
    }

    #[test]
    fn test_audit_store_counter() {
        let dir = tempdir().unwrap();
        let store = JsonlAuditSink::new(dir.path()).unwrap();

        assert_eq!(store.next_record_id(), "AUD_000001");
        assert_eq!(store.next_record_id(), "AUD_000002");
    }

    #[test]
    fn test_audit_store_reload_counter() {
        let dir = tempdir().unwrap();

        {
            let store = JsonlAuditSink::new(dir.path()).unwrap();
            store.record_transaction(&lodgement(None)).unwrap();
            store.record_transaction(&lodgement(None)).unwrap();
        }

        {
            let store = JsonlAuditSink::new(dir.path()).unwrap();
            assert_eq!(store.next_record_id(), "AUD_000003");
        }
    }

    #[test]
    fn test_reason_encrypted_at_rest() {
        let dir = tempdir().unwrap();
        let cipher = FieldCipher::from_hex(&FieldCipher::generate_key_hex()).unwrap();
        let store = JsonlAuditSink::new(dir.path())
            .unwrap()
            .with_cipher(cipher.clone());

        store.record_transaction(&lodgement(Some("Sold my car"))).unwrap();
        store.flush().unwrap();

        let files = store.list_files().unwrap();
        let content = fs::read_to_string(&files[0]).unwrap();
        assert!(!content.contains("Sold my car"));

        let stored: StoredAuditRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        let record = stored.entry.as_transaction().unwrap();
        assert!(record.reason_encrypted);
        assert_eq!(
            cipher.decrypt(record.reason.as_deref().unwrap()).unwrap(),
            "Sold my car"
        );
        assert_eq!(record.amount, dec!(15000));
    }

    #[test]
    fn test_ignores_foreign_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("notes.jsonl"), "{\"record_id\":\"AUD_000099\"}\n").unwrap();

        let store = JsonlAuditSink::new(dir.path()).unwrap();
        assert_eq!(store.next_record_id(), "AUD_000001");
        assert!(store.list_files().unwrap().is_empty());
    }
}
