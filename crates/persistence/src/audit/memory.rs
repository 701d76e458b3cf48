//! In-memory audit sink - giữ records trong RAM (test, dry-run).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tellerbank_core::{
    AuditEntry, AuditError, AuditResult, AuditSink, AuthRecord, TransactionRecord,
};

#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
    failing: AtomicBool,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink luôn trả lỗi - mô phỏng event log không ghi được
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.failing.store(true, Ordering::SeqCst);
        sink
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                AuditEntry::Transaction(record) => Some(record),
                AuditEntry::Auth(_) => None,
            })
            .collect()
    }

    pub fn auth_records(&self) -> Vec<AuthRecord> {
        self.entries()
            .into_iter()
            .filter_map(|entry| match entry {
                AuditEntry::Auth(record) => Some(record),
                AuditEntry::Transaction(_) => None,
            })
            .collect()
    }

    pub fn last_transaction(&self) -> Option<TransactionRecord> {
        self.transactions().pop()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, entry: AuditEntry) -> AuditResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AuditError::Unavailable("memory sink set to fail".to_string()));
        }
        self.entries
            .lock()
            .map_err(|_| AuditError::Unavailable("memory sink lock poisoned".to_string()))?
            .push(entry);
        Ok(())
    }
}

impl AuditSink for MemoryAuditSink {
    fn record_transaction(&self, record: &TransactionRecord) -> AuditResult<()> {
        self.push(AuditEntry::Transaction(record.clone()))
    }

    fn record_auth(&self, record: &AuthRecord) -> AuditResult<()> {
        self.push(AuditEntry::Auth(record.clone()))
    }
}
