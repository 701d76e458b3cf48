//! Audit trail module
//!
//! Ghi và đọc audit records từ JSONL files.

pub mod memory;
pub mod replay;
pub mod store;

pub use memory::MemoryAuditSink;
pub use replay::{AuditFilter, AuditReader};
pub use store::JsonlAuditSink;

use serde::{Deserialize, Serialize};
use tellerbank_core::AuditEntry;

/// Một dòng trong file JSONL: record ID + entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuditRecord {
    /// AUD_000001, AUD_000002, ...
    pub record_id: String,
    pub entry: AuditEntry,
}

impl StoredAuditRecord {
    /// Parse số thứ tự từ record ID: AUD_000123 -> 123
    pub fn sequence(&self) -> Option<u64> {
        self.record_id
            .strip_prefix("AUD_")
            .and_then(|num| num.parse::<u64>().ok())
    }
}
