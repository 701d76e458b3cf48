//! # Audit Module
//!
//! Định nghĩa audit records cho mọi giao dịch và lần đăng nhập, cùng trait
//! `AuditSink` mà persistence implement.
//!
//! Record trả lời: WHO (teller, chủ tài khoản), WHAT (loại giao dịch, số tiền,
//! kết quả), WHERE (máy), WHEN (UTC), WHY (lý do >= ngưỡng), HOW (app metadata).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Holder name dùng khi không tra được tài khoản
pub const UNKNOWN_HOLDER: &str = "Unknown";

/// Loại giao dịch được audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    AccountCreation,
    AccountClosure,
    BalanceQuery,
    Lodgement,
    Withdrawal,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::AccountCreation => "account_creation",
            TransactionKind::AccountClosure => "account_closure",
            TransactionKind::BalanceQuery => "balance_query",
            TransactionKind::Lodgement => "lodgement",
            TransactionKind::Withdrawal => "withdrawal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "account_creation" => Some(TransactionKind::AccountCreation),
            "account_closure" => Some(TransactionKind::AccountClosure),
            "balance_query" => Some(TransactionKind::BalanceQuery),
            "lodgement" => Some(TransactionKind::Lodgement),
            "withdrawal" => Some(TransactionKind::Withdrawal),
            _ => None,
        }
    }

    /// Tên hiển thị trong log ("Account Creation", "Lodgement", ...)
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::AccountCreation => "Account Creation",
            TransactionKind::AccountClosure => "Account Closure",
            TransactionKind::BalanceQuery => "Balance Query",
            TransactionKind::Lodgement => "Lodgement",
            TransactionKind::Withdrawal => "Withdrawal",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Kết quả giao dịch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Success,
    Fail,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "SUCCESS",
            Outcome::Fail => "FAIL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SUCCESS" => Some(Outcome::Success),
            "FAIL" => Some(Outcome::Fail),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl From<bool> for Outcome {
    fn from(ok: bool) -> Self {
        if ok {
            Outcome::Success
        } else {
            Outcome::Fail
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Thông tin máy thực hiện giao dịch (WHERE).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineContext {
    /// Hostname
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// OS user đang chạy ứng dụng
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_user: Option<String>,
}

impl MachineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Đọc hostname / user từ environment; thiếu thì để None.
    pub fn detect() -> Self {
        let from_env = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| std::env::var(key).ok())
                .find(|value| !value.trim().is_empty())
        };

        Self {
            host: from_env(&["HOSTNAME", "COMPUTERNAME"]),
            os_user: from_env(&["USER", "USERNAME"]),
        }
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    pub fn with_os_user(mut self, user: &str) -> Self {
        self.os_user = Some(user.to_string());
        self
    }
}

impl fmt::Display for MachineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Machine={}; User={}",
            self.host.as_deref().unwrap_or("unknown"),
            self.os_user.as_deref().unwrap_or("unknown")
        )
    }
}

/// Metadata ứng dụng (HOW)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppMetadata {
    pub name: String,
    pub version: String,
}

impl AppMetadata {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
        }
    }
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self::new("Tellerbank", env!("CARGO_PKG_VERSION"))
    }
}

/// Audit record cho một giao dịch (thành công hoặc thất bại).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Thời điểm xảy ra (UTC)
    pub timestamp: DateTime<Utc>,
    /// Teller thực hiện
    pub teller: String,
    /// Số tài khoản như teller nhập (có thể không hợp lệ)
    pub account_id: String,
    /// Tên chủ tài khoản, "Unknown" nếu không tra được
    pub holder_name: String,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub outcome: Outcome,
    /// Lý do giao dịch lớn hoặc lý do thất bại
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// `reason` đã được mã hóa bởi audit store
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub reason_encrypted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    #[serde(default)]
    pub machine: MachineContext,
    pub app: AppMetadata,
}

impl TransactionRecord {
    /// Tạo record mới, amount = 0, chưa có reason
    pub fn new(
        teller: &str,
        account_id: &str,
        holder_name: &str,
        kind: TransactionKind,
        outcome: Outcome,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            teller: teller.to_string(),
            account_id: account_id.to_string(),
            holder_name: holder_name.to_string(),
            kind,
            amount: Decimal::ZERO,
            outcome,
            reason: None,
            reason_encrypted: false,
            extra: None,
            machine: MachineContext::default(),
            app: AppMetadata::default(),
        }
    }

    // === Builder methods ===

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = amount;
        self
    }

    /// Reason rỗng hoặc toàn khoảng trắng được bỏ qua
    pub fn with_reason(mut self, reason: Option<&str>) -> Self {
        self.reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_extra(mut self, extra: &str) -> Self {
        self.extra = Some(extra.to_string());
        self
    }

    pub fn with_machine(mut self, machine: MachineContext) -> Self {
        self.machine = machine;
        self
    }

    pub fn with_app(mut self, app: AppMetadata) -> Self {
        self.app = app;
        self
    }

    // === Factory methods ===

    /// Record FAIL khi không tra được tài khoản (sai format hoặc không tồn tại).
    ///
    /// Số tài khoản rỗng (kể cả chỉ có khoảng trắng) được ghi là `Invalid`.
    pub fn unresolved(teller: &str, raw_account_id: &str, kind: TransactionKind, reason: &str) -> Self {
        let account_id = if raw_account_id.trim().is_empty() {
            "Invalid"
        } else {
            raw_account_id.trim()
        };
        Self::new(teller, account_id, UNKNOWN_HOLDER, kind, Outcome::Fail).with_reason(Some(reason))
    }
}

impl fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WHO_TELLER={}; WHO_ACCOUNT={}({}); WHAT={}; AMOUNT={}; STATUS={}; WHERE={}; WHEN={}; Reason={}; HOW=App={}; Version={}",
            self.teller,
            self.holder_name,
            self.account_id,
            self.kind,
            self.amount,
            self.outcome,
            self.machine,
            self.timestamp.to_rfc3339(),
            self.reason.as_deref().unwrap_or("N/A"),
            self.app.name,
            self.app.version,
        )?;
        if let Some(extra) = &self.extra {
            write!(f, "; EXTRA={}", extra)?;
        }
        Ok(())
    }
}

/// Audit record cho một lần xác thực (đăng nhập teller hoặc admin phê duyệt).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    pub timestamp: DateTime<Utc>,
    pub username: String,
    pub outcome: Outcome,
    /// Role được xác nhận hoặc lý do thất bại
    pub context: String,
    #[serde(default)]
    pub machine: MachineContext,
    pub app: AppMetadata,
}

impl AuthRecord {
    pub fn new(username: &str, outcome: Outcome, context: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            username: username.to_string(),
            outcome,
            context: context.to_string(),
            machine: MachineContext::default(),
            app: AppMetadata::default(),
        }
    }

    pub fn with_machine(mut self, machine: MachineContext) -> Self {
        self.machine = machine;
        self
    }

    pub fn with_app(mut self, app: AppMetadata) -> Self {
        self.app = app;
        self
    }
}

impl fmt::Display for AuthRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AUTH_USER={}; OUTCOME={}; CONTEXT={}; WHERE={}; WHEN={}; APP={}",
            self.username,
            self.outcome,
            self.context,
            self.machine,
            self.timestamp.to_rfc3339(),
            self.app.name
        )
    }
}

/// Một dòng trong audit log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum AuditEntry {
    Transaction(TransactionRecord),
    Auth(AuthRecord),
}

impl AuditEntry {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            AuditEntry::Transaction(record) => record.timestamp,
            AuditEntry::Auth(record) => record.timestamp,
        }
    }

    pub fn outcome(&self) -> Outcome {
        match self {
            AuditEntry::Transaction(record) => record.outcome,
            AuditEntry::Auth(record) => record.outcome,
        }
    }

    pub fn as_transaction(&self) -> Option<&TransactionRecord> {
        match self {
            AuditEntry::Transaction(record) => Some(record),
            AuditEntry::Auth(_) => None,
        }
    }
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEntry::Transaction(record) => write!(f, "{}", record),
            AuditEntry::Auth(record) => write!(f, "{}", record),
        }
    }
}

/// Lỗi của audit sink. Core chỉ log, không bao giờ abort giao dịch vì lỗi này.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Audit encryption error: {0}")]
    Encryption(String),

    #[error("Audit sink unavailable: {0}")]
    Unavailable(String),
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Đích nhận audit records (file JSONL, memory, ...).
///
/// Implementations phải tự xử lý lỗi nội bộ; caller coi mọi lời gọi là best-effort.
pub trait AuditSink: Send + Sync {
    fn record_transaction(&self, record: &TransactionRecord) -> AuditResult<()>;

    fn record_auth(&self, record: &AuthRecord) -> AuditResult<()>;
}
