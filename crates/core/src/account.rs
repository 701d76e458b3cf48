//! # Account Module
//!
//! Định nghĩa Account - tài khoản ngân hàng của khách hàng.
//! Có hai loại: Current (có hạn mức thấu chi) và Savings (có lãi suất).
//! Số dư chỉ thay đổi qua `lodge` và `withdraw`.

use crate::error::{CoreError, CoreResult};
use crate::validation::{is_valid_name, require_non_empty, validate_positive_amount};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Số tài khoản - UUID v4, do repository cấp khi tạo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate ID ngẫu nhiên cho account mới
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse số tài khoản do teller nhập.
    ///
    /// Chỉ chấp nhận dạng UUID; mọi input khác bị từ chối trước khi tra cứu.
    pub fn parse(input: &str) -> CoreResult<Self> {
        let trimmed = input.trim();
        Uuid::try_parse(trimmed)
            .map(Self)
            .map_err(|_| CoreError::InvalidAccountNumber(trimmed.to_string()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for AccountId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for AccountId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Loại tài khoản mà teller chọn khi mở
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Tài khoản vãng lai - cho phép thấu chi
    Current,
    /// Tài khoản tiết kiệm - không được âm
    Savings,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Current => "current",
            AccountType::Savings => "savings",
        }
    }

    /// Menu "Account Types": 1 = Current, 2 = Savings
    pub fn from_menu_choice(choice: &str) -> CoreResult<Self> {
        match choice.trim() {
            "1" => Ok(AccountType::Current),
            "2" => Ok(AccountType::Savings),
            other => Err(CoreError::UnknownAccountType(other.to_string())),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Current => "Current Account",
            AccountType::Savings => "Savings Account",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Tham số riêng của từng loại tài khoản.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AccountKind {
    /// Hạn mức thấu chi >= 0
    Current { overdraft_limit: Decimal },
    /// Lãi suất (%/năm) >= 0
    Savings { interest_rate: Decimal },
}

impl AccountKind {
    pub fn current(overdraft_limit: Decimal) -> CoreResult<Self> {
        if overdraft_limit < Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "overdraft limit must not be negative: {}",
                overdraft_limit
            )));
        }
        Ok(AccountKind::Current { overdraft_limit })
    }

    pub fn savings(interest_rate: Decimal) -> CoreResult<Self> {
        if interest_rate < Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "interest rate must not be negative: {}",
                interest_rate
            )));
        }
        Ok(AccountKind::Savings { interest_rate })
    }

    pub fn account_type(&self) -> AccountType {
        match self {
            AccountKind::Current { .. } => AccountType::Current,
            AccountKind::Savings { .. } => AccountType::Savings,
        }
    }

    /// Số dư thấp nhất cho phép
    pub fn balance_floor(&self) -> Decimal {
        match self {
            AccountKind::Current { overdraft_limit } => -*overdraft_limit,
            AccountKind::Savings { .. } => Decimal::ZERO,
        }
    }
}

/// Thông tin chủ tài khoản
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holder {
    pub name: String,
    pub address_line1: String,
    /// Optional - có thể rỗng
    pub address_line2: String,
    /// Optional - có thể rỗng
    pub address_line3: String,
    pub town: String,
}

impl Holder {
    /// Tạo Holder đã validate: name có chữ cái, address line 1 và town không rỗng.
    pub fn new(
        name: &str,
        address_line1: &str,
        address_line2: &str,
        address_line3: &str,
        town: &str,
    ) -> CoreResult<Self> {
        let name = name.trim();
        if !is_valid_name(name) {
            return Err(CoreError::ValidationError(
                "name must contain at least one letter".to_string(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            address_line1: require_non_empty("Address line 1", address_line1)?,
            address_line2: address_line2.trim().to_string(),
            address_line3: address_line3.trim().to_string(),
            town: require_non_empty("Town", town)?,
        })
    }

    /// Các dòng địa chỉ không rỗng, theo thứ tự
    pub fn address_lines(&self) -> impl Iterator<Item = &str> {
        [
            self.address_line1.as_str(),
            self.address_line2.as_str(),
            self.address_line3.as_str(),
            self.town.as_str(),
        ]
        .into_iter()
        .filter(|line| !line.is_empty())
    }
}

/// Tài khoản đã validate nhưng chưa có ID (chưa insert vào repository).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub holder: Holder,
    pub kind: AccountKind,
    pub opening_balance: Decimal,
}

impl NewAccount {
    pub fn new(holder: Holder, kind: AccountKind, opening_balance: Decimal) -> CoreResult<Self> {
        if opening_balance < Decimal::ZERO {
            return Err(CoreError::InvalidAmount(format!(
                "opening balance must not be negative: {}",
                opening_balance
            )));
        }
        Ok(Self {
            holder,
            kind,
            opening_balance,
        })
    }

    pub fn current(
        holder: Holder,
        opening_balance: Decimal,
        overdraft_limit: Decimal,
    ) -> CoreResult<Self> {
        Self::new(holder, AccountKind::current(overdraft_limit)?, opening_balance)
    }

    pub fn savings(
        holder: Holder,
        opening_balance: Decimal,
        interest_rate: Decimal,
    ) -> CoreResult<Self> {
        Self::new(holder, AccountKind::savings(interest_rate)?, opening_balance)
    }
}

/// Tài khoản ngân hàng.
///
/// Invariant: `balance >= kind.balance_floor()` sau mọi thao tác.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    pub holder: Holder,
    pub kind: AccountKind,
    balance: Decimal,
    /// Thời gian mở
    pub opened_at: DateTime<Utc>,
}

impl Account {
    /// Gắn ID cho tài khoản mới
    pub fn open(id: AccountId, new: NewAccount) -> Self {
        Self {
            id,
            holder: new.holder,
            kind: new.kind,
            balance: new.opening_balance,
            opened_at: Utc::now(),
        }
    }

    pub fn id(&self) -> AccountId {
        self.id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn account_type(&self) -> AccountType {
        self.kind.account_type()
    }

    pub fn holder_name(&self) -> &str {
        &self.holder.name
    }

    pub fn overdraft_limit(&self) -> Option<Decimal> {
        match self.kind {
            AccountKind::Current { overdraft_limit } => Some(overdraft_limit),
            AccountKind::Savings { .. } => None,
        }
    }

    pub fn interest_rate(&self) -> Option<Decimal> {
        match self.kind {
            AccountKind::Savings { interest_rate } => Some(interest_rate),
            AccountKind::Current { .. } => None,
        }
    }

    /// Số tiền có thể rút: balance + overdraft (Current) hoặc balance (Savings).
    ///
    /// Bão hòa tại `Decimal::MAX`.
    pub fn available_funds(&self) -> Decimal {
        self.balance.saturating_sub(self.kind.balance_floor())
    }

    /// Tiền lãi dự kiến trong một năm với số dư hiện tại (chỉ Savings).
    ///
    /// Chỉ để hiển thị, không thay đổi balance. Tràn số thì bão hòa tại `Decimal::MAX`.
    pub fn projected_annual_interest(&self) -> Option<Decimal> {
        self.interest_rate().map(|rate| {
            if self.balance <= Decimal::ZERO {
                return Decimal::ZERO;
            }
            self.balance
                .checked_mul(rate)
                .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                .unwrap_or_else(|| (self.balance / Decimal::ONE_HUNDRED).saturating_mul(rate))
                .round_dp(2)
        })
    }

    /// Nạp tiền. Trả về balance mới.
    pub fn lodge(&mut self, amount: Decimal) -> CoreResult<Decimal> {
        validate_positive_amount(amount)?;
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| CoreError::InvalidAmount(format!("amount too large: {}", amount)))?;
        Ok(self.balance)
    }

    /// Rút tiền. Trả về balance mới.
    ///
    /// Available funds được tính lại mỗi lần gọi; không đủ thì balance giữ nguyên.
    pub fn withdraw(&mut self, amount: Decimal) -> CoreResult<Decimal> {
        validate_positive_amount(amount)?;
        let available = self.available_funds();
        if amount > available {
            return Err(CoreError::insufficient_funds(amount, available));
        }
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| CoreError::InvalidAmount(format!("amount too large: {}", amount)))?;
        Ok(self.balance)
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Account No: {}", self.id)?;
        writeln!(f, "Type: {}", self.account_type())?;
        writeln!(f, "Name: {}", self.holder.name)?;
        let address: Vec<&str> = self.holder.address_lines().collect();
        writeln!(f, "Address: {}", address.join(", "))?;
        writeln!(f, "Balance: {}", self.balance)?;
        match self.kind {
            AccountKind::Current { overdraft_limit } => {
                writeln!(f, "Overdraft Limit: {}", overdraft_limit)?
            }
            AccountKind::Savings { interest_rate } => {
                writeln!(f, "Interest Rate: {}%", interest_rate)?
            }
        }
        write!(f, "Available Funds: {}", self.available_funds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holder() -> Holder {
        Holder::new("Alice Murphy", "1 Main Street", "", "", "Sligo").unwrap()
    }

    fn current(balance: Decimal, overdraft: Decimal) -> Account {
        let new = NewAccount::current(holder(), balance, overdraft).unwrap();
        Account::open(AccountId::generate(), new)
    }

    fn savings(balance: Decimal, rate: Decimal) -> Account {
        let new = NewAccount::savings(holder(), balance, rate).unwrap();
        Account::open(AccountId::generate(), new)
    }

    #[test]
    fn test_account_id_parse() {
        let id = AccountId::generate();
        let parsed = AccountId::parse(&format!("  {}  ", id)).unwrap();
        assert_eq!(parsed, id);

        assert!(AccountId::parse("").is_err());
        assert!(AccountId::parse("ACC_001").is_err());
        assert!(AccountId::parse("12345").is_err());
    }

    #[test]
    fn test_account_type_menu_choice() {
        assert_eq!(AccountType::from_menu_choice("1").unwrap(), AccountType::Current);
        assert_eq!(AccountType::from_menu_choice(" 2 ").unwrap(), AccountType::Savings);
        assert!(AccountType::from_menu_choice("3").is_err());
        assert!(AccountType::from_menu_choice("").is_err());
    }

    #[test]
    fn test_holder_validation() {
        assert!(Holder::new("123", "1 Main St", "", "", "Sligo").is_err());
        assert!(Holder::new("Bob", " ", "", "", "Sligo").is_err());
        assert!(Holder::new("Bob", "1 Main St", "", "", "").is_err());

        let h = Holder::new(" Bob ", "1 Main St", " Apt 2 ", "", "Sligo").unwrap();
        assert_eq!(h.name, "Bob");
        assert_eq!(h.address_line2, "Apt 2");
        assert_eq!(h.address_lines().count(), 3);
    }

    #[test]
    fn test_new_account_rejects_negative_parameters() {
        assert!(NewAccount::current(holder(), dec!(-1), dec!(0)).is_err());
        assert!(NewAccount::current(holder(), dec!(0), dec!(-50)).is_err());
        assert!(NewAccount::savings(holder(), dec!(0), dec!(-0.5)).is_err());
        assert!(NewAccount::savings(holder(), dec!(0), dec!(0)).is_ok());
    }

    #[test]
    fn test_available_funds() {
        assert_eq!(current(dec!(100), dec!(50)).available_funds(), dec!(150));
        assert_eq!(savings(dec!(100), dec!(2)).available_funds(), dec!(100));
    }

    #[test]
    fn test_current_account_overdraft_scenario() {
        let mut account = current(dec!(100), dec!(50));

        assert_eq!(account.withdraw(dec!(120)).unwrap(), dec!(-20));
        assert_eq!(account.available_funds(), dec!(30));

        let err = account.withdraw(dec!(40)).unwrap_err();
        assert_eq!(err, CoreError::insufficient_funds(dec!(40), dec!(30)));
        assert_eq!(account.balance(), dec!(-20));
    }

    #[test]
    fn test_savings_account_scenario() {
        let mut account = savings(dec!(0), dec!(1.5));

        assert!(account.withdraw(dec!(1)).unwrap_err().is_insufficient_funds());
        assert_eq!(account.lodge(dec!(500)).unwrap(), dec!(500));
        assert_eq!(account.withdraw(dec!(500)).unwrap(), dec!(0));
        assert_eq!(account.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_non_positive_amounts_leave_balance_unchanged() {
        let mut account = current(dec!(100), dec!(0));

        assert!(account.lodge(dec!(0)).is_err());
        assert!(account.lodge(dec!(-5)).is_err());
        assert!(account.withdraw(dec!(0)).is_err());
        assert!(account.withdraw(dec!(-5)).is_err());
        assert_eq!(account.balance(), dec!(100));
    }

    #[test]
    fn test_balance_never_below_floor() {
        let mut account = current(dec!(10), dec!(25));
        let amounts = [dec!(7), dec!(30), dec!(1), dec!(12.5), dec!(4), dec!(100)];

        for amount in amounts {
            let _ = account.withdraw(amount);
            assert!(account.balance() >= dec!(-25));
            let _ = account.lodge(amount / dec!(4));
            assert!(account.balance() >= dec!(-25));
        }
    }

    #[test]
    fn test_projected_interest() {
        assert_eq!(
            savings(dec!(1000), dec!(2.5)).projected_annual_interest(),
            Some(dec!(25.00))
        );
        assert_eq!(current(dec!(1000), dec!(0)).projected_annual_interest(), None);
    }

    #[test]
    fn test_extreme_overdraft_saturates() {
        let mut account = current(Decimal::MAX, Decimal::MAX);
        assert_eq!(account.available_funds(), Decimal::MAX);
        assert!(account.to_string().contains("Available Funds"));

        assert_eq!(account.withdraw(dec!(1)).unwrap(), Decimal::MAX - dec!(1));
        assert_eq!(account.withdraw(Decimal::MAX).unwrap(), dec!(-1));
        assert_eq!(account.available_funds(), Decimal::MAX - dec!(1));
    }

    #[test]
    fn test_projected_interest_large_values() {
        let balance = Decimal::from_i128_with_scale(10i128.pow(28), 0);
        assert_eq!(
            savings(balance, dec!(100)).projected_annual_interest(),
            Some(balance)
        );
        assert_eq!(
            savings(Decimal::MAX, Decimal::MAX).projected_annual_interest(),
            Some(Decimal::MAX)
        );
    }

    #[test]
    fn test_account_display() {
        let account = current(dec!(100), dec!(50));
        let text = account.to_string();

        assert!(text.contains(&account.id().to_string()));
        assert!(text.contains("Current Account"));
        assert!(text.contains("Alice Murphy"));
        assert!(text.contains("1 Main Street, Sligo"));
        assert!(text.contains("Available Funds: 150"));
    }
}
