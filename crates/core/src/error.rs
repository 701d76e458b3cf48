//! # Error Module
//!
//! Định nghĩa các domain errors cho Tellerbank sử dụng thiserror.

use rust_decimal::Decimal;
use thiserror::Error;

/// Core domain errors.
///
/// Các lỗi nghiệp vụ cốt lõi, không liên quan đến infrastructure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // === Money errors ===
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // === Account errors ===
    #[error("Invalid account number format: {0}")]
    InvalidAccountNumber(String),

    #[error("Unknown account type: {0}")]
    UnknownAccountType(String),

    // === Validation errors ===
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Result type alias với CoreError
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Tạo InsufficientFunds error
    pub fn insufficient_funds(requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientFunds {
            requested,
            available,
        }
    }

    /// Kiểm tra có phải lỗi insufficient funds không
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, CoreError::InsufficientFunds { .. })
    }

    /// Lỗi input - console sẽ hỏi lại thay vì abort
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidAmount(_)
                | CoreError::ValidationError(_)
                | CoreError::UnknownAccountType(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = CoreError::insufficient_funds(dec!(40), dec!(30));
        assert_eq!(
            err.to_string(),
            "Insufficient funds: requested 40, available 30"
        );

        let err = CoreError::InvalidAccountNumber("ACC_001".to_string());
        assert_eq!(err.to_string(), "Invalid account number format: ACC_001");
    }

    #[test]
    fn test_error_checks() {
        assert!(CoreError::insufficient_funds(dec!(1), dec!(0)).is_insufficient_funds());
        assert!(CoreError::InvalidAmount("0".to_string()).is_validation());
        assert!(!CoreError::InvalidAccountNumber("x".to_string()).is_validation());
    }
}
