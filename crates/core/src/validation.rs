//! # Validation Module
//!
//! Các rule kiểm tra input của teller: tên, địa chỉ, số tiền, ngưỡng khai báo.
//! Console gọi các hàm này cho từng field để hỏi lại khi input sai.

use crate::error::{CoreError, CoreResult};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Ngưỡng (đơn vị tiền tệ) từ đó lodge/withdraw phải hỏi lý do giao dịch.
pub const DEFAULT_DISCLOSURE_THRESHOLD: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Tên hợp lệ: không rỗng và có ít nhất một chữ cái.
pub fn is_valid_name(name: &str) -> bool {
    !name.trim().is_empty() && name.chars().any(char::is_alphabetic)
}

/// Trả về giá trị đã trim, lỗi nếu rỗng.
pub fn require_non_empty(field: &str, value: &str) -> CoreResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::ValidationError(format!("{} cannot be empty", field)));
    }
    Ok(trimmed.to_string())
}

/// Parse số tiền dạng text (chấp nhận cả ký hiệu khoa học như `1e4`).
pub fn parse_amount(text: &str) -> CoreResult<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidAmount("amount is empty".to_string()));
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| CoreError::InvalidAmount(format!("not a number: {}", trimmed)))
}

/// Parse số tiền >= 0 (opening balance, overdraft, interest rate).
pub fn parse_non_negative(text: &str) -> CoreResult<Decimal> {
    let value = parse_amount(text)?;
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CoreError::InvalidAmount(format!(
            "must not be negative: {}",
            value
        )));
    }
    Ok(value)
}

/// Số tiền lodge/withdraw phải > 0.
pub fn validate_positive_amount(amount: Decimal) -> CoreResult<()> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::InvalidAmount(format!(
            "amount must be positive: {}",
            amount
        )));
    }
    Ok(())
}

/// Giao dịch >= threshold phải hỏi lý do (không bắt buộc phải có).
pub fn requires_justification(amount: Decimal, threshold: Decimal) -> bool {
    amount >= threshold
}
