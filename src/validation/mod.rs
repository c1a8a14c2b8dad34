use bigdecimal::{BigDecimal, Zero};
use std::fmt;

pub const USERNAME_MAX_LEN: usize = 64;
pub const PRODUCT_NAME_MAX_LEN: usize = 255;
pub const PRODUCT_DESCRIPTION_MAX_LEN: usize = 2000;

/// Prices and totals are stored as `NUMERIC(18, 2)`.
pub const PRICE_SCALE: i64 = 2;
pub const PRICE_MAX_INTEGER_DIGITS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| word.chars().filter(|ch| !ch.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

pub fn validate_id(field: &'static str, id: i64) -> ValidationResult {
    if id <= 0 {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    Ok(())
}

pub fn validate_ids(field: &'static str, ids: &[i64]) -> ValidationResult {
    if ids.is_empty() {
        return Err(ValidationError::new(field, "must contain at least one item"));
    }

    if ids.iter().any(|id| *id <= 0) {
        return Err(ValidationError::new(field, "must only contain ids greater than zero"));
    }

    Ok(())
}

pub fn validate_non_negative_amount(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount < &BigDecimal::zero() {
        return Err(ValidationError::new(field, "must not be negative"));
    }

    Ok(())
}

/// Non-negative, at most two decimals and below 10^16.
pub fn validate_price(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    validate_non_negative_amount(field, amount)?;

    if amount.with_scale(PRICE_SCALE) != *amount {
        return Err(ValidationError::new(
            field,
            format!("must have at most {} decimal places", PRICE_SCALE),
        ));
    }

    if *amount >= BigDecimal::from(10_i64.pow(PRICE_MAX_INTEGER_DIGITS)) {
        return Err(ValidationError::new(
            field,
            format!("must be below 10^{}", PRICE_MAX_INTEGER_DIGITS),
        ));
    }

    Ok(())
}
