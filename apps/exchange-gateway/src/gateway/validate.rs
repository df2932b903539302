// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ValidationError;

pub(crate) const DEFAULT_SLIPPAGE: Decimal = dec!(1);
const MAX_SLIPPAGE: Decimal = dec!(50);

/// Trimmed, non-empty value of a required field.
pub(crate) fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(value)
}

/// Asset or token symbols are sent lowercase.
pub(crate) fn symbol(field: &'static str, value: &str) -> Result<String, ValidationError> {
    Ok(required(field, value)?.to_lowercase())
}

/// Blank optional values count as absent.
pub(crate) fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn positive_amount(field: &'static str, raw: &str) -> Result<Decimal, ValidationError> {
    let raw = required(field, raw)?;
    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ValidationError::new(field, format!("`{raw}` is not a decimal number")))?;
    if amount <= Decimal::ZERO {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }
    Ok(amount)
}

/// Slippage percent in `(0, 50]`, defaulting to 1.
pub(crate) fn slippage(value: Option<Decimal>) -> Result<Decimal, ValidationError> {
    let slippage = value.unwrap_or(DEFAULT_SLIPPAGE);
    if slippage <= Decimal::ZERO || slippage > MAX_SLIPPAGE {
        return Err(ValidationError::new(
            "slippage",
            format!("must be greater than 0 and at most {MAX_SLIPPAGE} percent"),
        ));
    }
    Ok(slippage)
}

pub(crate) fn chain_id(value: u64) -> Result<u64, ValidationError> {
    if value == 0 {
        return Err(ValidationError::new("chainId", "must be a positive chain id"));
    }
    Ok(value)
}
