//! Promotions
//!
//! A cart carries at most one active promotion. Codes resolve against a fixed
//! table; an unknown code is a value-level failure for the caller to surface,
//! never a panic.

use decimal_percentage::Percentage;
use thiserror::Error;

/// Errors from resolving promotion codes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromotionCodeError {
    /// The code does not match any known promotion.
    #[error("unknown promotion code: {0:?}")]
    UnknownCode(String),
}

/// An active discount affecting either the subtotal or the shipping fee.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Promotion {
    /// Percentage off the cart subtotal, stored as a fraction (0–1).
    PercentOff(Percentage),

    /// Shipping is free regardless of the subtotal.
    FreeShipping,
}

impl Promotion {
    /// Whether this promotion waives the shipping fee outright.
    #[must_use]
    pub fn is_free_shipping(&self) -> bool {
        matches!(self, Promotion::FreeShipping)
    }
}

/// Resolve a promotion code against the known-code table.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
/// Resolution is stateless and idempotent: a code always maps to the same
/// promotion, so re-submitting it can never stack discounts.
///
/// # Errors
///
/// Returns [`PromotionCodeError::UnknownCode`] for empty or unrecognised
/// codes.
pub fn resolve(code: &str) -> Result<Promotion, PromotionCodeError> {
    match code.trim().to_ascii_uppercase().as_str() {
        "SAVE10" => Ok(Promotion::PercentOff(Percentage::from(0.10))),
        "WELCOME20" => Ok(Promotion::PercentOff(Percentage::from(0.20))),
        "FREESHIP" => Ok(Promotion::FreeShipping),
        _ => Err(PromotionCodeError::UnknownCode(code.to_string())),
    }
}
