//! Tax
//!
//! A single flat rate applied to the discounted subtotal. The rate is
//! injected rather than hard-coded so deployments and tests can vary it;
//! there is no jurisdiction lookup.

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::Currency};

use crate::discounts::{DiscountError, percent_of_minor};

/// Calculate the tax due on a discounted subtotal.
///
/// # Errors
///
/// Returns a [`DiscountError`] if the percentage calculation overflows or
/// cannot be safely represented in minor units.
pub fn tax_on<'a>(
    subtotal_after_discount: Money<'a, Currency>,
    rate: &Percentage,
) -> Result<Money<'a, Currency>, DiscountError> {
    let tax_minor = percent_of_minor(rate, subtotal_after_discount.to_minor_units())?;

    Ok(Money::from_minor(
        tax_minor,
        subtotal_after_discount.currency(),
    ))
}
