//! Pricing
//!
//! The pricing aggregator: a pure function from the current line items, the
//! active promotion, and the injected pricing parameters to a single
//! [`PricingBreakdown`] value. It performs no I/O and holds no state, so
//! recomputing after every cart mutation is safe and deterministic.
//!
//! All arithmetic stays in exact minor units; formatting (and therefore any
//! presentation rounding) belongs to the receipt layer.

use decimal_percentage::Percentage;
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::{
    discounts::{DiscountError, percent_of_minor},
    items::LineItem,
    promotions::Promotion,
    shipping::ShippingSchedule,
    tax,
};

/// Errors that can occur while computing a pricing breakdown.
///
/// None of these arise for well-formed line items; they exist so overflow and
/// currency mistakes surface as values instead of panics.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// A line total or aggregate overflowed minor-unit arithmetic.
    #[error("cart arithmetic overflowed minor units")]
    Overflow,

    /// Errors bubbled up from percentage arithmetic.
    #[error(transparent)]
    Discount(#[from] DiscountError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Pricing parameters injected into the aggregator.
#[derive(Debug, Clone)]
pub struct PricingConfig<'a> {
    currency: &'static Currency,
    tax_rate: Percentage,
    shipping: ShippingSchedule<'a>,
}

impl<'a> PricingConfig<'a> {
    /// Create a config from a currency, flat tax rate, and shipping schedule.
    #[must_use]
    pub fn new(
        currency: &'static Currency,
        tax_rate: Percentage,
        shipping: ShippingSchedule<'a>,
    ) -> Self {
        Self {
            currency,
            tax_rate,
            shipping,
        }
    }

    /// The standard retail parameters: 8% flat tax and the standard shipping
    /// schedule.
    #[must_use]
    pub fn standard(currency: &'static Currency) -> Self {
        Self::new(
            currency,
            Percentage::from(0.08),
            ShippingSchedule::standard(currency),
        )
    }

    /// Returns the currency all carts priced under this config use.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Returns the flat tax rate.
    pub fn tax_rate(&self) -> &Percentage {
        &self.tax_rate
    }

    /// Returns the shipping schedule.
    pub fn shipping(&self) -> &ShippingSchedule<'a> {
        &self.shipping
    }
}

/// Deterministic price breakdown for the current cart contents.
///
/// Produced fresh on demand and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingBreakdown<'a> {
    subtotal: Money<'a, Currency>,
    line_item_savings: Money<'a, Currency>,
    cart_discount: Money<'a, Currency>,
    subtotal_after_discount: Money<'a, Currency>,
    shipping: Money<'a, Currency>,
    tax: Money<'a, Currency>,
    total: Money<'a, Currency>,
    free_shipping_remaining: Money<'a, Currency>,
    free_shipping_progress: Percentage,
}

impl<'a> PricingBreakdown<'a> {
    fn zero(currency: &'static Currency) -> Self {
        let zero = Money::from_minor(0, currency);

        Self {
            subtotal: zero,
            line_item_savings: zero,
            cart_discount: zero,
            subtotal_after_discount: zero,
            shipping: zero,
            tax: zero,
            total: zero,
            free_shipping_remaining: zero,
            free_shipping_progress: Percentage::from(0.0),
        }
    }

    /// Sum of `unit_price × quantity` over active items.
    #[must_use]
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Sum of per-row savings against pre-discount reference prices.
    #[must_use]
    pub fn line_item_savings(&self) -> Money<'a, Currency> {
        self.line_item_savings
    }

    /// Discount taken off the subtotal by the active promotion.
    #[must_use]
    pub fn cart_discount(&self) -> Money<'a, Currency> {
        self.cart_discount
    }

    /// Subtotal after the promotion discount, floored at zero.
    #[must_use]
    pub fn subtotal_after_discount(&self) -> Money<'a, Currency> {
        self.subtotal_after_discount
    }

    /// Shipping fee for the discounted subtotal.
    #[must_use]
    pub fn shipping(&self) -> Money<'a, Currency> {
        self.shipping
    }

    /// Tax due on the discounted subtotal.
    #[must_use]
    pub fn tax(&self) -> Money<'a, Currency> {
        self.tax
    }

    /// Grand total: discounted subtotal plus tax plus shipping.
    #[must_use]
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Amount still needed to reach free shipping, floored at zero.
    #[must_use]
    pub fn free_shipping_remaining(&self) -> Money<'a, Currency> {
        self.free_shipping_remaining
    }

    /// Fraction of the free-shipping threshold reached (0–1).
    #[must_use]
    pub fn free_shipping_progress(&self) -> Percentage {
        self.free_shipping_progress
    }
}

/// Compute the price breakdown for the given items and active promotion.
///
/// Pure in its inputs: identical items, promotion, and config always produce
/// an identical breakdown, independent of item order.
///
/// An empty item list prices to the all-zero breakdown — an empty cart owes
/// no shipping and shows no free-shipping progress; the tier rule only
/// applies once there is something to ship.
///
/// # Errors
///
/// Returns a [`PricingError`] if minor-unit arithmetic overflows or a money
/// operation fails. Neither occurs for well-formed line items.
pub fn compute_breakdown<'a>(
    items: &[LineItem<'a>],
    promotion: Option<&Promotion>,
    config: &PricingConfig<'a>,
) -> Result<PricingBreakdown<'a>, PricingError> {
    let currency = config.currency();

    if items.is_empty() {
        return Ok(PricingBreakdown::zero(currency));
    }

    let subtotal_minor = items.iter().try_fold(0i64, |acc, item| {
        item.line_total_minor()
            .and_then(|line| acc.checked_add(line))
            .ok_or(PricingError::Overflow)
    })?;

    let savings_minor = items.iter().try_fold(0i64, |acc, item| {
        item.line_savings_minor()
            .and_then(|line| acc.checked_add(line))
            .ok_or(PricingError::Overflow)
    })?;

    let discount_minor = match promotion {
        Some(Promotion::PercentOff(percent)) => {
            percent_of_minor(percent, subtotal_minor)?.clamp(0, subtotal_minor)
        }
        Some(Promotion::FreeShipping) | None => 0,
    };

    let subtotal_after_discount = Money::from_minor(subtotal_minor - discount_minor, currency);

    let shipping = config.shipping().fee(subtotal_after_discount, promotion);
    let tax = tax::tax_on(subtotal_after_discount, config.tax_rate())?;
    let total = subtotal_after_discount.add(tax)?.add(shipping)?;

    Ok(PricingBreakdown {
        subtotal: Money::from_minor(subtotal_minor, currency),
        line_item_savings: Money::from_minor(savings_minor, currency),
        cart_discount: Money::from_minor(discount_minor, currency),
        subtotal_after_discount,
        shipping,
        tax,
        total,
        free_shipping_remaining: config
            .shipping()
            .remaining(subtotal_after_discount, promotion),
        free_shipping_progress: config
            .shipping()
            .progress(subtotal_after_discount, promotion),
    })
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use slotmap::SlotMap;
    use testresult::TestResult;

    use crate::{
        items::CartEntryKey,
        products::{Product, ProductKey, Variant},
    };

    use super::*;

    fn item(unit_minor: i64, original_minor: Option<i64>, quantity: u32) -> LineItem<'static> {
        let mut keys = SlotMap::<CartEntryKey, ()>::with_key();

        let product = Product {
            name: String::new(),
            price: Money::from_minor(unit_minor, USD),
            original_price: original_minor.map(|minor| Money::from_minor(minor, USD)),
            max_quantity: 10,
            stock: 10,
        };

        LineItem::from_product(
            keys.insert(()),
            ProductKey::default(),
            &product,
            Variant::default(),
            quantity,
        )
    }

    fn config() -> PricingConfig<'static> {
        PricingConfig::standard(USD)
    }

    #[test]
    fn empty_cart_prices_to_zero_across_the_board() -> TestResult {
        let breakdown = compute_breakdown(&[], None, &config())?;

        assert_eq!(breakdown.subtotal().to_minor_units(), 0);
        assert_eq!(breakdown.line_item_savings().to_minor_units(), 0);
        assert_eq!(breakdown.cart_discount().to_minor_units(), 0);
        assert_eq!(breakdown.shipping().to_minor_units(), 0);
        assert_eq!(breakdown.tax().to_minor_units(), 0);
        assert_eq!(breakdown.total().to_minor_units(), 0);
        assert_eq!(breakdown.free_shipping_progress(), Percentage::from(0.0));

        Ok(())
    }

    #[test]
    fn subtotal_sums_line_totals() -> TestResult {
        let items = [item(1000, None, 2), item(250, None, 3)];

        let breakdown = compute_breakdown(&items, None, &config())?;

        assert_eq!(breakdown.subtotal().to_minor_units(), 2750);

        Ok(())
    }

    #[test]
    fn subtotal_is_independent_of_item_order() -> TestResult {
        let forward = [
            item(1099, None, 1),
            item(2499, Some(2999), 2),
            item(50, None, 9),
        ];
        let reverse = [
            item(50, None, 9),
            item(2499, Some(2999), 2),
            item(1099, None, 1),
        ];

        let first = compute_breakdown(&forward, None, &config())?;
        let second = compute_breakdown(&reverse, None, &config())?;

        assert_eq!(first.subtotal(), second.subtotal());
        assert_eq!(first.total(), second.total());

        Ok(())
    }

    #[test]
    fn line_item_savings_aggregate_per_row() -> TestResult {
        let items = [item(2499, Some(2999), 2), item(1000, None, 1)];

        let breakdown = compute_breakdown(&items, None, &config())?;

        assert_eq!(breakdown.line_item_savings().to_minor_units(), 1000);

        Ok(())
    }

    #[test]
    fn percent_promotion_discounts_subtotal() -> TestResult {
        let items = [item(4500, None, 1)];
        let promotion = Promotion::PercentOff(Percentage::from(0.10));

        let breakdown = compute_breakdown(&items, Some(&promotion), &config())?;

        assert_eq!(breakdown.cart_discount().to_minor_units(), 450);
        assert_eq!(breakdown.subtotal_after_discount().to_minor_units(), 4050);

        Ok(())
    }

    #[test]
    fn discount_never_exceeds_subtotal() -> TestResult {
        let items = [item(1000, None, 1)];
        let promotion = Promotion::PercentOff(Percentage::from(1.0));

        let breakdown = compute_breakdown(&items, Some(&promotion), &config())?;

        assert_eq!(breakdown.cart_discount(), breakdown.subtotal());
        assert_eq!(breakdown.subtotal_after_discount().to_minor_units(), 0);

        Ok(())
    }

    #[test]
    fn free_shipping_promotion_leaves_subtotal_untouched() -> TestResult {
        let items = [item(2000, None, 1)];

        let breakdown = compute_breakdown(&items, Some(&Promotion::FreeShipping), &config())?;

        assert_eq!(breakdown.cart_discount().to_minor_units(), 0);
        assert_eq!(breakdown.shipping().to_minor_units(), 0);
        assert_eq!(breakdown.tax().to_minor_units(), 160);
        assert_eq!(breakdown.total().to_minor_units(), 2160);

        Ok(())
    }

    #[test]
    fn discount_can_drop_the_cart_into_a_lower_shipping_tier() -> TestResult {
        // 45.00 with 10% off discounts to 40.50, below the free threshold.
        let items = [item(4500, None, 1)];
        let promotion = Promotion::PercentOff(Percentage::from(0.10));

        let breakdown = compute_breakdown(&items, Some(&promotion), &config())?;

        assert_eq!(breakdown.shipping().to_minor_units(), 499);
        assert_eq!(breakdown.tax().to_minor_units(), 324);
        assert_eq!(breakdown.total().to_minor_units(), 4873);

        Ok(())
    }

    #[test]
    fn breakdown_reports_free_shipping_feedback() -> TestResult {
        let items = [item(2500, None, 1)];

        let breakdown = compute_breakdown(&items, None, &config())?;

        assert_eq!(breakdown.free_shipping_remaining().to_minor_units(), 2500);
        assert_eq!(breakdown.free_shipping_progress(), Percentage::from(0.5));

        Ok(())
    }

    #[test]
    fn identical_inputs_produce_identical_breakdowns() -> TestResult {
        let items = [item(2499, Some(2999), 2), item(1099, None, 1)];
        let promotion = Promotion::PercentOff(Percentage::from(0.20));

        let first = compute_breakdown(&items, Some(&promotion), &config())?;
        let second = compute_breakdown(&items, Some(&promotion), &config())?;

        assert_eq!(first, second);

        Ok(())
    }
}
