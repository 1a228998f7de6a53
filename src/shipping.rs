//! Shipping
//!
//! A stepped shipping fee determined by the discounted subtotal. The schedule
//! is data, not code: an ordered list of tiers plus a free-shipping threshold
//! and a standard fallback fee, so deployments can vary the steps without
//! touching the calculator.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

use crate::promotions::Promotion;

/// One step of the shipping fee schedule.
#[derive(Debug, Clone)]
pub struct ShippingTier<'a> {
    minimum: Money<'a, Currency>,
    fee: Money<'a, Currency>,
}

impl<'a> ShippingTier<'a> {
    /// Create a tier charging `fee` for subtotals at or above `minimum`.
    #[must_use]
    pub fn new(minimum: Money<'a, Currency>, fee: Money<'a, Currency>) -> Self {
        Self { minimum, fee }
    }

    /// Returns the minimum discounted subtotal for this tier.
    pub fn minimum(&self) -> &Money<'a, Currency> {
        &self.minimum
    }

    /// Returns the fee charged by this tier.
    pub fn fee(&self) -> &Money<'a, Currency> {
        &self.fee
    }
}

/// The ordered shipping fee schedule for a cart.
///
/// Tiers are scanned from the highest minimum down and the first cleared tier
/// wins. Subtotals at or above the free-shipping threshold ship free, as does
/// any cart with an active free-shipping promotion; subtotals below every
/// tier pay the standard fee.
#[derive(Debug, Clone)]
pub struct ShippingSchedule<'a> {
    free_shipping_threshold: Money<'a, Currency>,
    tiers: Vec<ShippingTier<'a>>,
    standard_fee: Money<'a, Currency>,
    currency: &'static Currency,
}

impl<'a> ShippingSchedule<'a> {
    /// Create a schedule from a free-shipping threshold, mid tiers, and a
    /// standard fallback fee. Tiers may be given in any order.
    #[must_use]
    pub fn new(
        free_shipping_threshold: Money<'a, Currency>,
        mut tiers: Vec<ShippingTier<'a>>,
        standard_fee: Money<'a, Currency>,
        currency: &'static Currency,
    ) -> Self {
        tiers.sort_by_key(|tier| std::cmp::Reverse(tier.minimum.to_minor_units()));

        Self {
            free_shipping_threshold,
            tiers,
            standard_fee,
            currency,
        }
    }

    /// The standard retail schedule: free at 50.00, 4.99 from 30.00, and
    /// 9.99 below that.
    #[must_use]
    pub fn standard(currency: &'static Currency) -> Self {
        Self::new(
            Money::from_minor(5000, currency),
            vec![ShippingTier::new(
                Money::from_minor(3000, currency),
                Money::from_minor(499, currency),
            )],
            Money::from_minor(999, currency),
            currency,
        )
    }

    /// Returns the subtotal threshold above which shipping is free.
    pub fn free_shipping_threshold(&self) -> &Money<'a, Currency> {
        &self.free_shipping_threshold
    }

    /// Calculate the shipping fee for a discounted subtotal.
    ///
    /// An active free-shipping promotion wins over every tier, regardless of
    /// the subtotal.
    #[must_use]
    pub fn fee(
        &self,
        subtotal_after_discount: Money<'a, Currency>,
        promotion: Option<&Promotion>,
    ) -> Money<'a, Currency> {
        if promotion.is_some_and(Promotion::is_free_shipping) {
            return Money::from_minor(0, self.currency);
        }

        let subtotal_minor = subtotal_after_discount.to_minor_units();

        if subtotal_minor >= self.free_shipping_threshold.to_minor_units() {
            return Money::from_minor(0, self.currency);
        }

        self.tiers
            .iter()
            .find(|tier| subtotal_minor >= tier.minimum.to_minor_units())
            .map_or(self.standard_fee, |tier| tier.fee)
    }

    /// Amount still needed to reach free shipping, floored at zero.
    ///
    /// Zero whenever shipping is already free, whether via the threshold or
    /// a free-shipping promotion.
    #[must_use]
    pub fn remaining(
        &self,
        subtotal_after_discount: Money<'a, Currency>,
        promotion: Option<&Promotion>,
    ) -> Money<'a, Currency> {
        if promotion.is_some_and(Promotion::is_free_shipping) {
            return Money::from_minor(0, self.currency);
        }

        let threshold_minor = self.free_shipping_threshold.to_minor_units();
        let subtotal_minor = subtotal_after_discount.to_minor_units();

        Money::from_minor(0.max(threshold_minor - subtotal_minor), self.currency)
    }

    /// Fraction of the free-shipping threshold reached, clamped to 0–1.
    ///
    /// One whenever shipping is already free, whether via the threshold or a
    /// free-shipping promotion.
    #[must_use]
    pub fn progress(
        &self,
        subtotal_after_discount: Money<'a, Currency>,
        promotion: Option<&Promotion>,
    ) -> Percentage {
        if promotion.is_some_and(Promotion::is_free_shipping) {
            return Percentage::from(1.0);
        }

        let threshold_minor = self.free_shipping_threshold.to_minor_units();
        let subtotal_minor = subtotal_after_discount.to_minor_units();

        if subtotal_minor >= threshold_minor {
            return Percentage::from(1.0);
        }

        let fraction = Decimal::from(subtotal_minor)
            .checked_div(Decimal::from(threshold_minor))
            .unwrap_or(Decimal::ONE)
            .clamp(Decimal::ZERO, Decimal::ONE);

        Percentage::from(fraction)
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;

    use super::*;

    fn schedule() -> ShippingSchedule<'static> {
        ShippingSchedule::standard(USD)
    }

    fn fee_for(subtotal_minor: i64) -> i64 {
        schedule()
            .fee(Money::from_minor(subtotal_minor, USD), None)
            .to_minor_units()
    }

    #[test]
    fn fee_below_reduced_tier_is_standard() {
        assert_eq!(fee_for(2999), 999);
    }

    #[test]
    fn fee_at_reduced_tier_boundary_is_reduced() {
        assert_eq!(fee_for(3000), 499);
    }

    #[test]
    fn fee_below_free_threshold_is_reduced() {
        assert_eq!(fee_for(4999), 499);
    }

    #[test]
    fn fee_at_free_threshold_is_zero() {
        assert_eq!(fee_for(5000), 0);
    }

    #[test]
    fn fee_for_empty_subtotal_is_standard() {
        assert_eq!(fee_for(0), 999);
    }

    #[test]
    fn free_shipping_promotion_overrides_every_tier() {
        let schedule = schedule();

        for subtotal_minor in [0, 2999, 3000, 4999, 5000, 100_000] {
            let fee = schedule.fee(
                Money::from_minor(subtotal_minor, USD),
                Some(&Promotion::FreeShipping),
            );

            assert_eq!(fee.to_minor_units(), 0, "subtotal {subtotal_minor}");
        }
    }

    #[test]
    fn remaining_counts_down_to_threshold() {
        let schedule = schedule();
        let remaining = schedule.remaining(Money::from_minor(2000, USD), None);

        assert_eq!(remaining.to_minor_units(), 3000);
    }

    #[test]
    fn remaining_is_zero_at_and_above_threshold() {
        let schedule = schedule();

        assert_eq!(
            schedule
                .remaining(Money::from_minor(5000, USD), None)
                .to_minor_units(),
            0
        );
        assert_eq!(
            schedule
                .remaining(Money::from_minor(9000, USD), None)
                .to_minor_units(),
            0
        );
    }

    #[test]
    fn remaining_is_zero_under_free_shipping_promotion() {
        let schedule = schedule();

        let remaining = schedule.remaining(
            Money::from_minor(1000, USD),
            Some(&Promotion::FreeShipping),
        );

        assert_eq!(remaining.to_minor_units(), 0);
    }

    #[test]
    fn progress_is_fraction_of_threshold() {
        let schedule = schedule();
        let progress = schedule.progress(Money::from_minor(2500, USD), None);

        assert_eq!(progress, Percentage::from(0.5));
    }

    #[test]
    fn progress_clamps_to_one_at_threshold() {
        let schedule = schedule();

        assert_eq!(
            schedule.progress(Money::from_minor(5000, USD), None),
            Percentage::from(1.0)
        );
        assert_eq!(
            schedule.progress(Money::from_minor(7500, USD), None),
            Percentage::from(1.0)
        );
    }

    #[test]
    fn progress_is_complete_under_free_shipping_promotion() {
        let schedule = schedule();

        let progress = schedule.progress(
            Money::from_minor(100, USD),
            Some(&Promotion::FreeShipping),
        );

        assert_eq!(progress, Percentage::from(1.0));
    }

    #[test]
    fn tiers_sort_descending_on_construction() {
        let schedule = ShippingSchedule::new(
            Money::from_minor(10_000, USD),
            vec![
                ShippingTier::new(Money::from_minor(1000, USD), Money::from_minor(700, USD)),
                ShippingTier::new(Money::from_minor(5000, USD), Money::from_minor(300, USD)),
            ],
            Money::from_minor(900, USD),
            USD,
        );

        // A subtotal clearing both tiers takes the higher tier's fee.
        let fee = schedule.fee(Money::from_minor(6000, USD), None);

        assert_eq!(fee.to_minor_units(), 300);
    }
}
