//! Receipt
//!
//! Presentation of a cart and its pricing breakdown as a text table. This is
//! the only layer that formats monetary values; the engine itself works in
//! exact minor units throughout.

use std::io;

use rusty_money::{Money, iso::Currency};
use slotmap::SlotMap;
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Color, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    cart::Cart,
    items::LineItem,
    pricing::{PricingBreakdown, PricingError},
    products::{Product, ProductKey, Variant},
};

/// Errors that can occur when building or writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// A cart row references a product missing from the catalog metadata.
    #[error("missing product: {0:?}")]
    MissingProduct(ProductKey),

    /// Errors bubbled up from pricing the cart.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Rendered summary of one cart row.
#[derive(Debug, Clone)]
struct ReceiptLine {
    name: String,
    variant: String,
    quantity: u32,
    unit_price: String,
    line_total: String,
    savings: String,
}

/// Text receipt for a cart and its pricing breakdown.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    lines: SmallVec<[ReceiptLine; 10]>,

    /// Indexes of lines priced below their reference price.
    discounted_lines: SmallVec<[usize; 10]>,

    breakdown: PricingBreakdown<'a>,
}

impl<'a> Receipt<'a> {
    /// Build a receipt from a cart, pricing it under its active promotion.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if the cart cannot be priced or a row's
    /// product is missing from the metadata map.
    pub fn from_cart(
        cart: &Cart<'a>,
        products: &SlotMap<ProductKey, Product<'_>>,
    ) -> Result<Self, ReceiptError> {
        let breakdown = cart.breakdown()?;
        let currency = cart.currency();

        let mut lines: SmallVec<[ReceiptLine; 10]> = SmallVec::new();
        let mut discounted_lines: SmallVec<[usize; 10]> = SmallVec::new();

        for (index, item) in cart.items().iter().enumerate() {
            let product = products
                .get(item.product())
                .ok_or(ReceiptError::MissingProduct(item.product()))?;

            let savings_minor = item.line_savings_minor().ok_or(PricingError::Overflow)?;

            if savings_minor > 0 {
                discounted_lines.push(index);
            }

            lines.push(receipt_line(item, &product.name, savings_minor, currency)?);
        }

        Ok(Self {
            lines,
            discounted_lines,
            breakdown,
        })
    }

    /// The breakdown this receipt renders.
    pub fn breakdown(&self) -> &PricingBreakdown<'a> {
        &self.breakdown
    }

    /// Indexes of cart rows priced below their reference price.
    #[must_use]
    pub fn discounted_lines(&self) -> &[usize] {
        &self.discounted_lines
    }

    /// Write the receipt to the given output.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::IO`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["Item", "Variant", "Qty", "Unit", "Total", "Savings"]);

        for line in &self.lines {
            builder.push_record([
                line.name.clone(),
                line.variant.clone(),
                line.quantity.to_string(),
                line.unit_price.clone(),
                line.line_total.clone(),
                line.savings.clone(),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Color::BOLD);
        table.modify(Columns::new(2..), Alignment::right());

        writeln!(out, "{table}").map_err(|_err| ReceiptError::IO)?;

        self.write_summary(&mut out)
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let breakdown = &self.breakdown;

        write_summary_line(out, "Subtotal:", &breakdown.subtotal().to_string())?;

        if breakdown.line_item_savings().to_minor_units() > 0 {
            write_summary_line(
                out,
                "Line savings:",
                &breakdown.line_item_savings().to_string(),
            )?;
        }

        if breakdown.cart_discount().to_minor_units() > 0 {
            write_summary_line(
                out,
                "Discount:",
                &format!("-{}", breakdown.cart_discount()),
            )?;
        }

        write_summary_line(out, "Shipping:", &breakdown.shipping().to_string())?;
        write_summary_line(out, "Tax:", &breakdown.tax().to_string())?;
        write_summary_line(out, "Total:", &breakdown.total().to_string())?;

        let remaining = breakdown.free_shipping_remaining();

        if remaining.to_minor_units() > 0 {
            writeln!(out, "\nAdd {remaining} more to qualify for free shipping.")
                .map_err(|_err| ReceiptError::IO)?;
        }

        Ok(())
    }
}

fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
) -> Result<(), ReceiptError> {
    writeln!(out, "{label:<15}{value:>12}").map_err(|_err| ReceiptError::IO)
}

fn receipt_line(
    item: &LineItem<'_>,
    name: &str,
    savings_minor: i64,
    currency: &'static Currency,
) -> Result<ReceiptLine, ReceiptError> {
    let total_minor = item.line_total_minor().ok_or(PricingError::Overflow)?;

    let savings = if savings_minor > 0 {
        Money::from_minor(savings_minor, currency).to_string()
    } else {
        String::new()
    };

    Ok(ReceiptLine {
        name: name.to_string(),
        variant: variant_label(item.variant()),
        quantity: item.quantity(),
        unit_price: item.unit_price().to_string(),
        line_total: Money::from_minor(total_minor, currency).to_string(),
        savings,
    })
}

fn variant_label(variant: &Variant) -> String {
    match (variant.size.as_deref(), variant.color.as_deref()) {
        (Some(size), Some(color)) => format!("{size} / {color}"),
        (Some(size), None) => size.to_string(),
        (None, Some(color)) => color.to_string(),
        (None, None) => String::new(),
    }
}
