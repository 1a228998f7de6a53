//! Line items

use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;

use crate::products::{DEFAULT_MAX_QUANTITY, DEFAULT_STOCK, Product, ProductKey, Variant};

new_key_type! {
    /// Cart Entry Key
    pub struct CartEntryKey;
}

/// One row in the active cart: a product + variant + quantity.
///
/// The entry key identifies the row, not the product: the same product with
/// different variant selections occupies separate rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem<'a> {
    pub(crate) key: CartEntryKey,
    pub(crate) product: ProductKey,
    pub(crate) unit_price: Money<'a, Currency>,
    pub(crate) original_unit_price: Option<Money<'a, Currency>>,
    pub(crate) quantity: u32,
    pub(crate) max_quantity: u32,
    pub(crate) stock: u32,
    pub(crate) variant: Variant,
}

impl<'a> LineItem<'a> {
    /// Create a line item for a product with the given variant and quantity.
    #[must_use]
    pub fn from_product(
        key: CartEntryKey,
        product_key: ProductKey,
        product: &Product<'a>,
        variant: Variant,
        quantity: u32,
    ) -> Self {
        Self {
            key,
            product: product_key,
            unit_price: product.price,
            original_unit_price: product.original_price,
            quantity,
            max_quantity: product.max_quantity,
            stock: product.stock,
            variant,
        }
    }

    /// Returns the entry key of this cart row.
    pub fn key(&self) -> CartEntryKey {
        self.key
    }

    /// Returns the product this row holds.
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// Returns the current unit price.
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Returns the pre-discount reference price, if any.
    pub fn original_unit_price(&self) -> Option<&Money<'a, Currency>> {
        self.original_unit_price.as_ref()
    }

    /// Returns the quantity of this row.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the per-entry quantity cap.
    pub fn max_quantity(&self) -> u32 {
        self.max_quantity
    }

    /// Returns the available inventory for this row.
    pub fn stock(&self) -> u32 {
        self.stock
    }

    /// Returns the variant selections for this row.
    pub fn variant(&self) -> &Variant {
        &self.variant
    }

    /// Upper bound on the quantity this row may hold.
    #[must_use]
    pub fn purchasable_limit(&self) -> u32 {
        self.max_quantity.min(self.stock)
    }

    /// Row total in minor units (`unit_price × quantity`).
    ///
    /// `None` when the multiplication overflows minor-unit arithmetic.
    pub fn line_total_minor(&self) -> Option<i64> {
        self.unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
    }

    /// Row savings in minor units against the pre-discount reference price.
    ///
    /// Zero when no reference price is present, or when the reference price
    /// is not higher than the current price.
    pub fn line_savings_minor(&self) -> Option<i64> {
        let unit = self.unit_price.to_minor_units();

        let per_unit = self
            .original_unit_price
            .map_or(0, |original| 0.max(original.to_minor_units() - unit));

        per_unit.checked_mul(i64::from(self.quantity))
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    /// Rebuild this row for re-insertion into the active cart: fresh entry
    /// key, a quantity of one, and the default purchase bounds.
    #[must_use]
    pub(crate) fn restored(self, key: CartEntryKey) -> Self {
        Self {
            key,
            quantity: 1,
            max_quantity: DEFAULT_MAX_QUANTITY,
            stock: DEFAULT_STOCK,
            ..self
        }
    }
}

/// A line item parked on the saved-for-later list, excluded from pricing.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedItem<'a> {
    pub(crate) item: LineItem<'a>,
    pub(crate) in_stock: bool,
}

impl<'a> SavedItem<'a> {
    /// Park a line item with the given stock status.
    #[must_use]
    pub fn new(item: LineItem<'a>, in_stock: bool) -> Self {
        Self { item, in_stock }
    }

    /// Returns the parked line item.
    pub fn item(&self) -> &LineItem<'a> {
        &self.item
    }

    /// Whether the product is currently in stock.
    pub fn in_stock(&self) -> bool {
        self.in_stock
    }

    pub(crate) fn into_item(self) -> LineItem<'a> {
        self.item
    }
}
