//! Products

use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Default per-entry quantity cap for new cart rows.
pub const DEFAULT_MAX_QUANTITY: u32 = 10;

/// Default stock level restored when a saved item moves back into the cart.
pub const DEFAULT_STOCK: u32 = 10;

/// Product
#[derive(Debug, Clone)]
pub struct Product<'a> {
    /// Product name
    pub name: String,

    /// Current unit price
    pub price: Money<'a, Currency>,

    /// Pre-discount reference price, when the product is on offer
    pub original_price: Option<Money<'a, Currency>>,

    /// Per-entry quantity cap
    pub max_quantity: u32,

    /// Available inventory
    pub stock: u32,
}

/// Identity-distinguishing attributes of a cart row.
///
/// Two otherwise-identical products with different variants occupy separate
/// cart rows; an identical product + variant pair merges into one row on
/// insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variant {
    /// Selected size, if the product comes in sizes
    pub size: Option<String>,

    /// Selected colour, if the product comes in colours
    pub color: Option<String>,
}

impl Variant {
    /// Create a variant from optional size and colour selections.
    #[must_use]
    pub fn new(size: Option<&str>, color: Option<&str>) -> Self {
        Self {
            size: size.map(str::to_owned),
            color: color.map(str::to_owned),
        }
    }
}
