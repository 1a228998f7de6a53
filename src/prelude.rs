//! Trolley prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{AppliedPromotion, Cart, CartError},
    catalog::{Catalog, CatalogError},
    discounts::DiscountError,
    items::{CartEntryKey, LineItem, SavedItem},
    persistence::{CartSnapshot, CartStorage, EntrySnapshot, SavedSnapshot, StorageError, YamlCartStorage},
    pricing::{PricingBreakdown, PricingConfig, PricingError, compute_breakdown},
    products::{DEFAULT_MAX_QUANTITY, DEFAULT_STOCK, Product, ProductKey, Variant},
    promotions::{Promotion, PromotionCodeError, resolve},
    receipt::{Receipt, ReceiptError},
    shipping::{ShippingSchedule, ShippingTier},
    tax::tax_on,
};
