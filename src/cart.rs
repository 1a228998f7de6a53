//! Cart
//!
//! The owning store for active and saved-for-later line items, and the only
//! legal mutation surface over them. Pricing math is delegated wholesale to
//! [`crate::pricing::compute_breakdown`]: mutations are where invariants are
//! enforced, so the aggregator can trust its input.
//!
//! The store is synchronous and single-owner. It performs no I/O — hosts that
//! persist cart state capture a [`CartSnapshot`] after a successful mutation
//! and hand it to a [`crate::persistence::CartStorage`] collaborator.

use rusty_money::{Money, iso::Currency};
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    catalog::{Catalog, CatalogError},
    items::{CartEntryKey, LineItem, SavedItem},
    persistence::{CartSnapshot, EntrySnapshot, SavedSnapshot, StorageError},
    pricing::{self, PricingBreakdown, PricingConfig, PricingError},
    products::{Product, ProductKey, Variant},
    promotions::{self, Promotion, PromotionCodeError},
};

/// Errors surfaced by cart mutation operations.
///
/// All of these are local, recoverable conditions; a failed operation leaves
/// the store unchanged.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// The requested quantity is outside what this row can hold.
    #[error("invalid quantity {requested}; purchasable range is 1..={available}")]
    InvalidQuantity {
        /// Quantity the caller asked for (after any merge).
        requested: u32,
        /// Upper bound this row can hold.
        available: u32,
    },

    /// No cart entry matches the given key.
    #[error("cart entry not found: {0:?}")]
    EntryNotFound(CartEntryKey),

    /// The promotion code did not resolve; any active promotion was cleared.
    #[error(transparent)]
    InvalidPromotionCode(#[from] PromotionCodeError),

    /// Errors bubbled up from pricing the current cart.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// A successfully applied promotion and its discount at application time.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPromotion<'a> {
    promotion: Promotion,
    discount: Money<'a, Currency>,
}

impl<'a> AppliedPromotion<'a> {
    /// Returns the promotion now active on the cart.
    pub fn promotion(&self) -> &Promotion {
        &self.promotion
    }

    /// Returns the discount this promotion took off the subtotal at the
    /// moment it was applied.
    pub fn discount(&self) -> Money<'a, Currency> {
        self.discount
    }
}

/// Cart
#[derive(Debug)]
pub struct Cart<'a> {
    entry_keys: SlotMap<CartEntryKey, ()>,
    items: Vec<LineItem<'a>>,
    saved_items: Vec<SavedItem<'a>>,
    active_promotion: Option<Promotion>,
    config: PricingConfig<'a>,
}

impl<'a> Cart<'a> {
    /// Create an empty cart priced under the given config.
    #[must_use]
    pub fn new(config: PricingConfig<'a>) -> Self {
        Self {
            entry_keys: SlotMap::with_key(),
            items: Vec::new(),
            saved_items: Vec::new(),
            active_promotion: None,
            config,
        }
    }

    /// Add a product to the cart.
    ///
    /// An existing row with the same product and variant absorbs the request
    /// by summing quantities; otherwise a new row is appended under a fresh
    /// entry key.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] — without mutating state — when
    /// the requested (or merged) quantity is below 1 or above what the row
    /// can hold (`min(max_quantity, stock)`).
    pub fn add_item(
        &mut self,
        product_key: ProductKey,
        product: &Product<'a>,
        variant: Variant,
        quantity: u32,
    ) -> Result<CartEntryKey, CartError> {
        let available = product.max_quantity.min(product.stock);

        if quantity < 1 {
            return Err(CartError::InvalidQuantity {
                requested: quantity,
                available,
            });
        }

        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.product() == product_key && item.variant() == &variant)
        {
            let available = existing.purchasable_limit();

            let merged = existing
                .quantity()
                .checked_add(quantity)
                .filter(|&merged| merged <= available)
                .ok_or(CartError::InvalidQuantity {
                    requested: existing.quantity().saturating_add(quantity),
                    available,
                })?;

            existing.set_quantity(merged);

            return Ok(existing.key());
        }

        if quantity > available {
            return Err(CartError::InvalidQuantity {
                requested: quantity,
                available,
            });
        }

        let key = self.entry_keys.insert(());

        self.items.push(LineItem::from_product(
            key,
            product_key,
            product,
            variant,
            quantity,
        ));

        Ok(key)
    }

    /// Replace the quantity of an existing row in place.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::EntryNotFound`] for an unknown key, or
    /// [`CartError::InvalidQuantity`] when the new quantity is below 1 or
    /// above what the row can hold. State is unchanged on failure.
    pub fn update_quantity(
        &mut self,
        key: CartEntryKey,
        quantity: u32,
    ) -> Result<(), CartError> {
        let Some(item) = self.items.iter_mut().find(|item| item.key() == key) else {
            return Err(CartError::EntryNotFound(key));
        };

        let available = item.purchasable_limit();

        if quantity < 1 || quantity > available {
            return Err(CartError::InvalidQuantity {
                requested: quantity,
                available,
            });
        }

        item.set_quantity(quantity);

        Ok(())
    }

    /// Remove a row from the cart. `None` (and no state change) if absent.
    pub fn remove_item(&mut self, key: CartEntryKey) -> Option<LineItem<'a>> {
        let position = self.items.iter().position(|item| item.key() == key)?;

        self.entry_keys.remove(key);

        Some(self.items.remove(position))
    }

    /// Move a row from the cart to the saved-for-later list, marking it in
    /// stock. Returns whether anything moved.
    pub fn save_for_later(&mut self, key: CartEntryKey) -> bool {
        let Some(position) = self.items.iter().position(|item| item.key() == key) else {
            return false;
        };

        let item = self.items.remove(position);

        self.saved_items.push(SavedItem::new(item, true));

        true
    }

    /// Move a saved item back into the cart under a fresh entry key, with a
    /// quantity of one and the default purchase bounds.
    ///
    /// Out-of-stock and unknown saved items are left untouched and yield
    /// `None`.
    pub fn move_to_cart(&mut self, key: CartEntryKey) -> Option<CartEntryKey> {
        let position = self
            .saved_items
            .iter()
            .position(|saved| saved.item().key() == key && saved.in_stock())?;

        let saved = self.saved_items.remove(position);

        self.entry_keys.remove(key);

        let fresh = self.entry_keys.insert(());

        self.items.push(saved.into_item().restored(fresh));

        Some(fresh)
    }

    /// Remove an item from the saved-for-later list. `None` (and no state
    /// change) if absent.
    pub fn remove_saved_item(&mut self, key: CartEntryKey) -> Option<SavedItem<'a>> {
        let position = self
            .saved_items
            .iter()
            .position(|saved| saved.item().key() == key)?;

        self.entry_keys.remove(key);

        Some(self.saved_items.remove(position))
    }

    /// Empty the active cart. Saved items and any active promotion are left
    /// untouched; an empty cart prices a percent promotion to a zero
    /// discount anyway.
    pub fn clear(&mut self) {
        for item in self.items.drain(..) {
            self.entry_keys.remove(item.key());
        }
    }

    /// Resolve and activate a promotion code.
    ///
    /// On success the promotion replaces whatever was active (promotions
    /// never stack) and the returned value reports the discount against the
    /// subtotal at application time. Re-applying the same code is a no-op in
    /// effect.
    ///
    /// # Errors
    ///
    /// An unresolvable code fails closed: the active promotion — if any — is
    /// cleared and [`CartError::InvalidPromotionCode`] is returned.
    pub fn apply_promotion(&mut self, code: &str) -> Result<AppliedPromotion<'a>, CartError> {
        let promotion = match promotions::resolve(code) {
            Ok(promotion) => promotion,
            Err(err) => {
                self.active_promotion = None;

                return Err(CartError::InvalidPromotionCode(err));
            }
        };

        self.active_promotion = Some(promotion);

        let breakdown = self.breakdown()?;

        Ok(AppliedPromotion {
            promotion,
            discount: breakdown.cart_discount(),
        })
    }

    /// Price the current cart contents under the active promotion.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if minor-unit arithmetic overflows; this
    /// does not occur for rows admitted through the mutation surface.
    pub fn breakdown(&self) -> Result<PricingBreakdown<'a>, PricingError> {
        pricing::compute_breakdown(&self.items, self.active_promotion.as_ref(), &self.config)
    }

    /// Total number of units across active rows.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(LineItem::quantity).sum()
    }

    /// Active cart rows, in insertion order.
    pub fn items(&self) -> &[LineItem<'a>] {
        &self.items
    }

    /// Saved-for-later rows, in insertion order.
    pub fn saved_items(&self) -> &[SavedItem<'a>] {
        &self.saved_items
    }

    /// The promotion currently applied to the cart, if any.
    pub fn active_promotion(&self) -> Option<&Promotion> {
        self.active_promotion.as_ref()
    }

    /// Number of active rows (not units) in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the active cart holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The currency this cart prices in.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.config.currency()
    }

    /// The pricing parameters this cart was built with.
    pub fn config(&self) -> &PricingConfig<'a> {
        &self.config
    }

    /// Capture a serialisable image of the cart for a storage collaborator.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if a row's product key cannot be resolved
    /// to a stable catalog key.
    pub fn snapshot(&self, catalog: &Catalog<'_>) -> Result<CartSnapshot, StorageError> {
        let entries = self
            .items
            .iter()
            .map(|item| entry_snapshot(item, catalog))
            .collect::<Result<_, _>>()?;

        let saved = self
            .saved_items
            .iter()
            .map(|saved| {
                Ok(SavedSnapshot {
                    entry: entry_snapshot(saved.item(), catalog)?,
                    in_stock: saved.in_stock(),
                })
            })
            .collect::<Result<_, StorageError>>()?;

        Ok(CartSnapshot { entries, saved })
    }

    /// Rebuild a cart from a snapshot, resolving stable product keys through
    /// the catalog.
    ///
    /// Prices are restored exactly as captured; the catalog only supplies
    /// product identity, so a restored cart prices as it did when saved.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if a snapshot row references a product the
    /// catalog does not know.
    pub fn from_snapshot(
        snapshot: &CartSnapshot,
        catalog: &Catalog<'a>,
        config: PricingConfig<'a>,
    ) -> Result<Self, StorageError> {
        let mut cart = Cart::new(config);

        for entry in &snapshot.entries {
            let item = cart.restore_entry(entry, catalog)?;

            cart.items.push(item);
        }

        for saved in &snapshot.saved {
            let item = cart.restore_entry(&saved.entry, catalog)?;

            cart.saved_items.push(SavedItem::new(item, saved.in_stock));
        }

        Ok(cart)
    }

    fn restore_entry(
        &mut self,
        entry: &EntrySnapshot,
        catalog: &Catalog<'a>,
    ) -> Result<LineItem<'a>, StorageError> {
        let product = catalog.product_key(&entry.product)?;
        let currency = self.config.currency();

        Ok(LineItem {
            key: self.entry_keys.insert(()),
            product,
            unit_price: Money::from_minor(entry.unit_price_minor, currency),
            original_unit_price: entry
                .original_unit_price_minor
                .map(|minor| Money::from_minor(minor, currency)),
            quantity: entry.quantity,
            max_quantity: entry.max_quantity,
            stock: entry.stock,
            variant: Variant {
                size: entry.size.clone(),
                color: entry.color.clone(),
            },
        })
    }
}

fn entry_snapshot(item: &LineItem<'_>, catalog: &Catalog<'_>) -> Result<EntrySnapshot, StorageError> {
    let product = catalog
        .string_key(item.product())
        .ok_or_else(|| CatalogError::ProductNotFound(format!("{:?}", item.product())))?;

    Ok(EntrySnapshot {
        product: product.to_string(),
        unit_price_minor: item.unit_price().to_minor_units(),
        original_unit_price_minor: item
            .original_unit_price()
            .map(|money| money.to_minor_units()),
        quantity: item.quantity(),
        max_quantity: item.max_quantity(),
        stock: item.stock(),
        size: item.variant().size.clone(),
        color: item.variant().color.clone(),
    })
}
