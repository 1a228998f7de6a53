//! Catalog
//!
//! Product catalogs load from YAML files keyed by stable string identifiers.
//! Within a session each product gets a generated [`ProductKey`]; the string
//! keys exist so snapshots and fixtures can reference products across
//! sessions.

use std::{fs, path::PathBuf};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{Findable, Money, iso::Currency};
use serde::Deserialize;
use slotmap::SlotMap;
use thiserror::Error;

use crate::products::{DEFAULT_MAX_QUANTITY, Product, ProductKey};

/// Catalog loading and lookup errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading catalog files.
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format.
    #[error("invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code.
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// Currency mismatch between products.
    #[error("currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),
}

/// Wrapper for products in YAML.
#[derive(Debug, Deserialize)]
struct ProductsFile {
    /// Map of product key -> product entry
    products: FxHashMap<String, ProductEntry>,
}

/// One product as written in a YAML catalog file.
#[derive(Debug, Deserialize)]
struct ProductEntry {
    name: String,

    /// Price string, e.g. `"24.99 USD"`.
    price: String,

    /// Optional pre-discount reference price in the same format.
    original_price: Option<String>,

    #[serde(default = "default_max_quantity")]
    max_quantity: u32,

    stock: u32,
}

fn default_max_quantity() -> u32 {
    DEFAULT_MAX_QUANTITY
}

/// Product catalog with stable string keys.
#[derive(Debug, Default)]
pub struct Catalog<'a> {
    products: SlotMap<ProductKey, Product<'a>>,
    keys: FxHashMap<String, ProductKey>,
    currency: Option<&'static Currency>,
}

impl<'a> Catalog<'a> {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self {
            products: SlotMap::with_key(),
            keys: FxHashMap::default(),
            currency: None,
        }
    }

    /// Load a catalog from a YAML products file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or parsed, a
    /// price is malformed, or products disagree on currency.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path.into())?;
        let file: ProductsFile = serde_norway::from_str(&contents)?;

        let mut catalog = Self::new();

        for (key, entry) in file.products {
            let (price, currency) = parse_price(&entry.price)?;

            let original_price = match entry.original_price.as_deref().map(parse_price) {
                Some(Ok((money, original_currency))) if original_currency != currency => {
                    return Err(CatalogError::CurrencyMismatch(
                        currency.iso_alpha_code.to_string(),
                        money.currency().iso_alpha_code.to_string(),
                    ));
                }
                Some(Ok((money, _))) => Some(money),
                Some(Err(err)) => return Err(err),
                None => None,
            };

            let product = Product {
                name: entry.name,
                price,
                original_price,
                max_quantity: entry.max_quantity,
                stock: entry.stock,
            };

            catalog.insert_with_currency(key, product, currency)?;
        }

        Ok(catalog)
    }

    /// Insert a product under a stable string key.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CurrencyMismatch`] if the product's currency
    /// differs from the catalog's.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        product: Product<'a>,
    ) -> Result<ProductKey, CatalogError> {
        // Re-resolve through the ISO table to detach the currency reference
        // from the product's lifetime.
        let code = product.price.currency().iso_alpha_code;

        let currency = Currency::find(code)
            .ok_or_else(|| CatalogError::UnknownCurrency(code.to_string()))?;

        self.insert_with_currency(key.into(), product, currency)
    }

    fn insert_with_currency(
        &mut self,
        key: impl Into<String>,
        product: Product<'a>,
        currency: &'static Currency,
    ) -> Result<ProductKey, CatalogError> {
        if let Some(existing) = self.currency {
            if existing != currency {
                return Err(CatalogError::CurrencyMismatch(
                    existing.iso_alpha_code.to_string(),
                    currency.iso_alpha_code.to_string(),
                ));
            }
        } else {
            self.currency = Some(currency);
        }

        let product_key = self.products.insert(product);

        self.keys.insert(key.into(), product_key);

        Ok(product_key)
    }

    /// Look up a product by its stable string key.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] if the key is unknown.
    pub fn product(&self, key: &str) -> Result<&Product<'a>, CatalogError> {
        self.keys
            .get(key)
            .and_then(|product_key| self.products.get(*product_key))
            .ok_or_else(|| CatalogError::ProductNotFound(key.to_string()))
    }

    /// Look up a product key by its stable string key.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] if the key is unknown.
    pub fn product_key(&self, key: &str) -> Result<ProductKey, CatalogError> {
        self.keys
            .get(key)
            .copied()
            .ok_or_else(|| CatalogError::ProductNotFound(key.to_string()))
    }

    /// Look up a product by its generated key.
    pub fn product_by_key(&self, key: ProductKey) -> Option<&Product<'a>> {
        self.products.get(key)
    }

    /// Reverse-map a generated key to its stable string key.
    pub fn string_key(&self, key: ProductKey) -> Option<&str> {
        self.keys
            .iter()
            .find(|(_, product_key)| **product_key == key)
            .map(|(string_key, _)| string_key.as_str())
    }

    /// Stable string keys of every product in the catalog.
    pub fn string_keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// The product metadata map, for receipt rendering.
    pub fn products(&self) -> &SlotMap<ProductKey, Product<'a>> {
        &self.products
    }

    /// The catalog's currency.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownCurrency`] if no products have been
    /// loaded yet.
    pub fn currency(&self) -> Result<&'static Currency, CatalogError> {
        self.currency
            .ok_or_else(|| CatalogError::UnknownCurrency("no products loaded".to_string()))
    }
}

/// Parse a price string (e.g. `"24.99 USD"`) into money and its currency.
///
/// # Errors
///
/// Returns a [`CatalogError`] if the string is not `"AMOUNT CURRENCY"`, the
/// amount does not parse as a decimal, or the currency code is unknown.
pub fn parse_price(s: &str) -> Result<(Money<'static, Currency>, &'static Currency), CatalogError> {
    let mut parts = s.split_whitespace();

    let (Some(amount_str), Some(currency_code), None) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(CatalogError::InvalidPrice(format!(
            "expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount_str
        .parse::<Decimal>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    let currency = Currency::find(currency_code)
        .ok_or_else(|| CatalogError::UnknownCurrency(currency_code.to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::new(100, 0))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| CatalogError::InvalidPrice(s.to_string()))?;

    Ok((Money::from_minor(minor_units, currency), currency))
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{EUR, USD};
    use testresult::TestResult;

    use super::*;

    fn write_catalog(contents: &str) -> Result<tempfile::NamedTempFile, std::io::Error> {
        use std::io::Write as _;

        let mut file = tempfile::NamedTempFile::new()?;

        file.write_all(contents.as_bytes())?;

        Ok(file)
    }

    #[test]
    fn parse_price_reads_amount_and_currency() -> TestResult {
        let (money, currency) = parse_price("24.99 USD")?;

        assert_eq!(money, Money::from_minor(2499, USD));
        assert_eq!(currency, USD);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_missing_currency() {
        assert!(matches!(
            parse_price("24.99"),
            Err(CatalogError::InvalidPrice(_))
        ));
    }

    #[test]
    fn parse_price_rejects_trailing_tokens() {
        assert!(matches!(
            parse_price("24.99 USD extra"),
            Err(CatalogError::InvalidPrice(_))
        ));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        assert!(matches!(
            parse_price("24.99 ZZZ"),
            Err(CatalogError::UnknownCurrency(code)) if code == "ZZZ"
        ));
    }

    #[test]
    fn from_file_loads_products() -> TestResult {
        let file = write_catalog(
            "products:\n\
             \x20 tee:\n\
             \x20   name: Organic Cotton Tee\n\
             \x20   price: 24.99 USD\n\
             \x20   original_price: 29.99 USD\n\
             \x20   stock: 25\n\
             \x20 mug:\n\
             \x20   name: Stoneware Mug\n\
             \x20   price: 12.50 USD\n\
             \x20   max_quantity: 4\n\
             \x20   stock: 8\n",
        )?;

        let catalog = Catalog::from_file(file.path())?;

        let tee = catalog.product("tee")?;

        assert_eq!(tee.name, "Organic Cotton Tee");
        assert_eq!(tee.price, Money::from_minor(2499, USD));
        assert_eq!(tee.original_price, Some(Money::from_minor(2999, USD)));
        assert_eq!(tee.max_quantity, DEFAULT_MAX_QUANTITY);
        assert_eq!(tee.stock, 25);

        let mug = catalog.product("mug")?;

        assert_eq!(mug.max_quantity, 4);
        assert_eq!(mug.original_price, None);

        assert_eq!(catalog.currency()?, USD);

        Ok(())
    }

    #[test]
    fn from_file_rejects_mixed_currencies() -> TestResult {
        let file = write_catalog(
            "products:\n\
             \x20 tee:\n\
             \x20   name: Tee\n\
             \x20   price: 24.99 USD\n\
             \x20   stock: 5\n\
             \x20 mug:\n\
             \x20   name: Mug\n\
             \x20   price: 12.50 EUR\n\
             \x20   stock: 5\n",
        )?;

        let result = Catalog::from_file(file.path());

        assert!(matches!(result, Err(CatalogError::CurrencyMismatch(_, _))));

        Ok(())
    }

    #[test]
    fn insert_rejects_currency_mismatch() -> TestResult {
        let mut catalog = Catalog::new();

        catalog.insert(
            "tee",
            Product {
                name: "Tee".to_string(),
                price: Money::from_minor(2499, USD),
                original_price: None,
                max_quantity: 10,
                stock: 5,
            },
        )?;

        let result = catalog.insert(
            "mug",
            Product {
                name: "Mug".to_string(),
                price: Money::from_minor(1250, EUR),
                original_price: None,
                max_quantity: 10,
                stock: 5,
            },
        );

        assert!(matches!(result, Err(CatalogError::CurrencyMismatch(_, _))));

        Ok(())
    }

    #[test]
    fn string_key_reverse_maps_generated_keys() -> TestResult {
        let mut catalog = Catalog::new();

        let key = catalog.insert(
            "tee",
            Product {
                name: "Tee".to_string(),
                price: Money::from_minor(2499, USD),
                original_price: None,
                max_quantity: 10,
                stock: 5,
            },
        )?;

        assert_eq!(catalog.string_key(key), Some("tee"));
        assert_eq!(catalog.product_key("tee")?, key);

        Ok(())
    }

    #[test]
    fn product_not_found_returns_error() {
        let catalog = Catalog::new();

        assert!(matches!(
            catalog.product("missing"),
            Err(CatalogError::ProductNotFound(_))
        ));
        assert!(matches!(
            catalog.product_key("missing"),
            Err(CatalogError::ProductNotFound(_))
        ));
    }

    #[test]
    fn empty_catalog_has_no_currency() {
        let catalog = Catalog::new();

        assert!(matches!(
            catalog.currency(),
            Err(CatalogError::UnknownCurrency(_))
        ));
    }
}
