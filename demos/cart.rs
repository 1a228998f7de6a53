//! Cart Demo
//!
//! Fills a cart from a YAML catalog fixture, applies an optional promotion
//! code, and prints the receipt.
//!
//! Use `-c` to pick a catalog fixture set by name
//! Use `-p` to apply a promotion code
//! Use `-o` to save a cart snapshot to the given file

use std::io;

use anyhow::Result;
use clap::Parser;
use trolley::{
    cart::Cart,
    catalog::Catalog,
    persistence::{CartStorage, YamlCartStorage},
    pricing::PricingConfig,
    products::Variant,
    receipt::Receipt,
    utils::DemoCartArgs,
};

/// Cart Demo
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let args = DemoCartArgs::parse();

    let catalog = Catalog::from_file(format!("fixtures/products/{}.yml", args.catalog))?;
    let mut cart = Cart::new(PricingConfig::standard(catalog.currency()?));

    // One of everything in the fixture set, then a second unit of the first
    // product to show merge-on-add.
    let mut keys: Vec<String> = catalog.string_keys().map(str::to_owned).collect();

    keys.sort();

    for key in &keys {
        cart.add_item(
            catalog.product_key(key)?,
            catalog.product(key)?,
            Variant::default(),
            1,
        )?;
    }

    if let Some(first) = keys.first() {
        cart.add_item(
            catalog.product_key(first)?,
            catalog.product(first)?,
            Variant::default(),
            1,
        )?;
    }

    if let Some(code) = args.code.as_deref() {
        match cart.apply_promotion(code) {
            Ok(applied) => println!("Applied {code}: -{}\n", applied.discount()),
            Err(err) => println!("{err}\n"),
        }
    }

    let stdout = io::stdout();
    let handle = stdout.lock();

    Receipt::from_cart(&cart, catalog.products())?.write_to(handle)?;

    if let Some(out) = args.out.as_deref() {
        let storage = YamlCartStorage::new(out);

        storage.save(&cart.snapshot(&catalog)?)?;

        println!("\nSnapshot saved to {out}");
    }

    Ok(())
}
