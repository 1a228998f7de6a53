//! Utils

use clap::Parser;

/// Arguments for the cart demo
#[derive(Debug, Parser)]
pub struct DemoCartArgs {
    /// Catalog fixture set to load products from
    #[clap(short, long, default_value = "demo")]
    pub catalog: String,

    /// Promotion code to apply once the cart is filled
    #[clap(short = 'p', long)]
    pub code: Option<String>,

    /// Snapshot file to save the cart to after filling it
    #[clap(short, long)]
    pub out: Option<String>,
}
