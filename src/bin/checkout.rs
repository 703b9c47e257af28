//! Checkout walk-through
//!
//! Loads a catalog and pricing fixture, performs scripted cart mutations,
//! prints a receipt, and persists the cart the way a storefront session
//! would.
//!
//! Use `-f` to pick a catalog fixture set (`electronics` or `general`)
//! Use `-a id=quantity` to add a product (repeatable; quantity defaults to 1)
//! Use `-o` to load and save the cart snapshot at the given path
//! Use `--checkout` to complete the order: clear the cart and its snapshot

use std::{error::Error, io, path::PathBuf};

use clap::Parser;
use rusty_money::iso;
use tracing_subscriber::EnvFilter;

use tufold::{
    cart::{Cart, StockIssueKind},
    catalog::Catalog,
    pricing::PricingConfig,
    receipt::Receipt,
    store::{CartStore, JsonFileStore},
};

/// Arguments for the checkout walk-through
#[derive(Debug, Parser)]
#[command(name = "checkout", about = "Tufold checkout walk-through", long_about = None)]
struct CheckoutArgs {
    /// Catalog fixture set to load
    #[clap(short, long, default_value = "general")]
    fixture: String,

    /// Pricing fixture to load
    #[clap(short, long, default_value = "standard")]
    pricing: String,

    /// Product to add, as `id` or `id=quantity`
    #[clap(short, long = "add")]
    add: Vec<String>,

    /// Cart snapshot file to load from and save to
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Complete the checkout: clear the cart and its snapshot at the end
    #[clap(long)]
    checkout: bool,
}

#[expect(clippy::print_stdout, reason = "CLI output")]
fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let args = CheckoutArgs::parse();

    let catalog = Catalog::from_file(
        PathBuf::from("fixtures")
            .join("catalog")
            .join(format!("{}.json", args.fixture)),
    )?;

    let pricing = PricingConfig::from_file(
        PathBuf::from("fixtures")
            .join("pricing")
            .join(format!("{}.yml", args.pricing)),
    )?;

    let store = args.out.as_ref().map(JsonFileStore::new);

    let loaded = store.as_ref().and_then(|store| store.load().transpose());

    let mut cart = if let Some(snapshot) = loaded {
        Cart::restore(&snapshot?, &catalog, &pricing)
    } else {
        Cart::new()
    };

    for spec in &args.add {
        let (id, quantity) = parse_add_spec(spec)?;
        let key = catalog.key_of(&id)?;

        match cart.add_item(&catalog, &pricing, key, quantity) {
            Ok(Some(adjustment)) => println!(
                "Only {} of {} available; quantity adjusted.",
                adjustment.stored, adjustment.id
            ),
            Ok(None) => {}
            Err(err) => println!("Could not add {id}: {err}"),
        }
    }

    Receipt::new(&cart, &catalog, &pricing, iso::USD).write_to(io::stdout().lock())?;

    for issue in cart.stock_issues(&catalog) {
        match issue.kind {
            StockIssueKind::OutOfStock => {
                println!("Note: {} is no longer in stock.", issue.id);
            }
            StockIssueKind::ExceedsStock { available } => {
                println!(
                    "Note: only {available} of {} available (cart holds {}).",
                    issue.id, issue.quantity
                );
            }
            StockIssueKind::Delisted => {
                println!("Note: {} is no longer sold.", issue.id);
            }
        }
    }

    if let Some(store) = &store {
        if args.checkout {
            cart.clear();
            store.clear()?;

            println!("Order placed; cart cleared.");
        } else {
            store.save(&cart.snapshot())?;
        }
    }

    Ok(())
}

/// Parse an `id` or `id=quantity` add spec.
fn parse_add_spec(spec: &str) -> Result<(String, u32), Box<dyn Error>> {
    let Some((id, quantity)) = spec.split_once('=') else {
        return Ok((spec.to_string(), 1));
    };

    let quantity: u32 = quantity
        .parse()
        .map_err(|_err| format!("Invalid quantity in add spec: {spec}"))?;

    Ok((id.to_string(), quantity))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
