//! Receipt
//!
//! Terminal rendering for a priced cart: one table row per line and a
//! summary block for the derived totals.

use std::io;

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{cart::Cart, catalog::Catalog, pricing::PricingConfig, products::ProductKey};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// A cart line's product could not be found in the catalog.
    #[error("Missing product")]
    MissingProduct(ProductKey),

    /// An amount does not fit the display range.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(Decimal),

    /// IO error
    #[error("IO error")]
    IO,
}

/// Receipt for a cart priced against a catalog.
#[derive(Debug)]
pub struct Receipt<'a> {
    cart: &'a Cart,
    catalog: &'a Catalog,
    pricing: &'a PricingConfig,
    currency: &'static Currency,
}

impl<'a> Receipt<'a> {
    /// Create a receipt over the given cart and catalog.
    #[must_use]
    pub fn new(
        cart: &'a Cart,
        catalog: &'a Catalog,
        pricing: &'a PricingConfig,
        currency: &'static Currency,
    ) -> Self {
        Receipt {
            cart,
            catalog,
            pricing,
            currency,
        }
    }

    /// Render the receipt.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if a line's product is missing from the
    /// catalog or the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record(["Qty", "Item", "Unit Price", "Savings", "Line Total"]);

        let mut color_ops: SmallVec<[(usize, usize, Color); 8]> = SmallVec::new();

        for (row, line) in self.cart.lines().iter().enumerate() {
            let product = self
                .catalog
                .product(line.product())
                .ok_or(ReceiptError::MissingProduct(line.product()))?;

            let quantity = Decimal::from(line.quantity());
            let line_total = self.money(product.price * quantity)?;

            let savings = if let Some(markdown) = product.markdown() {
                // Data row indexes are offset by the header.
                color_ops.push((row + 1, 3, Color::FG_GREEN));

                format!("-{}", self.money(markdown * quantity)?)
            } else {
                String::new()
            };

            builder.push_record([
                line.quantity().to_string(),
                product.name.clone(),
                self.money(product.price)?.to_string(),
                savings,
                line_total.to_string(),
            ]);
        }

        write_receipt_table(&mut out, builder, color_ops)?;

        self.write_summary(&mut out)?;

        Ok(())
    }

    fn write_summary(&self, out: &mut impl io::Write) -> Result<(), ReceiptError> {
        let totals = self.cart.totals();

        let subtotal_label = " Subtotal:".to_string();
        let tax_label = format!(" Tax ({}%):", tax_percent_points(self.pricing));
        let shipping_label = " Shipping:".to_string();
        let total_label = " \x1b[1mTotal:\x1b[0m".to_string();

        let subtotal_val = format!("{}  ", self.money(totals.subtotal)?);
        let tax_val = format!("{}  ", self.money(totals.tax)?);

        let shipping_val = if totals.shipping.is_zero() && !self.cart.is_empty() {
            "\x1b[32mFREE\x1b[0m  ".to_string()
        } else {
            format!("{}  ", self.money(totals.shipping)?)
        };

        let total_val = format!("\x1b[1m{}  \x1b[0m", self.money(totals.total)?);

        let rows = [
            (subtotal_label, subtotal_val),
            (tax_label, tax_val),
            (shipping_label, shipping_val),
            (total_label, total_val),
        ];

        let label_width = rows
            .iter()
            .map(|(label, _)| visible_width(label))
            .max()
            .unwrap_or(0);

        let value_width = rows
            .iter()
            .map(|(_, value)| visible_width(value))
            .max()
            .unwrap_or(0);

        for (label, value) in &rows {
            write_summary_line(out, label, value, label_width, value_width)?;
        }

        writeln!(out).map_err(|_err| ReceiptError::IO)
    }

    /// Format a decimal amount as money in the receipt currency.
    fn money(&self, amount: Decimal) -> Result<Money<'static, Currency>, ReceiptError> {
        let minor = amount
            .checked_mul(Decimal::new(100, 0))
            .and_then(|value| value.round_dp(0).to_i64())
            .ok_or(ReceiptError::AmountOutOfRange(amount))?;

        Ok(Money::from_minor(minor, self.currency))
    }
}

/// The tax rate as percent points for display (e.g. 8 for an 0.08 rate).
fn tax_percent_points(pricing: &PricingConfig) -> Decimal {
    ((pricing.tax_rate * Decimal::ONE) * Decimal::from_i64(100).unwrap_or(Decimal::ZERO))
        .normalize()
}

fn write_receipt_table(
    out: &mut impl io::Write,
    builder: Builder,
    color_ops: SmallVec<[(usize, usize, Color); 8]>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

#[cfg(test)]
mod tests {
    use num_traits::FromPrimitive;
    use rust_decimal::Decimal;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::catalog::ProductRecord;

    use super::*;

    fn record(id: &str, name: &str, price_minor: i64, original: Option<i64>) -> ProductRecord {
        ProductRecord {
            id: id.to_string(),
            name: name.to_string(),
            price: Decimal::new(price_minor, 2),
            original_price: original.map(|minor| Decimal::new(minor, 2)),
            stock_quantity: 10,
            in_stock: true,
            category: None,
            image: None,
        }
    }

    fn render(cart: &Cart, catalog: &Catalog, pricing: &PricingConfig) -> TestResult<String> {
        let mut out = Vec::new();

        Receipt::new(cart, catalog, pricing, USD).write_to(&mut out)?;

        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn renders_lines_and_summary() -> TestResult {
        let catalog = Catalog::from_records([
            record("tv", "Living Room TV", 39_900, None),
            record("mug", "Camp Mug", 1_250, None),
        ])?;

        let pricing = PricingConfig::default();
        let mut cart = Cart::new();

        cart.add_item(&catalog, &pricing, catalog.key_of("tv")?, 1)?;
        cart.add_item(&catalog, &pricing, catalog.key_of("mug")?, 2)?;

        let output = render(&cart, &catalog, &pricing)?;

        assert!(output.contains("Living Room TV"), "missing product name");
        assert!(output.contains("Camp Mug"), "missing product name");
        assert!(output.contains("$399.00"), "missing unit price");
        assert!(output.contains("Subtotal:"), "missing summary");
        assert!(output.contains("$424.00"), "missing subtotal value");
        assert!(output.contains("Tax (8%):"), "missing tax label");
        assert!(output.contains("Total:"), "missing total label");

        Ok(())
    }

    #[test]
    fn free_shipping_renders_as_free() -> TestResult {
        let catalog = Catalog::from_records([record("tv", "Living Room TV", 39_900, None)])?;
        let pricing = PricingConfig::default();
        let mut cart = Cart::new();

        cart.add_item(&catalog, &pricing, catalog.key_of("tv")?, 1)?;

        let output = render(&cart, &catalog, &pricing)?;

        assert!(output.contains("FREE"), "shipping should render as FREE");

        Ok(())
    }

    #[test]
    fn below_threshold_shipping_renders_as_money() -> TestResult {
        let catalog = Catalog::from_records([record("mug", "Camp Mug", 1_250, None)])?;
        let pricing = PricingConfig::default();
        let mut cart = Cart::new();

        cart.add_item(&catalog, &pricing, catalog.key_of("mug")?, 1)?;

        let output = render(&cart, &catalog, &pricing)?;

        assert!(!output.contains("FREE"), "shipping should not be FREE");
        assert!(output.contains("$5.99"), "missing shipping value");

        Ok(())
    }

    #[test]
    fn markdown_savings_render_per_line() -> TestResult {
        let catalog = Catalog::from_records([record("tv", "Living Room TV", 39_900, Some(44_900))])?;
        let pricing = PricingConfig::default();
        let mut cart = Cart::new();

        cart.add_item(&catalog, &pricing, catalog.key_of("tv")?, 2)?;

        let output = render(&cart, &catalog, &pricing)?;

        // 50.00 markdown per unit, two units.
        assert!(output.contains("-$100.00"), "missing savings cell");

        Ok(())
    }

    #[test]
    fn missing_product_errors() -> TestResult {
        let catalog = Catalog::from_records([record("tv", "Living Room TV", 39_900, None)])?;
        let pricing = PricingConfig::default();
        let mut cart = Cart::new();

        cart.add_item(&catalog, &pricing, catalog.key_of("tv")?, 1)?;

        let other_catalog = Catalog::default();
        let mut out = Vec::new();

        let result = Receipt::new(&cart, &other_catalog, &pricing, USD).write_to(&mut out);

        assert!(
            matches!(result, Err(ReceiptError::MissingProduct(_))),
            "expected MissingProduct"
        );

        Ok(())
    }

    #[test]
    fn empty_cart_renders_zero_totals() -> TestResult {
        let catalog = Catalog::default();
        let pricing = PricingConfig::default();
        let cart = Cart::new();

        let output = render(&cart, &catalog, &pricing)?;

        assert!(output.contains("$0.00"), "missing zeroed totals");
        assert!(!output.contains("FREE"), "empty cart is not a free shipment");

        Ok(())
    }

    #[test]
    fn tax_percent_points_reads_from_the_rate() {
        let pricing = PricingConfig::default();

        assert_eq!(
            tax_percent_points(&pricing),
            Decimal::from_i64(8).unwrap_or_default().normalize()
        );
    }
}
