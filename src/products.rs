//! Products

use rust_decimal::Decimal;
use slotmap::new_key_type;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Product reference data.
///
/// Loaded once from a catalog file and never mutated by the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// External identifier, as used on the wire and in cart snapshots.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Shelf price.
    pub price: Decimal,

    /// Pre-markdown price, present while the product is on sale.
    pub original_price: Option<Decimal>,

    /// Units currently held in stock.
    pub stock_quantity: u32,

    /// Whether the product can be added to a cart at all.
    pub in_stock: bool,

    /// Catalog category.
    pub category: Option<String>,

    /// Image path relative to the asset root.
    pub image: Option<String>,
}

impl Product {
    /// Units available for purchase. Zero when the product is flagged out of stock.
    #[must_use]
    pub fn available(&self) -> u32 {
        if self.in_stock { self.stock_quantity } else { 0 }
    }

    /// Per-unit markdown against the original price, when one applies.
    #[must_use]
    pub fn markdown(&self) -> Option<Decimal> {
        self.original_price
            .map(|original| original - self.price)
            .filter(|saving| saving.is_sign_positive() && !saving.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn product(price: i64, original: Option<i64>, stock: u32, in_stock: bool) -> Product {
        Product {
            id: "p1".to_string(),
            name: "Product".to_string(),
            price: Decimal::new(price, 2),
            original_price: original.map(|minor| Decimal::new(minor, 2)),
            stock_quantity: stock,
            in_stock,
            category: None,
            image: None,
        }
    }

    #[test]
    fn available_is_zero_when_out_of_stock() {
        assert_eq!(product(999, None, 5, false).available(), 0);
        assert_eq!(product(999, None, 5, true).available(), 5);
    }

    #[test]
    fn markdown_requires_a_higher_original_price() {
        assert_eq!(
            product(799, Some(999), 5, true).markdown(),
            Some(Decimal::new(200, 2))
        );

        // No original price, equal price, or a price rise: no markdown.
        assert_eq!(product(799, None, 5, true).markdown(), None);
        assert_eq!(product(799, Some(799), 5, true).markdown(), None);
        assert_eq!(product(799, Some(599), 5, true).markdown(), None);
    }
}
