//! Cart
//!
//! The cart aggregate: an ordered list of (product, quantity) lines with the
//! derived pricing totals recomputed from scratch after every mutation. Line
//! order is insertion order and carries no meaning. At most one line exists
//! per product; repeated adds merge into the existing line.
//!
//! Mutations follow one policy throughout: the *request* is validated, the
//! *resulting line* is clamped. [`Cart::add_item`] rejects requests that are
//! impossible on their face; merges and in-place updates clamp the resulting
//! quantity to available stock and report a [`StockAdjustment`] notice.

use rust_decimal::Decimal;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    catalog::Catalog,
    pricing::{PricingConfig, Totals},
    products::ProductKey,
    store::{CartSnapshot, LineSnapshot},
};

/// Errors raised when an add request is rejected.
///
/// A rejected add leaves the cart unchanged; there is no partial mutation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The product is flagged out of stock.
    #[error("Product {0} is out of stock")]
    OutOfStock(String),

    /// A quantity of zero was requested.
    #[error("Requested quantity must be at least 1")]
    InvalidQuantity,

    /// The requested quantity alone exceeds available stock.
    #[error("Requested {requested} of product {id}, only {available} available")]
    InsufficientStock {
        /// Product identifier
        id: String,
        /// Quantity requested
        requested: u32,
        /// Units available
        available: u32,
    },

    /// The product key does not resolve in the catalog.
    #[error("Product not found in catalog")]
    UnknownProduct,
}

/// Non-fatal notice that a quantity was clamped to available stock.
///
/// Returned as data alongside the already-applied state; never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockAdjustment {
    /// Product identifier
    pub id: String,

    /// Quantity asked for, after merging with any existing line.
    pub requested: u32,

    /// Quantity actually stored (zero when the line was removed).
    pub stored: u32,
}

/// A cart line whose product availability no longer matches the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockIssue {
    /// Product identifier
    pub id: String,

    /// Quantity currently in the cart
    pub quantity: u32,

    /// What no longer matches
    pub kind: StockIssueKind,
}

/// Kinds of stock issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockIssueKind {
    /// The product was flagged out of stock after the line was added.
    OutOfStock,

    /// The line quantity exceeds what the catalog now says is available.
    ExceedsStock {
        /// Units currently available
        available: u32,
    },

    /// The product is no longer in the catalog at all.
    Delisted,
}

/// One (product, quantity) pairing within a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    product: ProductKey,
    id: String,
    quantity: u32,
}

impl CartLine {
    /// Catalog key of the product on this line.
    #[must_use]
    pub fn product(&self) -> ProductKey {
        self.product
    }

    /// External identifier of the product on this line.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Quantity on this line; always at least 1.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

/// Cart aggregate.
#[derive(Debug, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    totals: Totals,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Cart::default()
    }

    /// Add a quantity of a product, merging into an existing line.
    ///
    /// A merged quantity above available stock is clamped, and the clamp is
    /// reported as a [`StockAdjustment`].
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] (leaving the cart unchanged) if the product is
    /// unknown or out of stock, the quantity is zero, or the requested
    /// quantity alone exceeds available stock.
    pub fn add_item(
        &mut self,
        catalog: &Catalog,
        pricing: &PricingConfig,
        product: ProductKey,
        quantity: u32,
    ) -> Result<Option<StockAdjustment>, CartError> {
        let meta = catalog.product(product).ok_or(CartError::UnknownProduct)?;

        if !meta.in_stock {
            return Err(CartError::OutOfStock(meta.id.clone()));
        }

        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let available = meta.available();

        if quantity > available {
            return Err(CartError::InsufficientStock {
                id: meta.id.clone(),
                requested: quantity,
                available,
            });
        }

        let existing = self.lines.iter_mut().find(|line| line.product == product);

        let adjustment = if let Some(line) = existing {
            let requested = line.quantity.saturating_add(quantity);
            let stored = requested.min(available);

            line.quantity = stored;

            clamp_notice(&meta.id, requested, stored)
        } else {
            self.lines.push(CartLine {
                product,
                id: meta.id.clone(),
                quantity,
            });

            None
        };

        self.recompute(catalog, pricing);

        Ok(adjustment)
    }

    /// Set the quantity of an existing line.
    ///
    /// A quantity of zero removes the line. A quantity above available stock
    /// is clamped and reported; a clamp all the way to zero removes the line.
    /// Absent lines are a no-op. Never errors.
    pub fn update_quantity(
        &mut self,
        catalog: &Catalog,
        pricing: &PricingConfig,
        product: ProductKey,
        quantity: u32,
    ) -> Option<StockAdjustment> {
        let pos = self.lines.iter().position(|line| line.product == product)?;

        if quantity == 0 {
            self.lines.remove(pos);
            self.recompute(catalog, pricing);

            return None;
        }

        let Some(meta) = catalog.product(product) else {
            // A line whose product vanished from the catalog cannot be kept.
            self.lines.remove(pos);
            self.recompute(catalog, pricing);

            return None;
        };

        let stored = quantity.min(meta.available());
        let notice = clamp_notice(&meta.id, quantity, stored);

        if stored == 0 {
            self.lines.remove(pos);
        } else if let Some(line) = self.lines.get_mut(pos) {
            line.quantity = stored;
        }

        self.recompute(catalog, pricing);

        notice
    }

    /// Remove a product's line unconditionally; no-op if absent.
    pub fn remove_item(&mut self, catalog: &Catalog, pricing: &PricingConfig, product: ProductKey) {
        let before = self.lines.len();

        self.lines.retain(|line| line.product != product);

        if self.lines.len() != before {
            self.recompute(catalog, pricing);
        }
    }

    /// Empty all lines and zero the totals.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.totals = Totals::default();
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(CartLine::quantity).sum()
    }

    /// Quantity of a product in the cart; zero if absent.
    #[must_use]
    pub fn quantity_of(&self, product: ProductKey) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product == product)
            .map_or(0, CartLine::quantity)
    }

    /// The lines, in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of lines (distinct products).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The derived totals for the current line list.
    #[must_use]
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Lines whose quantity or product availability no longer matches the
    /// catalog. Detection only; nothing is auto-corrected.
    #[must_use]
    pub fn stock_issues(&self, catalog: &Catalog) -> SmallVec<[StockIssue; 4]> {
        let mut issues = SmallVec::new();

        for line in &self.lines {
            let kind = match catalog.product(line.product) {
                None => Some(StockIssueKind::Delisted),
                Some(meta) if !meta.in_stock => Some(StockIssueKind::OutOfStock),
                Some(meta) if line.quantity > meta.available() => {
                    Some(StockIssueKind::ExceedsStock {
                        available: meta.available(),
                    })
                }
                Some(_) => None,
            };

            if let Some(kind) = kind {
                issues.push(StockIssue {
                    id: line.id.clone(),
                    quantity: line.quantity,
                    kind,
                });
            }
        }

        issues
    }

    /// Serialize the cart into a wholesale snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self
                .lines
                .iter()
                .map(|line| LineSnapshot {
                    id: line.id.clone(),
                    quantity: line.quantity,
                })
                .collect(),
            totals: self.totals,
        }
    }

    /// Rebuild a cart from a snapshot against the current catalog.
    ///
    /// Lines whose identifier no longer resolves are dropped with a warning;
    /// totals are recomputed from the surviving lines. Quantities are kept as
    /// persisted, stale ones surface through [`Cart::stock_issues`].
    #[must_use]
    pub fn restore(snapshot: &CartSnapshot, catalog: &Catalog, pricing: &PricingConfig) -> Self {
        let mut cart = Cart::new();

        for line in &snapshot.lines {
            match catalog.key_of(&line.id) {
                Ok(key) => cart.lines.push(CartLine {
                    product: key,
                    id: line.id.clone(),
                    quantity: line.quantity,
                }),
                Err(_) => {
                    tracing::warn!(product = %line.id, "dropping snapshot line for delisted product");
                }
            }
        }

        cart.recompute(catalog, pricing);

        cart
    }

    /// Recompute the derived totals from the current line list.
    fn recompute(&mut self, catalog: &Catalog, pricing: &PricingConfig) {
        if self.lines.is_empty() {
            self.totals = Totals::default();

            return;
        }

        let raw_subtotal: Decimal = self
            .lines
            .iter()
            .filter_map(|line| {
                catalog
                    .product(line.product)
                    .map(|meta| meta.price * Decimal::from(line.quantity))
            })
            .sum();

        self.totals = Totals::from_subtotal(raw_subtotal, pricing);
    }
}

/// Report a clamp when the stored quantity fell short of the request.
fn clamp_notice(id: &str, requested: u32, stored: u32) -> Option<StockAdjustment> {
    (stored < requested).then(|| {
        tracing::warn!(
            product = id,
            requested,
            stored,
            "quantity clamped to available stock"
        );

        StockAdjustment {
            id: id.to_string(),
            requested,
            stored,
        }
    })
}
