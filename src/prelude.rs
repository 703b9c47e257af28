//! Tufold prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{Cart, CartError, CartLine, StockAdjustment, StockIssue, StockIssueKind},
    catalog::{Catalog, CatalogError, ProductRecord},
    pricing::{ConfigError, PricingConfig, Totals},
    products::{Product, ProductKey},
    receipt::{Receipt, ReceiptError},
    store::{CartSnapshot, CartStore, JsonFileStore, LineSnapshot, MemoryStore, StoreError},
};
