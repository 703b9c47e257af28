//! Tufold
//!
//! Cart and pricing engine for the Tufold storefronts: a read-only product
//! catalog, a cart aggregate with derived subtotal/tax/shipping/total, an
//! injected snapshot store, and terminal receipt rendering.

pub mod cart;
pub mod catalog;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod store;
