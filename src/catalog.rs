//! Catalog
//!
//! Reference data for one storefront: the full product list, loaded once at
//! startup and never mutated afterwards. Products live in a slotmap and are
//! addressed by [`ProductKey`]; the external string identifiers used on the
//! wire and in cart snapshots resolve through a hash index.

use std::{fs, io, path::Path};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use slotmap::SlotMap;
use thiserror::Error;

use crate::products::{Product, ProductKey};

/// Errors raised while loading or querying a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] io::Error),

    /// JSON parsing error
    #[error("Failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two records share an identifier
    #[error("Duplicate product identifier: {0}")]
    DuplicateId(String),

    /// A record carries a non-positive price
    #[error("Invalid price for product {id}: {price}")]
    InvalidPrice {
        /// Offending identifier
        id: String,
        /// Offending price
        price: Decimal,
    },

    /// Identifier not present in the catalog
    #[error("Product not found: {0}")]
    ProductNotFound(String),
}

/// Wire record for one product in a catalog file.
///
/// Field names follow the storefront catalog convention (`camelCase`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// External identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Shelf price
    pub price: Decimal,

    /// Pre-markdown price, when on sale
    #[serde(default)]
    pub original_price: Option<Decimal>,

    /// Units held in stock
    pub stock_quantity: u32,

    /// Whether the product is sold at all
    pub in_stock: bool,

    /// Catalog category
    #[serde(default)]
    pub category: Option<String>,

    /// Image path relative to the asset root
    #[serde(default)]
    pub image: Option<String>,
}

impl From<ProductRecord> for Product {
    fn from(record: ProductRecord) -> Self {
        Product {
            id: record.id,
            name: record.name,
            price: record.price,
            original_price: record.original_price,
            stock_quantity: record.stock_quantity,
            in_stock: record.in_stock,
            category: record.category,
            image: record.image,
        }
    }
}

/// Product catalog for one storefront.
#[derive(Debug, Default)]
pub struct Catalog {
    products: SlotMap<ProductKey, Product>,
    ids: FxHashMap<String, ProductKey>,
}

impl Catalog {
    /// Build a catalog from already-parsed records.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if two records share an identifier or a
    /// record carries a non-positive price.
    pub fn from_records(
        records: impl IntoIterator<Item = ProductRecord>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Catalog::default();

        for record in records {
            if !record.price.is_sign_positive() || record.price.is_zero() {
                return Err(CatalogError::InvalidPrice {
                    id: record.id,
                    price: record.price,
                });
            }

            if catalog.ids.contains_key(&record.id) {
                return Err(CatalogError::DuplicateId(record.id));
            }

            let id = record.id.clone();
            let key = catalog.products.insert(record.into());

            catalog.ids.insert(id, key);
        }

        Ok(catalog)
    }

    /// Parse a catalog from a JSON reader.
    ///
    /// The document is a flat array of product records.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the JSON cannot be parsed or a record
    /// fails validation.
    pub fn from_reader(reader: impl io::Read) -> Result<Self, CatalogError> {
        let records: Vec<ProductRecord> = serde_json::from_reader(reader)?;

        Self::from_records(records)
    }

    /// Load a catalog from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the file cannot be read or parsed, or a
    /// record fails validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;
        let records: Vec<ProductRecord> = serde_json::from_str(&contents)?;

        Self::from_records(records)
    }

    /// Get a product by its key.
    #[must_use]
    pub fn product(&self, key: ProductKey) -> Option<&Product> {
        self.products.get(key)
    }

    /// Resolve an external identifier to its key.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] if the identifier is unknown.
    pub fn key_of(&self, id: &str) -> Result<ProductKey, CatalogError> {
        self.ids
            .get(id)
            .copied()
            .ok_or_else(|| CatalogError::ProductNotFound(id.to_string()))
    }

    /// Get a product by its external identifier.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ProductNotFound`] if the identifier is unknown.
    pub fn product_by_id(&self, id: &str) -> Result<&Product, CatalogError> {
        let key = self.key_of(id)?;

        self.products
            .get(key)
            .ok_or_else(|| CatalogError::ProductNotFound(id.to_string()))
    }

    /// Iterate over all products.
    pub fn products(&self) -> impl Iterator<Item = (ProductKey, &Product)> {
        self.products.iter()
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
