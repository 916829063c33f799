pub mod codec;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::product::{ProductId, ProductRecord};
use crate::errors::{InventoryError, RecordError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    File,
    /// No products file yet; the store starts empty and the first save creates it.
    Missing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedLine {
    pub line: u64,
    pub reason: RecordError,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadReport {
    pub source: LoadSource,
    pub loaded: usize,
    pub skipped: Vec<SkippedLine>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockChange {
    pub id: ProductId,
    pub name: String,
    pub previous: i64,
    pub quantity: i64,
}

/// File-backed product list. Insertion order is preserved and every mutation
/// rewrites the whole file.
#[derive(Debug)]
pub struct InventoryStore {
    path: PathBuf,
    products: Vec<ProductRecord>,
    unique_ids: bool,
}

impl InventoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), products: Vec::new(), unique_ids: false }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.storage.products_path).with_unique_ids(config.inventory.unique_ids)
    }

    /// Reject `add` calls whose id is already present.
    pub fn with_unique_ids(mut self, enabled: bool) -> Self {
        self.unique_ids = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&mut self) -> Result<LoadReport, InventoryError> {
        self.products.clear();

        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                info!(
                    event_name = "inventory.load",
                    path = %self.path.display(),
                    "products file not found, starting with an empty store"
                );
                return Ok(LoadReport { source: LoadSource::Missing, loaded: 0, skipped: vec![] });
            }
            Err(source) => return Err(InventoryError::Read { path: self.path.clone(), source }),
        };

        let mut skipped = Vec::new();
        for decoded in codec::decode(&raw) {
            match decoded.result {
                Ok(record) => self.products.push(record),
                Err(reason) => {
                    warn!(
                        event_name = "inventory.load.skipped_line",
                        path = %self.path.display(),
                        line = decoded.line,
                        reason = %reason,
                        "skipping malformed product line"
                    );
                    skipped.push(SkippedLine { line: decoded.line, reason });
                }
            }
        }

        info!(
            event_name = "inventory.load",
            path = %self.path.display(),
            loaded = self.products.len(),
            skipped = skipped.len(),
            "products loaded"
        );
        Ok(LoadReport { source: LoadSource::File, loaded: self.products.len(), skipped })
    }

    pub fn save(&self) -> Result<(), InventoryError> {
        let encoded = codec::encode(&self.products)?;
        fs::write(&self.path, encoded)
            .map_err(|source| InventoryError::Write { path: self.path.clone(), source })?;

        info!(
            event_name = "inventory.save",
            path = %self.path.display(),
            records = self.products.len(),
            "products saved"
        );
        Ok(())
    }

    pub fn add(&mut self, record: ProductRecord) -> Result<(), InventoryError> {
        if record.price < Decimal::ZERO {
            return Err(InventoryError::NegativePrice { id: record.id, price: record.price });
        }
        if self.unique_ids && self.find_by_id(record.id).is_some() {
            return Err(InventoryError::DuplicateId(record.id));
        }

        self.products.push(record);
        if let Err(error) = self.save() {
            self.products.pop();
            return Err(error);
        }
        Ok(())
    }

    /// First record carrying `id`.
    pub fn find_by_id(&self, id: ProductId) -> Option<&ProductRecord> {
        self.products.iter().find(|product| product.id == id)
    }

    /// Applies `delta` to the first record carrying `id`. There is no floor:
    /// a negative delta may take the quantity below zero.
    pub fn adjust_stock(&mut self, id: ProductId, delta: i64) -> Result<StockChange, InventoryError> {
        let product = self
            .products
            .iter_mut()
            .find(|product| product.id == id)
            .ok_or(InventoryError::NotFound(id))?;

        let previous = product.quantity;
        product.quantity = previous.saturating_add(delta);
        let change = StockChange {
            id,
            name: product.name.clone(),
            previous,
            quantity: product.quantity,
        };

        if let Err(error) = self.save() {
            if let Some(product) = self.products.iter_mut().find(|product| product.id == id) {
                product.quantity = previous;
            }
            return Err(error);
        }

        info!(
            event_name = "inventory.stock_adjusted",
            product_id = id.0,
            delta,
            quantity = change.quantity,
            "stock adjusted"
        );
        Ok(change)
    }

    pub fn price_of(&self, id: ProductId) -> Option<Decimal> {
        self.find_by_id(id).map(|product| product.price)
    }

    pub fn all(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
