use std::path::PathBuf;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::product::ProductId;

/// Why a single persisted product line could not be decoded.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected 4 fields, found {found}")]
    FieldCount { found: usize },
    #[error("invalid id `{0}`")]
    InvalidId(String),
    #[error("invalid quantity `{0}`")]
    InvalidQuantity(String),
    #[error("invalid price `{0}`")]
    InvalidPrice(String),
    #[error("unreadable row: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("could not read products file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not write products file `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("could not encode product records: {0}")]
    Encode(#[from] csv::Error),
    #[error("product ID {0} not found")]
    NotFound(ProductId),
    #[error("product ID {0} already exists")]
    DuplicateId(ProductId),
    #[error("price for product ID {id} must not be negative (got {price})")]
    NegativePrice { id: ProductId, price: Decimal },
}

#[derive(Debug, Error)]
pub enum BillingError {
    #[error("quantity must be positive (got {0})")]
    InvalidQuantity(i64),
    #[error("product ID {0} not found")]
    ProductNotFound(ProductId),
    #[error("not enough stock for '{name}': only {available} available")]
    InsufficientStock { id: ProductId, name: String, available: i64, requested: i64 },
    #[error("amount for product ID {0} is too large to bill")]
    AmountOverflow(ProductId),
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("could not read credentials file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not write credentials file `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("could not read bill history `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not write bill history `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("could not encode bill: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("bill history `{path}` line {line} is unreadable: {source}")]
    Decode { path: PathBuf, line: usize, source: serde_json::Error },
}

impl InventoryError {
    /// True when the failure happened while touching the products file.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Write { .. } | Self::Encode(_))
    }
}

impl BillingError {
    /// Line-level rejections leave the session usable; persistence failures do not.
    pub fn is_line_rejection(&self) -> bool {
        !matches!(self, Self::Inventory(error) if error.is_persistence())
    }
}
