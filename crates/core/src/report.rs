use crate::domain::product::ProductRecord;
use crate::inventory::InventoryStore;

use std::fmt;

pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// How urgently a reported record needs restocking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StockLevel {
    Low,
    /// Nothing left on hand (or oversold).
    Critical,
}

impl StockLevel {
    pub fn of(record: &ProductRecord) -> Self {
        if record.quantity <= 0 {
            Self::Critical
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("Low"),
            Self::Critical => f.write_str("Critical (Out of Stock)"),
        }
    }
}

/// Records whose quantity is strictly below `threshold`, in store order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LowStockReport<'a> {
    pub threshold: i64,
    pub records: Vec<&'a ProductRecord>,
}

impl<'a> LowStockReport<'a> {
    pub fn build(store: &'a InventoryStore, threshold: i64) -> Self {
        let records =
            store.all().iter().filter(|product| product.quantity < threshold).collect();
        Self { threshold, records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn critical_count(&self) -> usize {
        self.records.iter().filter(|record| StockLevel::of(record) == StockLevel::Critical).count()
    }
}
