pub mod access;
pub mod billing;
pub mod config;
pub mod domain;
pub mod errors;
pub mod history;
pub mod inventory;
pub mod report;

pub use access::{AccessGate, Credential};
pub use billing::{Bill, BilledLine, BillingSession, BILL_SENTINEL};
pub use domain::product::{format_amount, ProductId, ProductRecord};
pub use errors::{AccessError, BillingError, HistoryError, InventoryError, RecordError};
pub use history::{BillHistory, BillId, BillRecord};
pub use inventory::{InventoryStore, LoadReport, LoadSource, SkippedLine, StockChange};
pub use report::{LowStockReport, StockLevel, LOW_STOCK_THRESHOLD};
