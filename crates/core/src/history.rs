//! Append-only record of finished bills, one JSON object per line.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::billing::{Bill, BilledLine};
use crate::config::AppConfig;
use crate::errors::HistoryError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BillId(pub String);

impl fmt::Display for BillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillRecord {
    pub id: BillId,
    pub created_at: DateTime<Utc>,
    pub total: Decimal,
    pub items: Vec<BilledLine>,
}

#[derive(Clone, Debug)]
pub struct BillHistory {
    path: PathBuf,
}

impl BillHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.storage.bills_path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamps `bill` with a fresh id and the current time and appends it.
    pub fn record(&self, bill: Bill) -> Result<BillRecord, HistoryError> {
        let record = BillRecord {
            id: BillId(Uuid::new_v4().to_string()),
            created_at: Utc::now(),
            total: bill.total,
            items: bill.lines,
        };

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let write_error = |source| HistoryError::Write { path: self.path.clone(), source };
        let mut file =
            OpenOptions::new().create(true).append(true).open(&self.path).map_err(write_error)?;
        file.write_all(line.as_bytes()).map_err(write_error)?;

        info!(
            event_name = "history.bill_recorded",
            bill_id = %record.id,
            items = record.items.len(),
            total = %record.total,
            "bill recorded"
        );
        Ok(record)
    }

    /// Every recorded bill, oldest first. A missing file means no bills yet.
    pub fn load(&self) -> Result<Vec<BillRecord>, HistoryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(HistoryError::Read { path: self.path.clone(), source }),
        };

        raw.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line).map_err(|source| HistoryError::Decode {
                    path: self.path.clone(),
                    line: index + 1,
                    source,
                })
            })
            .collect()
    }
}
