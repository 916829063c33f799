use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub price: Decimal,
}

impl ProductRecord {
    pub fn new(id: i64, name: impl Into<String>, quantity: i64, price: Decimal) -> Self {
        Self { id: ProductId(id), name: name.into(), quantity, price }
    }

    /// Cost of `quantity` units at this record's unit price, `None` on decimal overflow.
    pub fn line_cost(&self, quantity: i64) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(quantity))
    }
}

pub const TABLE_RULE: &str = "---------------------------------------------------";

/// Column header shared by inventory listings and the low-stock report.
pub fn table_header() -> String {
    format!("{:<5}{:<25}{:<10}{:<10}", "ID", "Name", "Qty", "Price")
}

/// Two-decimal money rendering, rounding half away from zero.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

impl fmt::Display for ProductRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let price = format_amount(self.price);
        write!(f, "{:<5}{:<25}{:<10}{:<10}", self.id.0, self.name, self.quantity, price)
    }
}
