use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::product::ProductId;
use crate::errors::BillingError;
use crate::inventory::InventoryStore;

/// Product id that ends interactive bill entry.
pub const BILL_SENTINEL: i64 = -1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilledLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub line_cost: Decimal,
    pub remaining_stock: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    pub lines: Vec<BilledLine>,
    pub total: Decimal,
}

/// One bill in progress. Every accepted line deducts stock through
/// [`InventoryStore::adjust_stock`] immediately, so the products file is
/// already up to date when the session ends.
pub struct BillingSession<'a> {
    store: &'a mut InventoryStore,
    bill: Bill,
}

impl<'a> BillingSession<'a> {
    pub fn new(store: &'a mut InventoryStore) -> Self {
        Self { store, bill: Bill::default() }
    }

    pub fn bill_line(&mut self, id: ProductId, quantity: i64) -> Result<BilledLine, BillingError> {
        if quantity <= 0 {
            return Err(BillingError::InvalidQuantity(quantity));
        }

        let product = self.store.find_by_id(id).ok_or(BillingError::ProductNotFound(id))?;
        if product.quantity < quantity {
            return Err(BillingError::InsufficientStock {
                id,
                name: product.name.clone(),
                available: product.quantity,
                requested: quantity,
            });
        }

        let unit_price = product.price;
        let line_cost = product.line_cost(quantity).ok_or(BillingError::AmountOverflow(id))?;
        let total =
            self.bill.total.checked_add(line_cost).ok_or(BillingError::AmountOverflow(id))?;

        let change = self.store.adjust_stock(id, -quantity)?;
        self.bill.total = total;

        let line = BilledLine {
            product_id: id,
            name: change.name,
            quantity,
            unit_price,
            line_cost,
            remaining_stock: change.quantity,
        };
        info!(
            event_name = "billing.line_billed",
            product_id = id.0,
            quantity,
            line_cost = %line_cost,
            total = %self.bill.total,
            "bill line accepted"
        );
        self.bill.lines.push(line.clone());
        Ok(line)
    }

    pub fn total(&self) -> Decimal {
        self.bill.total
    }

    pub fn lines(&self) -> &[BilledLine] {
        &self.bill.lines
    }

    pub fn finish(self) -> Bill {
        self.bill
    }
}
