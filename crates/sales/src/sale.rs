use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tiendita_core::{Entity, ProductId, SaleId, SaleItemId};

/// Entity: sale. Created empty and grown monotonically by item insertion;
/// no operation removes an item or decreases the total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    id: SaleId,
    sale_date: DateTime<Utc>,
    /// Accumulated total in smallest currency unit. Derived from the items,
    /// never independently settable.
    total: u64,
    /// Number of items appended so far; the next item gets `line_count + 1`.
    line_count: u32,
}

impl Sale {
    /// Open an empty sale: no items, zero total.
    pub fn open(now: DateTime<Utc>) -> Self {
        Self {
            id: SaleId::new(),
            sale_date: now,
            total: 0,
            line_count: 0,
        }
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn sale_date(&self) -> DateTime<Utc> {
        self.sale_date
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn line_count(&self) -> u32 {
        self.line_count
    }

    /// Claim the next 1-based line number for an item being appended.
    pub fn next_line_no(&mut self) -> u32 {
        self.line_count += 1;
        self.line_count
    }

    /// Accumulate one line into the total. `quantity` has already been
    /// validated positive by the stock reservation.
    pub fn accumulate(&mut self, unit_price: u64, quantity: i64) {
        self.total += unit_price * quantity as u64;
    }
}

impl Entity for Sale {
    type Id = SaleId;

    fn id(&self) -> &SaleId {
        &self.id
    }
}

/// Entity: sale line item. Immutable once created — it records a fact, not
/// a live reference: `unit_price` is a frozen copy of the product price at
/// insertion time, decoupled from later price changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    id: SaleItemId,
    sale_id: SaleId,
    product_id: ProductId,
    /// 1-based insertion order within the sale.
    line_no: u32,
    quantity: i64,
    /// Price snapshot in smallest currency unit.
    unit_price: u64,
}

impl SaleItem {
    /// Record a line item. All values have been validated by the append
    /// workflow; this only freezes them.
    pub fn record(
        sale_id: SaleId,
        product_id: ProductId,
        line_no: u32,
        quantity: i64,
        unit_price: u64,
    ) -> Self {
        Self {
            id: SaleItemId::new(),
            sale_id,
            product_id,
            line_no,
            quantity,
            unit_price,
        }
    }

    pub fn id_typed(&self) -> SaleItemId {
        self.id
    }

    pub fn sale_id(&self) -> SaleId {
        self.sale_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn line_no(&self) -> u32 {
        self.line_no
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> u64 {
        self.unit_price
    }

    /// The line's contribution to the sale total.
    pub fn line_total(&self) -> u64 {
        self.unit_price * self.quantity as u64
    }
}

impl Entity for SaleItem {
    type Id = SaleItemId;

    fn id(&self) -> &SaleItemId {
        &self.id
    }
}
