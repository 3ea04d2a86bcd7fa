//! Read-side projections for the sale listing/detail operations.
//!
//! These are plain records for the presentation layer to serialize
//! directly: a sale with its items in insertion order, each carrying a
//! snapshot of the product as it currently stands in the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tiendita_catalog::Product;
use tiendita_core::{ProductId, SaleId, SaleItemId};

use crate::sale::{Sale, SaleItem};

/// Projection of a product as embedded in a sale view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub stock: Option<i64>,
}

impl ProductSnapshot {
    pub fn of(product: &Product) -> Self {
        Self {
            product_id: product.id_typed(),
            name: product.name().to_string(),
            description: product.description().map(str::to_string),
            price: product.price(),
            stock: product.stock(),
        }
    }
}

/// One line of a sale view. `product` is `None` only if the product row
/// has vanished, which the catalog's soft-delete rules prevent; it is kept
/// optional so the projection never invents data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemView {
    pub item_id: SaleItemId,
    pub line_no: u32,
    pub quantity: i64,
    pub unit_price: u64,
    pub product: Option<ProductSnapshot>,
}

/// A sale with its items eagerly loaded, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleView {
    pub sale_id: SaleId,
    pub sale_date: DateTime<Utc>,
    pub total: u64,
    pub items: Vec<SaleItemView>,
}

impl SaleView {
    /// Project a sale with its items and product snapshots. Items are
    /// ordered by line number, i.e. insertion order.
    pub fn project(sale: &Sale, items: &[(SaleItem, Option<Product>)]) -> Self {
        let mut views: Vec<SaleItemView> = items
            .iter()
            .map(|(item, product)| SaleItemView {
                item_id: item.id_typed(),
                line_no: item.line_no(),
                quantity: item.quantity(),
                unit_price: item.unit_price(),
                product: product.as_ref().map(ProductSnapshot::of),
            })
            .collect();
        views.sort_by_key(|view| view.line_no);

        Self {
            sale_id: sale.id_typed(),
            sale_date: sale.sale_date(),
            total: sale.total(),
            items: views,
        }
    }
}
