use chrono::Utc;

use tiendita_core::{DomainError, DomainResult, ProductId, SaleId};
use tiendita_sales::{Sale, SaleItem, SaleView};

use crate::store::{Store, StoreTx};

/// Sale-aggregate operations. Each call runs as a single storage
/// transaction; `append_item` is the one with real cross-entity
/// consistency work.
#[derive(Debug, Clone)]
pub struct SalesService<S: Store> {
    store: S,
}

impl<S: Store> SalesService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Open an empty sale. No validation inputs; only a storage failure
    /// can make this fail.
    pub fn create_sale(&self) -> DomainResult<Sale> {
        let mut tx = self.store.begin()?;
        let sale = Sale::open(Utc::now());
        tx.put_sale(sale.clone())?;
        tx.commit()?;

        tracing::debug!(sale_id = %sale.id_typed(), "sale opened");
        Ok(sale)
    }

    /// Append a line item to a sale.
    ///
    /// The whole workflow — resolve sale and product, validate quantity and
    /// stock, snapshot the unit price, decrement stock, accumulate the
    /// total, insert the item — runs inside one transaction: either all of
    /// it commits or none of it does. A concurrent append racing on the
    /// same product (or the same sale) makes one of the two commits fail
    /// with a conflict; the loser surfaces it as `DomainError::Storage`
    /// and nothing is applied.
    pub fn append_item(
        &self,
        sale_id: SaleId,
        product_id: ProductId,
        quantity: i64,
    ) -> DomainResult<SaleItem> {
        let mut tx = self.store.begin()?;

        let mut sale = tx.get_sale(sale_id)?.ok_or(DomainError::SaleNotFound)?;
        let mut product = tx
            .get_product(product_id)?
            .filter(|p| p.sellable())
            .ok_or(DomainError::ProductNotFound)?;

        let now = Utc::now();
        let unit_price = product.reserve(quantity, now)?;

        let line_no = sale.next_line_no();
        sale.accumulate(unit_price, quantity);
        let item = SaleItem::record(sale_id, product_id, line_no, quantity, unit_price);

        tx.put_sale_item(item.clone())?;
        tx.put_product(product)?;
        tx.put_sale(sale)?;
        tx.commit()?;

        tracing::info!(
            sale_id = %sale_id,
            product_id = %product_id,
            quantity,
            unit_price,
            "sale item appended"
        );
        Ok(item)
    }

    /// All sales with their items and product snapshots, in creation order.
    /// Zero sales is `NotFound`, per the empty-list-as-error convention.
    pub fn list_sales(&self) -> DomainResult<Vec<SaleView>> {
        let mut tx = self.store.begin()?;
        let sales = tx.find_sales(&|_| true)?;
        if sales.is_empty() {
            return Err(DomainError::NotFound);
        }

        let mut views = Vec::with_capacity(sales.len());
        for sale in &sales {
            views.push(project(&mut tx, sale)?);
        }
        Ok(views)
    }

    pub fn get_sale(&self, id: SaleId) -> DomainResult<SaleView> {
        let mut tx = self.store.begin()?;
        let sale = tx.get_sale(id)?.ok_or(DomainError::NotFound)?;
        project(&mut tx, &sale)
    }
}

/// Eager-load one sale's items (insertion order) with product snapshots.
fn project<T: StoreTx>(tx: &mut T, sale: &Sale) -> DomainResult<SaleView> {
    let sale_id = sale.id_typed();
    let items = tx.find_sale_items(&|i: &SaleItem| i.sale_id() == sale_id)?;

    let mut joined = Vec::with_capacity(items.len());
    for item in items {
        let product = tx.get_product(item.product_id())?;
        joined.push((item, product));
    }
    Ok(SaleView::project(sale, &joined))
}
