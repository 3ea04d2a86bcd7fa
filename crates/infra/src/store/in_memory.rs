use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tiendita_catalog::{Category, Product};
use tiendita_core::{CategoryId, Entity, ProductId, SaleId};
use tiendita_sales::{Sale, SaleItem};

use super::r#trait::{StorageError, Store, StoreResult, StoreTx};

#[derive(Debug, Clone)]
struct Versioned<T> {
    row: T,
    version: u64,
}

/// One logical table: versioned rows plus a mutation counter.
///
/// Row versions are drawn from the table counter, which only ever grows, so
/// a deleted-and-reinserted row can never reuse a version another
/// transaction has seen. The counter doubles as the scan version: any
/// mutation invalidates concurrent full scans.
#[derive(Debug)]
struct Table<T: Entity> {
    rows: HashMap<T::Id, Versioned<T>>,
    version: u64,
}

impl<T: Entity> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            version: 0,
        }
    }
}

impl<T: Entity + Clone> Table<T> {
    /// Version of a row; 0 means absent.
    fn row_version(&self, id: &T::Id) -> u64 {
        self.rows.get(id).map(|v| v.version).unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
enum WriteOp<T: Entity> {
    Put(T),
    Delete(T::Id),
}

/// Per-table transaction state: optimistic read set + buffered writes.
#[derive(Debug)]
struct TxTable<T: Entity> {
    /// Row versions observed by point reads (0 = absent at read time).
    reads: HashMap<T::Id, u64>,
    /// Table version observed by the first full scan, if any.
    scan: Option<u64>,
    writes: Vec<WriteOp<T>>,
}

impl<T: Entity> Default for TxTable<T> {
    fn default() -> Self {
        Self {
            reads: HashMap::new(),
            scan: None,
            writes: Vec::new(),
        }
    }
}

impl<T: Entity + Clone> TxTable<T> {
    fn get(&mut self, table: &Table<T>, id: &T::Id) -> Option<T> {
        // First observation wins: validate against the earliest version seen.
        self.reads
            .entry(id.clone())
            .or_insert_with(|| table.row_version(id));
        table.rows.get(id).map(|v| v.row.clone())
    }

    fn find(&mut self, table: &Table<T>, pred: &dyn Fn(&T) -> bool) -> Vec<T> {
        self.scan.get_or_insert(table.version);
        let mut rows: Vec<T> = table
            .rows
            .values()
            .filter(|v| pred(&v.row))
            .map(|v| v.row.clone())
            .collect();
        // UUIDv7 ids sort by creation time, giving listings a stable order.
        rows.sort_by(|a, b| a.id().cmp(b.id()));
        rows
    }

    fn put(&mut self, row: T) {
        self.writes.push(WriteOp::Put(row));
    }

    fn delete(&mut self, id: T::Id) {
        self.writes.push(WriteOp::Delete(id));
    }

    fn validate(&self, table: &Table<T>) -> Result<(), String> {
        if let Some(seen) = self.scan {
            if table.version != seen {
                return Err(format!(
                    "table changed since scan (version {seen} -> {})",
                    table.version
                ));
            }
        }
        for (id, seen) in &self.reads {
            let current = table.row_version(id);
            if current != *seen {
                return Err(format!(
                    "row {id:?} changed since read (version {seen} -> {current})"
                ));
            }
        }
        Ok(())
    }

    fn apply(self, table: &mut Table<T>) {
        for op in self.writes {
            match op {
                WriteOp::Put(row) => {
                    table.version += 1;
                    let id = row.id().clone();
                    table.rows.insert(
                        id,
                        Versioned {
                            row,
                            version: table.version,
                        },
                    );
                }
                WriteOp::Delete(id) => {
                    if table.rows.remove(&id).is_some() {
                        table.version += 1;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Default)]
struct Tables {
    categories: Table<Category>,
    products: Table<Product>,
    sales: Table<Sale>,
    sale_items: Table<SaleItem>,
}

/// In-memory transactional store with optimistic concurrency.
///
/// Intended for tests/dev. Not optimized for performance: reads clone rows
/// and scans walk whole tables.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for InMemoryStore {
    type Tx = InMemoryTx;

    fn begin(&self) -> StoreResult<InMemoryTx> {
        Ok(InMemoryTx {
            inner: Arc::clone(&self.inner),
            categories: TxTable::default(),
            products: TxTable::default(),
            sales: TxTable::default(),
            sale_items: TxTable::default(),
        })
    }
}

/// A transaction against [`InMemoryStore`]. Dropping it without committing
/// discards all buffered writes.
#[derive(Debug)]
pub struct InMemoryTx {
    inner: Arc<RwLock<Tables>>,
    categories: TxTable<Category>,
    products: TxTable<Product>,
    sales: TxTable<Sale>,
    sale_items: TxTable<SaleItem>,
}

fn poisoned(_: impl core::fmt::Debug) -> StorageError {
    StorageError::Backend("store lock poisoned".to_string())
}

impl StoreTx for InMemoryTx {
    fn get_category(&mut self, id: CategoryId) -> StoreResult<Option<Category>> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(self.categories.get(&tables.categories, &id))
    }

    fn put_category(&mut self, row: Category) -> StoreResult<()> {
        self.categories.put(row);
        Ok(())
    }

    fn delete_category(&mut self, id: CategoryId) -> StoreResult<()> {
        self.categories.delete(id);
        Ok(())
    }

    fn find_categories(
        &mut self,
        pred: &dyn Fn(&Category) -> bool,
    ) -> StoreResult<Vec<Category>> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(self.categories.find(&tables.categories, pred))
    }

    fn get_product(&mut self, id: ProductId) -> StoreResult<Option<Product>> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(self.products.get(&tables.products, &id))
    }

    fn put_product(&mut self, row: Product) -> StoreResult<()> {
        self.products.put(row);
        Ok(())
    }

    fn delete_product(&mut self, id: ProductId) -> StoreResult<()> {
        self.products.delete(id);
        Ok(())
    }

    fn find_products(&mut self, pred: &dyn Fn(&Product) -> bool) -> StoreResult<Vec<Product>> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(self.products.find(&tables.products, pred))
    }

    fn get_sale(&mut self, id: SaleId) -> StoreResult<Option<Sale>> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(self.sales.get(&tables.sales, &id))
    }

    fn put_sale(&mut self, row: Sale) -> StoreResult<()> {
        self.sales.put(row);
        Ok(())
    }

    fn find_sales(&mut self, pred: &dyn Fn(&Sale) -> bool) -> StoreResult<Vec<Sale>> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(self.sales.find(&tables.sales, pred))
    }

    fn put_sale_item(&mut self, row: SaleItem) -> StoreResult<()> {
        self.sale_items.put(row);
        Ok(())
    }

    fn find_sale_items(
        &mut self,
        pred: &dyn Fn(&SaleItem) -> bool,
    ) -> StoreResult<Vec<SaleItem>> {
        let tables = self.inner.read().map_err(poisoned)?;
        Ok(self.sale_items.find(&tables.sale_items, pred))
    }

    fn commit(self) -> StoreResult<()> {
        let InMemoryTx {
            inner,
            categories,
            products,
            sales,
            sale_items,
        } = self;

        let mut tables = inner.write().map_err(poisoned)?;

        categories
            .validate(&tables.categories)
            .map_err(StorageError::Conflict)?;
        products
            .validate(&tables.products)
            .map_err(StorageError::Conflict)?;
        sales
            .validate(&tables.sales)
            .map_err(StorageError::Conflict)?;
        sale_items
            .validate(&tables.sale_items)
            .map_err(StorageError::Conflict)?;

        categories.apply(&mut tables.categories);
        products.apply(&mut tables.products);
        sales.apply(&mut tables.sales);
        sale_items.apply(&mut tables.sale_items);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tiendita_catalog::NewCategory;

    fn category(name: &str) -> Category {
        Category::create(NewCategory::named(name), Utc::now()).unwrap()
    }

    #[test]
    fn committed_writes_are_visible_to_later_transactions() {
        let store = InMemoryStore::new();
        let row = category("Bebidas");
        let id = row.id_typed();

        let mut tx = store.begin().unwrap();
        tx.put_category(row.clone()).unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin().unwrap();
        assert_eq!(tx.get_category(id).unwrap(), Some(row));
    }

    #[test]
    fn dropped_transaction_rolls_back() {
        let store = InMemoryStore::new();
        let row = category("Bebidas");
        let id = row.id_typed();

        let mut tx = store.begin().unwrap();
        tx.put_category(row).unwrap();
        drop(tx);

        let mut tx = store.begin().unwrap();
        assert_eq!(tx.get_category(id).unwrap(), None);
    }

    #[test]
    fn concurrent_writers_to_the_same_row_conflict() {
        let store = InMemoryStore::new();
        let row = category("Bebidas");
        let id = row.id_typed();

        let mut setup = store.begin().unwrap();
        setup.put_category(row).unwrap();
        setup.commit().unwrap();

        let mut first = store.begin().unwrap();
        let mut second = store.begin().unwrap();

        let mut from_first = first.get_category(id).unwrap().unwrap();
        let mut from_second = second.get_category(id).unwrap().unwrap();

        from_first
            .apply_patch(Default::default(), Utc::now())
            .unwrap();
        from_second
            .apply_patch(Default::default(), Utc::now())
            .unwrap();

        first.put_category(from_first).unwrap();
        second.put_category(from_second).unwrap();

        first.commit().unwrap();
        let err = second.commit().unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[test]
    fn read_of_absent_row_conflicts_with_concurrent_insert() {
        let store = InMemoryStore::new();
        let row = category("Bebidas");
        let id = row.id_typed();

        // Transaction A observes the row absent, then bases a write on that.
        let mut a = store.begin().unwrap();
        assert_eq!(a.get_category(id).unwrap(), None);
        a.put_category(category("Snacks")).unwrap();

        // Transaction B inserts the row first.
        let mut b = store.begin().unwrap();
        b.put_category(row).unwrap();
        b.commit().unwrap();

        let err = a.commit().unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[test]
    fn scan_conflicts_with_any_table_mutation() {
        let store = InMemoryStore::new();

        let mut a = store.begin().unwrap();
        assert!(a.find_categories(&|_| true).unwrap().is_empty());
        a.put_category(category("Bebidas")).unwrap();

        let mut b = store.begin().unwrap();
        b.put_category(category("Snacks")).unwrap();
        b.commit().unwrap();

        let err = a.commit().unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[test]
    fn writes_to_disjoint_rows_do_not_conflict() {
        let store = InMemoryStore::new();
        let bebidas = category("Bebidas");
        let snacks = category("Snacks");

        let mut setup = store.begin().unwrap();
        setup.put_category(bebidas.clone()).unwrap();
        setup.put_category(snacks.clone()).unwrap();
        setup.commit().unwrap();

        let mut a = store.begin().unwrap();
        let mut b = store.begin().unwrap();

        let mut row_a = a.get_category(bebidas.id_typed()).unwrap().unwrap();
        let mut row_b = b.get_category(snacks.id_typed()).unwrap().unwrap();
        row_a.apply_patch(Default::default(), Utc::now()).unwrap();
        row_b.apply_patch(Default::default(), Utc::now()).unwrap();
        a.put_category(row_a).unwrap();
        b.put_category(row_b).unwrap();

        a.commit().unwrap();
        b.commit().unwrap();
    }

    #[test]
    fn find_returns_rows_in_id_order() {
        let store = InMemoryStore::new();
        let first = category("A");
        // UUIDv7 ordering is only guaranteed across milliseconds.
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = category("B");

        let mut tx = store.begin().unwrap();
        // Insert out of order; listing still comes back by creation.
        tx.put_category(second.clone()).unwrap();
        tx.put_category(first.clone()).unwrap();
        tx.commit().unwrap();

        let mut tx = store.begin().unwrap();
        let rows = tx.find_categories(&|_| true).unwrap();
        assert_eq!(
            rows.iter().map(Category::id_typed).collect::<Vec<_>>(),
            vec![first.id_typed(), second.id_typed()]
        );
    }
}
