use thiserror::Error;

use tiendita_catalog::{Category, Product};
use tiendita_core::{CategoryId, DomainError, ProductId, SaleId};
use tiendita_sales::{Sale, SaleItem};

/// Storage operation error.
///
/// These are **infrastructure errors** (commit conflicts, backend trouble)
/// as opposed to domain errors (validation, invariants). Services convert
/// them into `DomainError::Storage` at the boundary; callers may treat that
/// kind as retryable, the core never retries.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Optimistic concurrency check failed at commit: a row or table read
    /// by this transaction changed underneath it.
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// The backing store itself failed (lock poisoning, connectivity, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<StorageError> for DomainError {
    fn from(value: StorageError) -> Self {
        DomainError::storage(value.to_string())
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StorageError>;

/// Transactional storage collaborator.
///
/// One logical table per entity; `begin` opens a transaction against the
/// current committed state. Implementations must make a committed
/// transaction atomic: either every buffered write lands or none does.
pub trait Store: Send + Sync {
    type Tx: StoreTx;

    /// Open a new transaction.
    fn begin(&self) -> StoreResult<Self::Tx>;
}

/// A single storage transaction.
///
/// ## Semantics
///
/// - **Reads** observe the committed snapshot as of the moment of the read;
///   buffered writes of the same transaction are *not* visible to later
///   reads (no operation in this core reads its own writes).
/// - **Writes** (`put_*`/`delete_*`) are buffered and become visible
///   atomically at `commit`.
/// - **Commit** validates an optimistic read set — every row read must
///   still be at the version it was read at (an absent row must still be
///   absent), and every table scanned by a `find_*` must be unchanged —
///   and fails with `StorageError::Conflict` otherwise. This is what makes
///   concurrent appends against the same product serializable: both read
///   the product row, the first commit bumps its version, the second
///   commit aborts with no partial application.
/// - **Rollback** is dropping the transaction without committing.
///
/// The sale aggregate is append-only, so the sale and sale-item tables
/// expose no delete.
pub trait StoreTx {
    // Categories
    fn get_category(&mut self, id: CategoryId) -> StoreResult<Option<Category>>;
    fn put_category(&mut self, row: Category) -> StoreResult<()>;
    fn delete_category(&mut self, id: CategoryId) -> StoreResult<()>;
    fn find_categories(&mut self, pred: &dyn Fn(&Category) -> bool)
    -> StoreResult<Vec<Category>>;

    // Products
    fn get_product(&mut self, id: ProductId) -> StoreResult<Option<Product>>;
    fn put_product(&mut self, row: Product) -> StoreResult<()>;
    fn delete_product(&mut self, id: ProductId) -> StoreResult<()>;
    fn find_products(&mut self, pred: &dyn Fn(&Product) -> bool) -> StoreResult<Vec<Product>>;

    // Sales (append-only aggregate: no delete)
    fn get_sale(&mut self, id: SaleId) -> StoreResult<Option<Sale>>;
    fn put_sale(&mut self, row: Sale) -> StoreResult<()>;
    fn find_sales(&mut self, pred: &dyn Fn(&Sale) -> bool) -> StoreResult<Vec<Sale>>;

    // Sale items (append-only: put and find only)
    fn put_sale_item(&mut self, row: SaleItem) -> StoreResult<()>;
    fn find_sale_items(&mut self, pred: &dyn Fn(&SaleItem) -> bool)
    -> StoreResult<Vec<SaleItem>>;

    /// Atomically apply the buffered writes.
    fn commit(self) -> StoreResult<()>;
}
