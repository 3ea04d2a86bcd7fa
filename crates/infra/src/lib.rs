//! Infrastructure layer: the storage collaborator and the application
//! services that execute each catalog/sale operation as one transaction.

pub mod service;
pub mod store;

pub use service::{CatalogService, SalesService};
pub use store::{InMemoryStore, StorageError, Store, StoreResult, StoreTx};
