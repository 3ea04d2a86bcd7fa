//! Application services: one storage transaction per operation.
//!
//! Services orchestrate the pure domain logic against the storage
//! collaborator. They hold no state of their own and never retry; a commit
//! conflict surfaces to the caller as `DomainError::Storage`.

pub mod catalog;
pub mod sales;

pub use catalog::CatalogService;
pub use sales::SalesService;
