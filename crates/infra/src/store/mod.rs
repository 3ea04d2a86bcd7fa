//! Transactional storage boundary.
//!
//! This module defines an infrastructure-facing abstraction for reading and
//! writing catalog/sale entities inside an atomic transaction, without
//! making any storage assumptions.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{InMemoryStore, InMemoryTx};
pub use r#trait::{StorageError, Store, StoreResult, StoreTx};
