//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a deterministic, per-request failure surfaced
/// synchronously to the caller; none is fatal to the process and none is
/// retried internally. `Storage` is the one infrastructure-shaped variant:
/// it wraps failures of the storage collaborator (conflicts, backend
/// trouble) and is the only kind a caller may reasonably retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced category/product/sale does not exist, or a filtered
    /// list query matched zero rows (a deliberate convention: callers
    /// distinguish "no data" from "valid empty answer" by this error).
    #[error("not found")]
    NotFound,

    /// Category/product creation with a name already in use
    /// (case-sensitive exact match, active and inactive rows alike).
    #[error("name already in use: {0}")]
    DuplicateName(String),

    /// A negative stock value was supplied on create/update.
    #[error("stock cannot be negative (got {0})")]
    InvalidStock(i64),

    /// A non-positive quantity was supplied when appending a sale item.
    #[error("quantity must be positive (got {0})")]
    InvalidQuantity(i64),

    /// Product creation against a deactivated category.
    #[error("category is inactive")]
    CategoryInactive,

    /// Sale-item append against a missing, deactivated, or retired product.
    #[error("product not found or inactive")]
    ProductNotFound,

    /// Sale-item append against a missing sale.
    #[error("sale not found")]
    SaleNotFound,

    /// The requested quantity exceeds the available stock.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// A value failed validation (e.g. an empty name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The storage collaborator failed (commit conflict, backend error).
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}
