//! Sale-aggregate domain module.
//!
//! The sale aggregate (a `Sale` plus its `SaleItem`s) is the one part of the
//! system with cross-entity consistency rules: appending an item decrements
//! product stock and accumulates the sale total in the same unit of work.
//! This crate holds the pure accumulation logic and the read-side projection
//! types; the transactional orchestration lives in the infra services.

pub mod sale;
pub mod view;

pub use sale::{Sale, SaleItem};
pub use view::{ProductSnapshot, SaleItemView, SaleView};
