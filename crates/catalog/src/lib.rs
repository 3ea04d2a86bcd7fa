//! Catalog domain module: categories and products.
//!
//! This crate contains the business rules for the reference data a sale
//! draws from, implemented purely as deterministic domain logic (no IO, no
//! HTTP, no storage). Uniqueness checks and foreign-key resolution require
//! the stored set and therefore live in the application services.

pub mod category;
pub mod product;

pub use category::{Category, CategoryPatch, NewCategory};
pub use product::{NewProduct, Product, ProductFilter, ProductPatch};
