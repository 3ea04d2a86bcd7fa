use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tiendita_core::{CategoryId, DomainError, DomainResult, Entity, ProductId};

/// Input for product creation (already-validated scalars from the edge).
///
/// `price` is in the smallest currency unit (cents). Foreign-key resolution
/// of `category_id` happens in the service layer against the stored set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub price: Option<u64>,
    pub stock: Option<i64>,
    pub category_id: CategoryId,
}

/// Partial update: only provided fields overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub price: Option<u64>,
    pub stock: Option<i64>,
}

/// Entity: product (reference data with an active/inactive lifecycle and a
/// soft-delete state).
///
/// A "deleted" product is never removed from storage: it is retired, which
/// deactivates it and zeroes price and stock. Retired products are rejected
/// by the sale flow like missing ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    active: bool,
    /// Price in smallest currency unit (e.g., cents).
    price: Option<u64>,
    stock: Option<i64>,
    category_id: CategoryId,
    retired: bool,
}

impl Product {
    /// Create a new product. Checks the name is non-empty and a provided
    /// stock is non-negative; name uniqueness and category resolution are
    /// the caller's responsibility.
    pub fn create(input: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        if let Some(stock) = input.stock {
            if stock < 0 {
                return Err(DomainError::InvalidStock(stock));
            }
        }
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            id: ProductId::new(),
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
            active: input.active,
            price: input.price,
            stock: input.stock,
            category_id: input.category_id,
            retired: false,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn active(&self) -> bool {
        self.active
    }

    pub fn price(&self) -> Option<u64> {
        self.price
    }

    pub fn stock(&self) -> Option<i64> {
        self.stock
    }

    pub fn category_id(&self) -> CategoryId {
        self.category_id
    }

    pub fn retired(&self) -> bool {
        self.retired
    }

    /// Check if the product can appear on a sale (active and not retired).
    pub fn sellable(&self) -> bool {
        self.active && !self.retired
    }

    /// Stock available to the sale flow; a product without a stock value
    /// has nothing to sell.
    pub fn available_stock(&self) -> i64 {
        self.stock.unwrap_or(0)
    }

    /// Apply a partial update. Only provided fields overwrite; `updated_at`
    /// is always refreshed. A provided negative stock is rejected before
    /// any field is touched.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(stock) = patch.stock {
            if stock < 0 {
                return Err(DomainError::InvalidStock(stock));
            }
        }
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        if let Some(price) = patch.price {
            self.price = Some(price);
        }
        if let Some(stock) = patch.stock {
            self.stock = Some(stock);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Soft delete: deactivate, zero price and stock, and mark retired.
    /// The row stays in storage.
    pub fn retire(&mut self, now: DateTime<Utc>) {
        self.active = false;
        self.price = Some(0);
        self.stock = Some(0);
        self.retired = true;
        self.updated_at = now;
    }

    /// Take `quantity` units out of stock for a sale and return the unit
    /// price snapshot (a priceless product sells at 0).
    ///
    /// Rejects non-positive quantities and quantities exceeding the
    /// available stock; on error the product is left untouched.
    pub fn reserve(&mut self, quantity: i64, now: DateTime<Utc>) -> DomainResult<u64> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity(quantity));
        }

        let available = self.available_stock();
        if available < quantity {
            return Err(DomainError::InsufficientStock {
                requested: quantity,
                available,
            });
        }

        self.stock = Some(available - quantity);
        self.updated_at = now;
        Ok(self.price.unwrap_or(0))
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }
}

/// Read-side filter over products. `None` fields do not constrain; ranges
/// are inclusive and only match products that carry the filtered value.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    pub active: Option<bool>,
    pub price_range: Option<(u64, u64)>,
    pub stock_range: Option<(i64, i64)>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category_id) = self.category_id {
            if product.category_id() != category_id {
                return false;
            }
        }
        if let Some(active) = self.active {
            if product.active() != active {
                return false;
            }
        }
        if let Some((min, max)) = self.price_range {
            match product.price() {
                Some(price) if price >= min && price <= max => {}
                _ => return false,
            }
        }
        if let Some((min, max)) = self.stock_range {
            match product.stock() {
                Some(stock) if stock >= min && stock <= max => {}
                _ => return false,
            }
        }
        true
    }
}
