use chrono::Utc;

use tiendita_catalog::{
    Category, CategoryPatch, NewCategory, NewProduct, Product, ProductFilter, ProductPatch,
};
use tiendita_core::{CategoryId, DomainError, DomainResult, ProductId};

use crate::store::{Store, StoreTx};

/// Catalog operations. Each call runs as a single storage transaction;
/// inputs arrive as already-validated, correctly-typed scalars from the
/// transport layer.
#[derive(Debug, Clone)]
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create a category. Fails with `DuplicateName` if any category —
    /// active or not — already carries this exact name.
    pub fn create_category(&self, input: NewCategory) -> DomainResult<Category> {
        let mut tx = self.store.begin()?;

        let name = input.name.clone();
        let pred = |c: &Category| c.name() == name.as_str();
        if !tx.find_categories(&pred)?.is_empty() {
            return Err(DomainError::DuplicateName(name));
        }

        let category = Category::create(input, Utc::now())?;
        tx.put_category(category.clone())?;
        tx.commit()?;

        tracing::debug!(category_id = %category.id_typed(), name = category.name(), "category created");
        Ok(category)
    }

    pub fn get_category(&self, id: CategoryId) -> DomainResult<Category> {
        let mut tx = self.store.begin()?;
        tx.get_category(id)?.ok_or(DomainError::NotFound)
    }

    /// All categories, in creation order. May be empty: the
    /// empty-list-as-error convention applies to the product and sale
    /// queries, not to this listing.
    pub fn list_categories(&self) -> DomainResult<Vec<Category>> {
        let mut tx = self.store.begin()?;
        Ok(tx.find_categories(&|_| true)?)
    }

    pub fn update_category(&self, id: CategoryId, patch: CategoryPatch) -> DomainResult<Category> {
        let mut tx = self.store.begin()?;
        let mut category = tx.get_category(id)?.ok_or(DomainError::NotFound)?;
        category.apply_patch(patch, Utc::now())?;
        tx.put_category(category.clone())?;
        tx.commit()?;

        tracing::debug!(category_id = %id, "category updated");
        Ok(category)
    }

    /// Delete a category and every product that references it, as one unit.
    /// Returns the pre-deletion snapshot. The cascade (rather than
    /// rejecting the delete while products exist) is a deliberate
    /// configuration choice to avoid orphaned products.
    pub fn delete_category(&self, id: CategoryId) -> DomainResult<Category> {
        let mut tx = self.store.begin()?;
        let category = tx.get_category(id)?.ok_or(DomainError::NotFound)?;

        let owned = tx.find_products(&|p: &Product| p.category_id() == id)?;
        let cascade = owned.len();
        for product in owned {
            tx.delete_product(product.id_typed())?;
        }
        tx.delete_category(id)?;
        tx.commit()?;

        tracing::info!(category_id = %id, cascade, "category deleted");
        Ok(category)
    }

    /// Create a product. Checks run in fixed order, first failure wins:
    /// negative stock, unresolved category, inactive category, duplicate
    /// name.
    pub fn create_product(&self, input: NewProduct) -> DomainResult<Product> {
        let mut tx = self.store.begin()?;

        if let Some(stock) = input.stock {
            if stock < 0 {
                return Err(DomainError::InvalidStock(stock));
            }
        }

        let category = tx
            .get_category(input.category_id)?
            .ok_or(DomainError::NotFound)?;
        if !category.active() {
            return Err(DomainError::CategoryInactive);
        }

        let name = input.name.clone();
        let pred = |p: &Product| p.name() == name.as_str();
        if !tx.find_products(&pred)?.is_empty() {
            return Err(DomainError::DuplicateName(name));
        }

        let product = Product::create(input, Utc::now())?;
        tx.put_product(product.clone())?;
        tx.commit()?;

        tracing::debug!(product_id = %product.id_typed(), name = product.name(), "product created");
        Ok(product)
    }

    pub fn update_product(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Product> {
        let mut tx = self.store.begin()?;
        let mut product = tx.get_product(id)?.ok_or(DomainError::NotFound)?;
        product.apply_patch(patch, Utc::now())?;
        tx.put_product(product.clone())?;
        tx.commit()?;

        tracing::debug!(product_id = %id, "product updated");
        Ok(product)
    }

    /// Soft delete: the row stays, deactivated with price and stock zeroed.
    /// Returns the retired product.
    pub fn soft_delete_product(&self, id: ProductId) -> DomainResult<Product> {
        let mut tx = self.store.begin()?;
        let mut product = tx.get_product(id)?.ok_or(DomainError::NotFound)?;
        product.retire(Utc::now());
        tx.put_product(product.clone())?;
        tx.commit()?;

        tracing::info!(product_id = %id, "product retired");
        Ok(product)
    }

    pub fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        let mut tx = self.store.begin()?;
        tx.get_product(id)?.ok_or(DomainError::NotFound)
    }

    pub fn list_active_products(&self) -> DomainResult<Vec<Product>> {
        self.filtered_products(ProductFilter {
            active: Some(true),
            ..ProductFilter::default()
        })
    }

    pub fn products_by_category(&self, category_id: CategoryId) -> DomainResult<Vec<Product>> {
        self.filtered_products(ProductFilter {
            category_id: Some(category_id),
            ..ProductFilter::default()
        })
    }

    pub fn products_by_active(&self, active: bool) -> DomainResult<Vec<Product>> {
        self.filtered_products(ProductFilter {
            active: Some(active),
            ..ProductFilter::default()
        })
    }

    /// Products whose price lies in `[min, max]`; products without a price
    /// never match.
    pub fn products_by_price_range(&self, min: u64, max: u64) -> DomainResult<Vec<Product>> {
        self.filtered_products(ProductFilter {
            price_range: Some((min, max)),
            ..ProductFilter::default()
        })
    }

    /// Products whose stock lies in `[min, max]`; products without a stock
    /// value never match.
    pub fn products_by_stock_range(&self, min: i64, max: i64) -> DomainResult<Vec<Product>> {
        self.filtered_products(ProductFilter {
            stock_range: Some((min, max)),
            ..ProductFilter::default()
        })
    }

    pub fn products_by_category_and_active(
        &self,
        category_id: CategoryId,
        active: bool,
    ) -> DomainResult<Vec<Product>> {
        self.filtered_products(ProductFilter {
            category_id: Some(category_id),
            active: Some(active),
            ..ProductFilter::default()
        })
    }

    /// Shared read path for the product queries. Zero matches is `NotFound`
    /// by convention: callers distinguish "no data" from "filter applied to
    /// zero rows" through this error, so it must not be softened to an
    /// empty list.
    fn filtered_products(&self, filter: ProductFilter) -> DomainResult<Vec<Product>> {
        let mut tx = self.store.begin()?;
        let products = tx.find_products(&|p: &Product| filter.matches(p))?;
        if products.is_empty() {
            return Err(DomainError::NotFound);
        }
        Ok(products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn service() -> CatalogService<InMemoryStore> {
        CatalogService::new(InMemoryStore::new())
    }

    fn new_product(name: &str, category_id: CategoryId) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: None,
            active: true,
            price: Some(500),
            stock: Some(10),
            category_id,
        }
    }

    #[test]
    fn duplicate_category_name_is_rejected() {
        let catalog = service();
        catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap();

        let err = catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateName("Bebidas".into()));
    }

    #[test]
    fn duplicate_check_also_sees_inactive_rows() {
        let catalog = service();
        let bebidas = catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap();
        catalog
            .update_category(
                bebidas.id_typed(),
                CategoryPatch {
                    active: Some(false),
                    ..CategoryPatch::default()
                },
            )
            .unwrap();

        let err = catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateName("Bebidas".into()));
    }

    #[test]
    fn category_names_are_case_sensitive() {
        let catalog = service();
        catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap();
        catalog
            .create_category(NewCategory::named("bebidas"))
            .unwrap();
    }

    #[test]
    fn create_product_checks_run_in_fixed_order() {
        let catalog = service();
        let bebidas = catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap();

        // Negative stock wins over a missing category.
        let err = catalog
            .create_product(NewProduct {
                stock: Some(-1),
                ..new_product("Agua", CategoryId::new())
            })
            .unwrap_err();
        assert_eq!(err, DomainError::InvalidStock(-1));

        // Missing category wins over anything later.
        let err = catalog
            .create_product(new_product("Agua", CategoryId::new()))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);

        // Inactive category wins over a duplicate name.
        catalog
            .create_product(new_product("Agua", bebidas.id_typed()))
            .unwrap();
        catalog
            .update_category(
                bebidas.id_typed(),
                CategoryPatch {
                    active: Some(false),
                    ..CategoryPatch::default()
                },
            )
            .unwrap();
        let err = catalog
            .create_product(new_product("Agua", bebidas.id_typed()))
            .unwrap_err();
        assert_eq!(err, DomainError::CategoryInactive);
    }

    #[test]
    fn duplicate_product_name_is_rejected() {
        let catalog = service();
        let bebidas = catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap();
        catalog
            .create_product(new_product("Agua", bebidas.id_typed()))
            .unwrap();

        let err = catalog
            .create_product(new_product("Agua", bebidas.id_typed()))
            .unwrap_err();
        assert_eq!(err, DomainError::DuplicateName("Agua".into()));
    }

    #[test]
    fn delete_category_cascades_to_its_products() {
        let catalog = service();
        let bebidas = catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap();
        let snacks = catalog
            .create_category(NewCategory::named("Snacks"))
            .unwrap();
        let agua = catalog
            .create_product(new_product("Agua", bebidas.id_typed()))
            .unwrap();
        let papas = catalog
            .create_product(new_product("Papas", snacks.id_typed()))
            .unwrap();

        let snapshot = catalog.delete_category(bebidas.id_typed()).unwrap();
        assert_eq!(snapshot.id_typed(), bebidas.id_typed());

        assert_eq!(
            catalog.get_category(bebidas.id_typed()).unwrap_err(),
            DomainError::NotFound
        );
        assert_eq!(
            catalog.get_product(agua.id_typed()).unwrap_err(),
            DomainError::NotFound
        );
        // The sibling category's product is untouched.
        assert_eq!(
            catalog.get_product(papas.id_typed()).unwrap().id_typed(),
            papas.id_typed()
        );
    }

    #[test]
    fn update_category_refreshes_updated_at() {
        let catalog = service();
        let bebidas = catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap();

        let updated = catalog
            .update_category(
                bebidas.id_typed(),
                CategoryPatch {
                    description: Some("frías".into()),
                    ..CategoryPatch::default()
                },
            )
            .unwrap();

        assert_eq!(updated.description(), Some("frías"));
        assert_eq!(updated.name(), "Bebidas");
        assert!(updated.updated_at() >= bebidas.updated_at());
    }

    #[test]
    fn update_missing_entities_is_not_found() {
        let catalog = service();
        assert_eq!(
            catalog
                .update_category(CategoryId::new(), CategoryPatch::default())
                .unwrap_err(),
            DomainError::NotFound
        );
        assert_eq!(
            catalog
                .update_product(ProductId::new(), ProductPatch::default())
                .unwrap_err(),
            DomainError::NotFound
        );
        assert_eq!(
            catalog.soft_delete_product(ProductId::new()).unwrap_err(),
            DomainError::NotFound
        );
        assert_eq!(
            catalog.delete_category(CategoryId::new()).unwrap_err(),
            DomainError::NotFound
        );
    }

    #[test]
    fn empty_product_queries_are_not_found() {
        let catalog = service();
        let bebidas = catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap();

        // No products at all.
        assert_eq!(
            catalog.list_active_products().unwrap_err(),
            DomainError::NotFound
        );
        assert_eq!(
            catalog
                .products_by_category(bebidas.id_typed())
                .unwrap_err(),
            DomainError::NotFound
        );

        // A filter that matches zero rows is still an error.
        catalog
            .create_product(new_product("Agua", bebidas.id_typed()))
            .unwrap();
        assert_eq!(
            catalog.products_by_price_range(501, 1_000).unwrap_err(),
            DomainError::NotFound
        );
        assert_eq!(
            catalog.products_by_stock_range(11, 20).unwrap_err(),
            DomainError::NotFound
        );
        assert_eq!(
            catalog
                .products_by_category_and_active(bebidas.id_typed(), false)
                .unwrap_err(),
            DomainError::NotFound
        );
    }

    #[test]
    fn range_queries_are_inclusive() {
        let catalog = service();
        let bebidas = catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap();
        let agua = catalog
            .create_product(new_product("Agua", bebidas.id_typed()))
            .unwrap();

        let by_price = catalog.products_by_price_range(500, 500).unwrap();
        assert_eq!(by_price.len(), 1);
        assert_eq!(by_price[0].id_typed(), agua.id_typed());

        let by_stock = catalog.products_by_stock_range(10, 10).unwrap();
        assert_eq!(by_stock.len(), 1);
    }

    #[test]
    fn list_categories_may_be_empty() {
        let catalog = service();
        assert!(catalog.list_categories().unwrap().is_empty());
    }

    #[test]
    fn soft_deleted_product_drops_out_of_active_queries() {
        let catalog = service();
        let bebidas = catalog
            .create_category(NewCategory::named("Bebidas"))
            .unwrap();
        let agua = catalog
            .create_product(new_product("Agua", bebidas.id_typed()))
            .unwrap();

        let retired = catalog.soft_delete_product(agua.id_typed()).unwrap();
        assert!(!retired.active());
        assert_eq!(retired.price(), Some(0));
        assert_eq!(retired.stock(), Some(0));

        assert_eq!(
            catalog.list_active_products().unwrap_err(),
            DomainError::NotFound
        );
        // But the row is still there.
        assert!(catalog.get_product(agua.id_typed()).unwrap().retired());
    }
}
