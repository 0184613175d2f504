use uuid::Uuid;

use crate::domain::catalog::{
    Category, NewCategory, NewProduct, Product, ProductList, ProductSummary,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;

pub struct CatalogService<R> {
    catalog: R,
}

impl<R: CatalogRepository> CatalogService<R> {
    pub fn new(catalog: R) -> Self {
        Self { catalog }
    }

    pub fn create_category(&self, input: NewCategory) -> Result<Category, DomainError> {
        input.validate()?;
        self.catalog.create_category(input)
    }

    pub fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        self.catalog.list_categories()
    }

    pub fn create_product(&self, input: NewProduct) -> Result<Product, DomainError> {
        input.validate()?;
        self.catalog.create_product(input)
    }

    pub fn get_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        self.catalog.find_product(id)
    }

    pub fn list_products(
        &self,
        category_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ProductList, DomainError> {
        self.catalog.list_products(category_id, page, limit)
    }

    /// Related products for a detail screen. The product must exist; the
    /// result may legitimately be empty (the caller hides the section).
    pub fn related_products(
        &self,
        product_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ProductSummary>, DomainError> {
        if self.catalog.find_product(product_id)?.is_none() {
            return Err(DomainError::NotFound);
        }
        self.catalog.related_products(product_id, limit)
    }
}
