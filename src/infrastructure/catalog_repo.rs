use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{
    Category, NewCategory, NewProduct, Product, ProductList, ProductPricing, ProductSummary,
};
use crate::domain::errors::DomainError;
use crate::domain::money::Money;
use crate::domain::ports::CatalogRepository;
use crate::schema::{categories, products};

use super::models::{
    CategoryRow, NewCategoryRow, NewProductRow, ProductRow, PRICING_KIND_FIXED,
    PRICING_KIND_VARIABLE,
};

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn category_from_row(row: CategoryRow) -> Category {
    Category {
        id: row.id,
        name: row.name,
        created_at: row.created_at,
    }
}

pub(super) fn product_from_row(row: ProductRow) -> Result<Product, DomainError> {
    let pricing = match row.pricing_kind.as_str() {
        PRICING_KIND_FIXED => {
            let (unit_price, tax_rate, unit_tax) =
                match (row.unit_price, row.tax_rate, row.unit_tax) {
                    (Some(p), Some(r), Some(t)) => (p, r, t),
                    _ => {
                        return Err(DomainError::Internal(format!(
                            "product {} is missing fixed pricing fields",
                            row.id
                        )))
                    }
                };
            ProductPricing::Fixed {
                unit_price: Money::new(unit_price),
                tax_rate,
                unit_tax: Money::new(unit_tax),
            }
        }
        PRICING_KIND_VARIABLE => {
            let (fixed_height, rate_per_unit) = match (row.fixed_height, row.rate_per_unit) {
                (Some(h), Some(r)) => (h, r),
                _ => {
                    return Err(DomainError::Internal(format!(
                        "product {} is missing variable pricing fields",
                        row.id
                    )))
                }
            };
            ProductPricing::Variable {
                fixed_height,
                rate_per_unit: Money::new(rate_per_unit),
            }
        }
        other => {
            return Err(DomainError::Internal(format!(
                "product {} has unknown pricing kind '{other}'",
                row.id
            )))
        }
    };
    Ok(Product {
        id: row.id,
        name: row.name,
        description: row.description,
        category_id: row.category_id,
        pricing,
        created_at: row.created_at,
    })
}

fn product_row(input: &NewProduct) -> NewProductRow {
    let mut row = NewProductRow {
        id: Uuid::new_v4(),
        name: input.name.clone(),
        description: input.description.clone(),
        category_id: input.category_id,
        pricing_kind: String::new(),
        unit_price: None,
        tax_rate: None,
        unit_tax: None,
        fixed_height: None,
        rate_per_unit: None,
    };
    match &input.pricing {
        ProductPricing::Fixed {
            unit_price,
            tax_rate,
            unit_tax,
        } => {
            row.pricing_kind = PRICING_KIND_FIXED.to_string();
            row.unit_price = Some(unit_price.rounded().into_inner());
            row.tax_rate = Some(tax_rate.clone());
            row.unit_tax = Some(unit_tax.rounded().into_inner());
        }
        ProductPricing::Variable {
            fixed_height,
            rate_per_unit,
        } => {
            row.pricing_kind = PRICING_KIND_VARIABLE.to_string();
            row.fixed_height = Some(fixed_height.clone());
            row.rate_per_unit = Some(rate_per_unit.rounded().into_inner());
        }
    }
    row
}

impl CatalogRepository for DieselCatalogRepository {
    fn create_category(&self, input: NewCategory) -> Result<Category, DomainError> {
        let mut conn = self.pool.get()?;
        let row: CategoryRow = diesel::insert_into(categories::table)
            .values(&NewCategoryRow {
                id: Uuid::new_v4(),
                name: input.name,
            })
            .get_result(&mut conn)?;
        Ok(category_from_row(row))
    }

    fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = categories::table
            .select(CategoryRow::as_select())
            .order(categories::name.asc())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(category_from_row).collect())
    }

    fn create_product(&self, input: NewProduct) -> Result<Product, DomainError> {
        let mut conn = self.pool.get()?;
        if let Some(category_id) = input.category_id {
            let exists: i64 = categories::table
                .filter(categories::id.eq(category_id))
                .count()
                .get_result(&mut conn)?;
            if exists == 0 {
                return Err(DomainError::Validation(format!(
                    "category {category_id} does not exist"
                )));
            }
        }
        let row: ProductRow = diesel::insert_into(products::table)
            .values(&product_row(&input))
            .get_result(&mut conn)?;
        product_from_row(row)
    }

    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        row.map(product_from_row).transpose()
    }

    fn list_products(
        &self,
        category_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ProductList, DomainError> {
        let mut conn = self.pool.get()?;
        let offset = (page - 1) * limit;

        let mut count_query = products::table.into_boxed();
        let mut rows_query = products::table.into_boxed();
        if let Some(category_id) = category_id {
            count_query = count_query.filter(products::category_id.eq(category_id));
            rows_query = rows_query.filter(products::category_id.eq(category_id));
        }

        let total: i64 = count_query.count().get_result(&mut conn)?;
        let rows = rows_query
            .select(ProductRow::as_select())
            .order(products::created_at.desc())
            .limit(limit)
            .offset(offset)
            .load(&mut conn)?;

        Ok(ProductList {
            items: rows
                .into_iter()
                .map(product_from_row)
                .collect::<Result<Vec<_>, _>>()?,
            total,
        })
    }

    fn related_products(
        &self,
        product_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ProductSummary>, DomainError> {
        let mut conn = self.pool.get()?;

        let product = products::table
            .filter(products::id.eq(product_id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;
        let Some(product) = product else {
            return Err(DomainError::NotFound);
        };

        // Products without a category have no neighbors to recommend.
        let Some(category_id) = product.category_id else {
            return Ok(Vec::new());
        };

        let rows = products::table
            .filter(products::category_id.eq(category_id))
            .filter(products::id.ne(product_id))
            .select(ProductRow::as_select())
            .order(products::created_at.desc())
            .limit(limit)
            .load(&mut conn)?;

        rows.into_iter()
            .map(|row| {
                let product = product_from_row(row)?;
                Ok(ProductSummary {
                    id: product.id,
                    name: product.name.clone(),
                    display_price: product.display_price().rounded(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::test_support::setup_db;

    fn money(s: &str) -> Money {
        s.parse().expect("valid decimal")
    }

    fn fixed_product(name: &str, category_id: Option<Uuid>) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: None,
            category_id,
            pricing: ProductPricing::Fixed {
                unit_price: money("19.99"),
                tax_rate: "0.10".parse().expect("rate"),
                unit_tax: money("2.00"),
            },
        }
    }

    #[tokio::test]
    async fn create_and_find_product_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let created = repo
            .create_product(fixed_product("widget", None))
            .expect("create failed");
        let found = repo
            .find_product(created.id)
            .expect("find failed")
            .expect("product should exist");

        assert_eq!(found.name, "widget");
        assert_eq!(found.display_price(), money("19.99"));
        assert!(!found.is_variable());
    }

    #[tokio::test]
    async fn variable_product_roundtrip() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let created = repo
            .create_product(NewProduct {
                name: "panel".to_string(),
                description: Some("cut to size".to_string()),
                category_id: None,
                pricing: ProductPricing::Variable {
                    fixed_height: "2.5".parse().expect("height"),
                    rate_per_unit: money("4.00"),
                },
            })
            .expect("create failed");

        let found = repo
            .find_product(created.id)
            .expect("find failed")
            .expect("product should exist");
        assert!(found.is_variable());
        assert_eq!(found.display_price(), money("4.00"));
    }

    #[tokio::test]
    async fn product_with_unknown_category_is_rejected() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let result = repo.create_product(fixed_product("widget", Some(Uuid::new_v4())));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn related_products_share_category_and_exclude_self() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let category = repo
            .create_category(NewCategory {
                name: "hardware".to_string(),
            })
            .expect("category failed");

        let target = repo
            .create_product(fixed_product("target", Some(category.id)))
            .expect("create failed");
        for i in 0..3 {
            repo.create_product(fixed_product(&format!("neighbor-{i}"), Some(category.id)))
                .expect("create failed");
        }
        // A product in no category never shows up.
        repo.create_product(fixed_product("stray", None))
            .expect("create failed");

        let related = repo
            .related_products(target.id, 2)
            .expect("related failed");
        assert_eq!(related.len(), 2);
        assert!(related.iter().all(|p| p.id != target.id));
    }

    #[tokio::test]
    async fn related_products_empty_without_category() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let target = repo
            .create_product(fixed_product("loner", None))
            .expect("create failed");
        let related = repo
            .related_products(target.id, 5)
            .expect("related failed");
        assert!(related.is_empty());
    }

    #[tokio::test]
    async fn list_products_filters_by_category_and_paginates() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let category = repo
            .create_category(NewCategory {
                name: "hardware".to_string(),
            })
            .expect("category failed");
        for i in 0..5 {
            repo.create_product(fixed_product(&format!("p{i}"), Some(category.id)))
                .expect("create failed");
        }
        repo.create_product(fixed_product("other", None))
            .expect("create failed");

        let page1 = repo
            .list_products(Some(category.id), 1, 3)
            .expect("list failed");
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);

        let page2 = repo
            .list_products(Some(category.id), 2, 3)
            .expect("list failed");
        assert_eq!(page2.items.len(), 2);
    }
}
