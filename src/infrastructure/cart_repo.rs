use bigdecimal::{BigDecimal, Zero};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::cart::{CartLine, LinePricing};
use crate::domain::errors::DomainError;
use crate::domain::money::Money;
use crate::domain::ports::{CartLineUpdate, CartRepository, NewCartLine};
use crate::schema::{cart_lines, products};

use super::models::{
    CartLineRow, NewCartLineRow, ProductRow, PRICING_KIND_FIXED, PRICING_KIND_VARIABLE,
};

pub struct DieselCartRepository {
    pool: DbPool,
}

impl DieselCartRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Assemble the domain line from its row and the product's pricing snapshot.
fn line_from_rows(row: CartLineRow, product: ProductRow) -> Result<CartLine, DomainError> {
    let pricing = match product.pricing_kind.as_str() {
        PRICING_KIND_FIXED => {
            let (unit_price, unit_tax) = match (product.unit_price, product.unit_tax) {
                (Some(p), Some(t)) => (p, t),
                _ => {
                    return Err(DomainError::Internal(format!(
                        "product {} is missing fixed pricing fields",
                        product.id
                    )))
                }
            };
            LinePricing::Fixed {
                unit_price: Money::new(unit_price),
                unit_tax: Money::new(unit_tax),
            }
        }
        PRICING_KIND_VARIABLE => {
            let (fixed_height, rate_per_unit) = match (product.fixed_height, product.rate_per_unit)
            {
                (Some(h), Some(r)) => (h, r),
                _ => {
                    return Err(DomainError::Internal(format!(
                        "product {} is missing variable pricing fields",
                        product.id
                    )))
                }
            };
            let custom_length = row.custom_length.clone().ok_or_else(|| {
                DomainError::Internal(format!("cart line {} is missing its custom length", row.id))
            })?;
            LinePricing::Variable {
                fixed_height,
                custom_length,
                rate_per_unit: Money::new(rate_per_unit),
            }
        }
        other => {
            return Err(DomainError::Internal(format!(
                "product {} has unknown pricing kind '{other}'",
                product.id
            )))
        }
    };
    CartLine::new(row.id, product.id, product.name, row.quantity, pricing)
}

fn load_lines(conn: &mut PgConnection, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
    let rows: Vec<(CartLineRow, ProductRow)> = cart_lines::table
        .inner_join(products::table)
        .filter(cart_lines::user_id.eq(user_id))
        .select((CartLineRow::as_select(), ProductRow::as_select()))
        .order(cart_lines::created_at.asc())
        .load(conn)?;
    rows.into_iter()
        .map(|(line, product)| line_from_rows(line, product))
        .collect()
}

fn validate_length(
    product: &ProductRow,
    custom_length: &Option<BigDecimal>,
) -> Result<(), DomainError> {
    match product.pricing_kind.as_str() {
        PRICING_KIND_VARIABLE => match custom_length {
            Some(length) if *length > BigDecimal::zero() => Ok(()),
            Some(_) => Err(DomainError::Validation(
                "custom length must be positive".to_string(),
            )),
            None => Err(DomainError::Validation(format!(
                "product '{}' is cut to size and needs a custom length",
                product.name
            ))),
        },
        _ => match custom_length {
            None => Ok(()),
            Some(_) => Err(DomainError::Validation(format!(
                "product '{}' has a fixed size; custom length is not allowed",
                product.name
            ))),
        },
    }
}

impl CartRepository for DieselCartRepository {
    fn lines_for_user(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;
        load_lines(&mut conn, user_id)
    }

    fn add_line(&self, user_id: Uuid, input: NewCartLine) -> Result<Vec<CartLine>, DomainError> {
        if input.quantity < 1 {
            return Err(DomainError::Validation(format!(
                "quantity must be at least 1, got {}",
                input.quantity
            )));
        }
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let product = products::table
                .filter(products::id.eq(input.product_id))
                .select(ProductRow::as_select())
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound)?;

            validate_length(&product, &input.custom_length)?;

            // Adding a fixed-price product already in the cart bumps the
            // existing line; cut-to-size lines have distinct dimensions and
            // always get their own row.
            let existing = if product.pricing_kind == PRICING_KIND_FIXED {
                cart_lines::table
                    .filter(cart_lines::user_id.eq(user_id))
                    .filter(cart_lines::product_id.eq(input.product_id))
                    .select(CartLineRow::as_select())
                    .first(conn)
                    .optional()?
            } else {
                None
            };

            match existing {
                Some(line) => {
                    diesel::update(cart_lines::table.filter(cart_lines::id.eq(line.id)))
                        .set(cart_lines::quantity.eq(line.quantity + input.quantity))
                        .execute(conn)?;
                }
                None => {
                    diesel::insert_into(cart_lines::table)
                        .values(&NewCartLineRow {
                            id: Uuid::new_v4(),
                            user_id,
                            product_id: input.product_id,
                            quantity: input.quantity,
                            custom_length: input.custom_length.clone(),
                        })
                        .execute(conn)?;
                }
            }

            load_lines(conn, user_id)
        })
    }

    fn update_line(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        change: CartLineUpdate,
    ) -> Result<Vec<CartLine>, DomainError> {
        if let Some(quantity) = change.quantity {
            if quantity < 1 {
                return Err(DomainError::Validation(format!(
                    "quantity must be at least 1, got {quantity}"
                )));
            }
        }
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let (line, product): (CartLineRow, ProductRow) = cart_lines::table
                .inner_join(products::table)
                .filter(cart_lines::id.eq(line_id))
                .filter(cart_lines::user_id.eq(user_id))
                .select((CartLineRow::as_select(), ProductRow::as_select()))
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound)?;

            if change.custom_length.is_some() {
                validate_length(&product, &change.custom_length)?;
            }

            let quantity = change.quantity.unwrap_or(line.quantity);
            let custom_length = change.custom_length.or(line.custom_length);
            diesel::update(cart_lines::table.filter(cart_lines::id.eq(line.id)))
                .set((
                    cart_lines::quantity.eq(quantity),
                    cart_lines::custom_length.eq(custom_length),
                ))
                .execute(conn)?;

            load_lines(conn, user_id)
        })
    }

    fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> Result<Vec<CartLine>, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(
            cart_lines::table
                .filter(cart_lines::id.eq(line_id))
                .filter(cart_lines::user_id.eq(user_id)),
        )
        .execute(&mut conn)?;
        if deleted == 0 {
            return Err(DomainError::NotFound);
        }
        load_lines(&mut conn, user_id)
    }

    fn clear(&self, user_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::delete(cart_lines::table.filter(cart_lines::user_id.eq(user_id)))
            .execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{NewProduct, ProductPricing};
    use crate::domain::ports::CatalogRepository;
    use crate::infrastructure::catalog_repo::DieselCatalogRepository;
    use crate::infrastructure::test_support::setup_db;

    fn money(s: &str) -> Money {
        s.parse().expect("valid decimal")
    }

    fn decimal(s: &str) -> BigDecimal {
        s.parse().expect("valid decimal")
    }

    fn seed_fixed(catalog: &DieselCatalogRepository) -> Uuid {
        catalog
            .create_product(NewProduct {
                name: "widget".to_string(),
                description: None,
                category_id: None,
                pricing: ProductPricing::Fixed {
                    unit_price: money("19.99"),
                    tax_rate: decimal("0.10"),
                    unit_tax: money("2.00"),
                },
            })
            .expect("seed failed")
            .id
    }

    fn seed_variable(catalog: &DieselCatalogRepository) -> Uuid {
        catalog
            .create_product(NewProduct {
                name: "panel".to_string(),
                description: None,
                category_id: None,
                pricing: ProductPricing::Variable {
                    fixed_height: decimal("2.5"),
                    rate_per_unit: money("4.00"),
                },
            })
            .expect("seed failed")
            .id
    }

    #[tokio::test]
    async fn add_line_returns_updated_cart() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogRepository::new(pool.clone());
        let repo = DieselCartRepository::new(pool);
        let user_id = Uuid::new_v4();
        let product_id = seed_fixed(&catalog);

        let lines = repo
            .add_line(
                user_id,
                NewCartLine {
                    product_id,
                    quantity: 2,
                    custom_length: None,
                },
            )
            .expect("add failed");

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].base_amount().rounded(), money("39.98"));
    }

    #[tokio::test]
    async fn adding_same_fixed_product_merges_quantities() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogRepository::new(pool.clone());
        let repo = DieselCartRepository::new(pool);
        let user_id = Uuid::new_v4();
        let product_id = seed_fixed(&catalog);

        let add = |qty| NewCartLine {
            product_id,
            quantity: qty,
            custom_length: None,
        };
        repo.add_line(user_id, add(1)).expect("add failed");
        let lines = repo.add_line(user_id, add(2)).expect("add failed");

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn variable_product_requires_custom_length() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogRepository::new(pool.clone());
        let repo = DieselCartRepository::new(pool);
        let user_id = Uuid::new_v4();
        let product_id = seed_variable(&catalog);

        let missing = repo.add_line(
            user_id,
            NewCartLine {
                product_id,
                quantity: 1,
                custom_length: None,
            },
        );
        assert!(matches!(missing, Err(DomainError::Validation(_))));

        let lines = repo
            .add_line(
                user_id,
                NewCartLine {
                    product_id,
                    quantity: 1,
                    custom_length: Some(decimal("3.0")),
                },
            )
            .expect("add failed");
        // 2.5 x 3.0 x 4.00
        assert_eq!(lines[0].base_amount().rounded(), money("30.00"));
        assert!(lines[0].is_tax_inclusive());
    }

    #[tokio::test]
    async fn fixed_product_rejects_custom_length() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogRepository::new(pool.clone());
        let repo = DieselCartRepository::new(pool);
        let product_id = seed_fixed(&catalog);

        let result = repo.add_line(
            Uuid::new_v4(),
            NewCartLine {
                product_id,
                quantity: 1,
                custom_length: Some(decimal("3.0")),
            },
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn update_remove_and_clear() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogRepository::new(pool.clone());
        let repo = DieselCartRepository::new(pool);
        let user_id = Uuid::new_v4();
        let fixed = seed_fixed(&catalog);
        let variable = seed_variable(&catalog);

        repo.add_line(
            user_id,
            NewCartLine {
                product_id: fixed,
                quantity: 1,
                custom_length: None,
            },
        )
        .expect("add failed");
        let lines = repo
            .add_line(
                user_id,
                NewCartLine {
                    product_id: variable,
                    quantity: 1,
                    custom_length: Some(decimal("2.0")),
                },
            )
            .expect("add failed");
        assert_eq!(lines.len(), 2);

        let fixed_line_id = lines
            .iter()
            .find(|l| !l.is_tax_inclusive())
            .expect("fixed line present")
            .id;
        let lines = repo
            .update_line(
                user_id,
                fixed_line_id,
                CartLineUpdate {
                    quantity: Some(5),
                    custom_length: None,
                },
            )
            .expect("update failed");
        let updated = lines
            .iter()
            .find(|l| l.id == fixed_line_id)
            .expect("line still present");
        assert_eq!(updated.quantity, 5);

        let lines = repo
            .remove_line(user_id, fixed_line_id)
            .expect("remove failed");
        assert_eq!(lines.len(), 1);

        repo.clear(user_id).expect("clear failed");
        assert!(repo
            .lines_for_user(user_id)
            .expect("load failed")
            .is_empty());
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool);

        let result = repo.add_line(
            Uuid::new_v4(),
            NewCartLine {
                product_id: Uuid::new_v4(),
                quantity: 1,
                custom_length: None,
            },
        );
        assert!(matches!(result, Err(DomainError::NotFound)));
    }

    #[tokio::test]
    async fn zero_quantity_fails_fast() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCartRepository::new(pool);

        let result = repo.add_line(
            Uuid::new_v4(),
            NewCartLine {
                product_id: Uuid::new_v4(),
                quantity: 0,
                custom_length: None,
            },
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
