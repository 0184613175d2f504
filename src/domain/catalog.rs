use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::Money;

/// How a product is priced. Fixed products carry a flat unit price, a tax
/// rate, and the precomputed per-unit tax amount. Variable-dimension
/// products are cut to a customer-supplied length and priced per unit of
/// area at a tax-inclusive rate.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductPricing {
    Fixed {
        unit_price: Money,
        tax_rate: BigDecimal,
        unit_tax: Money,
    },
    Variable {
        fixed_height: BigDecimal,
        rate_per_unit: Money,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub pricing: ProductPricing,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn is_variable(&self) -> bool {
        matches!(self.pricing, ProductPricing::Variable { .. })
    }

    /// The price shown on listing screens: the unit price, or the per-unit
    /// rate for cut-to-size products.
    pub fn display_price(&self) -> Money {
        match &self.pricing {
            ProductPricing::Fixed { unit_price, .. } => unit_price.clone(),
            ProductPricing::Variable { rate_per_unit, .. } => rate_per_unit.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub pricing: ProductPricing,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("name must not be empty".to_string()));
        }
        match &self.pricing {
            ProductPricing::Fixed {
                unit_price,
                tax_rate,
                unit_tax,
            } => {
                if unit_price.is_negative() || unit_tax.is_negative() {
                    return Err(DomainError::Validation(
                        "price and tax must not be negative".to_string(),
                    ));
                }
                if *tax_rate < BigDecimal::zero() || *tax_rate > BigDecimal::from(1) {
                    return Err(DomainError::Validation(
                        "tax rate must be between 0 and 1".to_string(),
                    ));
                }
            }
            ProductPricing::Variable {
                fixed_height,
                rate_per_unit,
            } => {
                if *fixed_height <= BigDecimal::zero() {
                    return Err(DomainError::Validation(
                        "fixed height must be positive".to_string(),
                    ));
                }
                if rate_per_unit.is_negative() {
                    return Err(DomainError::Validation(
                        "rate must not be negative".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
}

impl NewCategory {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::Validation("name must not be empty".to_string()));
        }
        Ok(())
    }
}

/// What a recommendation strip needs to render one product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub display_price: Money,
}

#[derive(Debug, Clone)]
pub struct ProductList {
    pub items: Vec<Product>,
    pub total: i64,
}
