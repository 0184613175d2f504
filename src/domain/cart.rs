//! Cart line snapshots and the derived totals breakdown.

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::errors::DomainError;
use super::money::Money;
use super::pricing::{calculate_components, PaymentComponent, PricingContext};

/// Exactly one pricing mode applies per line.
///
/// Fixed lines carry a flat unit price plus a precomputed per-unit tax
/// amount. Variable-dimension lines are priced as fixed height times the
/// customer's length times a rate that already includes tax.
#[derive(Debug, Clone, PartialEq)]
pub enum LinePricing {
    Fixed {
        unit_price: Money,
        unit_tax: Money,
    },
    Variable {
        fixed_height: BigDecimal,
        custom_length: BigDecimal,
        rate_per_unit: Money,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub pricing: LinePricing,
}

impl CartLine {
    /// Fails fast on caller contract violations (non-positive quantity,
    /// price, or dimension) instead of letting them flow into a negative
    /// total.
    pub fn new(
        id: Uuid,
        product_id: Uuid,
        name: String,
        quantity: i32,
        pricing: LinePricing,
    ) -> Result<Self, DomainError> {
        if quantity < 1 {
            return Err(DomainError::Validation(format!(
                "quantity must be at least 1, got {quantity}"
            )));
        }
        match &pricing {
            LinePricing::Fixed { unit_price, unit_tax } => {
                if unit_price.is_negative() || unit_tax.is_negative() {
                    return Err(DomainError::Validation(
                        "unit price and tax must not be negative".to_string(),
                    ));
                }
            }
            LinePricing::Variable {
                fixed_height,
                custom_length,
                rate_per_unit,
            } => {
                if *fixed_height <= BigDecimal::zero() || *custom_length <= BigDecimal::zero() {
                    return Err(DomainError::Validation(
                        "dimensions must be positive".to_string(),
                    ));
                }
                if rate_per_unit.is_negative() {
                    return Err(DomainError::Validation(
                        "rate must not be negative".to_string(),
                    ));
                }
            }
        }
        Ok(CartLine {
            id,
            product_id,
            name,
            quantity,
            pricing,
        })
    }

    /// Per-unit base amount in the line's pricing mode.
    pub fn unit_amount(&self) -> Money {
        match &self.pricing {
            LinePricing::Fixed { unit_price, .. } => unit_price.clone(),
            LinePricing::Variable {
                fixed_height,
                custom_length,
                rate_per_unit,
            } => rate_per_unit.times_rate(&(fixed_height * custom_length)),
        }
    }

    pub fn base_amount(&self) -> Money {
        &self.unit_amount() * self.quantity
    }

    /// Tax contribution of the line; zero for tax-inclusive variable pricing.
    pub fn tax_amount(&self) -> Money {
        match &self.pricing {
            LinePricing::Fixed { unit_tax, .. } => unit_tax * self.quantity,
            LinePricing::Variable { .. } => Money::zero(),
        }
    }

    pub fn is_tax_inclusive(&self) -> bool {
        matches!(self.pricing, LinePricing::Variable { .. })
    }
}

/// The derived totals breakdown for a cart snapshot.
///
/// Totals are never stored: every consumer (cart screen, quote endpoint,
/// order placement) computes them through [`CartTotals::compute`] with the
/// inputs at hand, so a displayed total and a frozen order total can only
/// come from the same arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub struct CartTotals {
    pub subtotal: Money,
    pub components: Vec<PaymentComponent>,
    pub grand_total: Money,
}

impl CartTotals {
    pub fn empty() -> Self {
        CartTotals {
            subtotal: Money::zero().rounded(),
            components: Vec::new(),
            grand_total: Money::zero().rounded(),
        }
    }

    /// subtotal + tax + shipping + fee - discount, in decimal, rounded at
    /// the end.
    pub fn compute(lines: &[CartLine], ctx: &PricingContext) -> Self {
        let subtotal: Money = lines
            .iter()
            .fold(Money::zero(), |mut acc, line| {
                acc += &line.base_amount();
                acc
            })
            .rounded();

        let components = calculate_components(lines, ctx);

        let grand_total = components
            .iter()
            .fold(subtotal.clone(), |total, component| {
                if component.is_negative {
                    total - &component.amount
                } else {
                    total + &component.amount
                }
            })
            .rounded();

        CartTotals {
            subtotal,
            components,
            grand_total,
        }
    }

    pub fn component(&self, component_type: super::pricing::ComponentType) -> Option<&PaymentComponent> {
        self.components
            .iter()
            .find(|c| c.component_type == component_type)
    }
}
