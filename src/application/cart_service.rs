use uuid::Uuid;

use crate::domain::cart::{CartLine, CartTotals};
use crate::domain::errors::DomainError;
use crate::domain::ports::{CartLineUpdate, CartRepository, NewCartLine};
use crate::domain::pricing::PricingContext;

/// A cart render: the current lines plus the totals derived from them.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl CartView {
    fn from_lines(lines: Vec<CartLine>, ctx: &PricingContext) -> Self {
        let totals = if lines.is_empty() {
            CartTotals::empty()
        } else {
            CartTotals::compute(&lines, ctx)
        };
        CartView { lines, totals }
    }
}

pub struct CartService<R> {
    carts: R,
}

impl<R: CartRepository> CartService<R> {
    pub fn new(carts: R) -> Self {
        Self { carts }
    }

    pub fn view(&self, user_id: Uuid) -> Result<CartView, DomainError> {
        let lines = self.carts.lines_for_user(user_id)?;
        Ok(CartView::from_lines(lines, &PricingContext::default()))
    }

    /// Recomputes the full breakdown for the supplied context codes. This is
    /// the same calculation order placement runs, so a quote never diverges
    /// from what an order would freeze.
    pub fn quote(&self, user_id: Uuid, ctx: PricingContext) -> Result<CartTotals, DomainError> {
        let lines = self.carts.lines_for_user(user_id)?;
        if lines.is_empty() {
            return Ok(CartTotals::empty());
        }
        Ok(CartTotals::compute(&lines, &ctx))
    }

    pub fn add_line(&self, user_id: Uuid, input: NewCartLine) -> Result<CartView, DomainError> {
        let lines = self.carts.add_line(user_id, input)?;
        Ok(CartView::from_lines(lines, &PricingContext::default()))
    }

    pub fn update_line(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        change: CartLineUpdate,
    ) -> Result<CartView, DomainError> {
        let lines = self.carts.update_line(user_id, line_id, change)?;
        Ok(CartView::from_lines(lines, &PricingContext::default()))
    }

    pub fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> Result<CartView, DomainError> {
        let lines = self.carts.remove_line(user_id, line_id)?;
        Ok(CartView::from_lines(lines, &PricingContext::default()))
    }

    pub fn clear(&self, user_id: Uuid) -> Result<(), DomainError> {
        self.carts.clear(user_id)
    }
}
