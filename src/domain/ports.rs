//! Boundaries to the collaborators the checkout core consumes.

use bigdecimal::BigDecimal;
use uuid::Uuid;

use super::address::{Address, AddressUpdate, NewAddress};
use super::cart::CartLine;
use super::catalog::{Category, NewCategory, NewProduct, Product, ProductList, ProductSummary};
use super::errors::DomainError;
use super::money::{Currency, Money};
use super::order::{ListResult, NewOrder, OrderView};

/// A change to an existing cart line.
#[derive(Debug, Clone, Default)]
pub struct CartLineUpdate {
    pub quantity: Option<i32>,
    pub custom_length: Option<BigDecimal>,
}

/// A line being added to the cart. `custom_length` is required for
/// variable-dimension products and rejected for fixed-price ones.
#[derive(Debug, Clone)]
pub struct NewCartLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub custom_length: Option<BigDecimal>,
}

pub trait CartRepository: Send + Sync + 'static {
    fn lines_for_user(&self, user_id: Uuid) -> Result<Vec<CartLine>, DomainError>;
    fn add_line(&self, user_id: Uuid, input: NewCartLine) -> Result<Vec<CartLine>, DomainError>;
    fn update_line(
        &self,
        user_id: Uuid,
        line_id: Uuid,
        change: CartLineUpdate,
    ) -> Result<Vec<CartLine>, DomainError>;
    fn remove_line(&self, user_id: Uuid, line_id: Uuid) -> Result<Vec<CartLine>, DomainError>;
    fn clear(&self, user_id: Uuid) -> Result<(), DomainError>;
}

pub trait AddressRepository: Send + Sync + 'static {
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Address>, DomainError>;
    fn find(&self, user_id: Uuid, address_id: Uuid) -> Result<Option<Address>, DomainError>;
    fn create(&self, user_id: Uuid, input: NewAddress) -> Result<Address, DomainError>;
    fn update(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        change: AddressUpdate,
    ) -> Result<Address, DomainError>;
    /// Deletes and returns the remaining addresses with default promotion
    /// already applied.
    fn delete(&self, user_id: Uuid, address_id: Uuid) -> Result<Vec<Address>, DomainError>;
    fn set_default(&self, user_id: Uuid, address_id: Uuid) -> Result<Address, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    /// Freezes the snapshot and clears the source cart in one transaction.
    fn create(&self, order: NewOrder) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list_for_user(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError>;
}

pub trait CatalogRepository: Send + Sync + 'static {
    fn create_category(&self, input: NewCategory) -> Result<Category, DomainError>;
    fn list_categories(&self) -> Result<Vec<Category>, DomainError>;
    fn create_product(&self, input: NewProduct) -> Result<Product, DomainError>;
    fn find_product(&self, id: Uuid) -> Result<Option<Product>, DomainError>;
    fn list_products(
        &self,
        category_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ProductList, DomainError>;
    /// Products from the same category, excluding the product itself. An
    /// empty list is a valid, silent result.
    fn related_products(
        &self,
        product_id: Uuid,
        limit: i64,
    ) -> Result<Vec<ProductSummary>, DomainError>;
}

#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub amount: Money,
    pub currency: Currency,
    pub description: String,
    pub payer_email: String,
}

/// Result of an external payment capture. Failure crosses this boundary as
/// data, never as an error type, and a timeout is distinguishable from a
/// decline.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Captured {
        payment_id: String,
        gateway_order_id: String,
        signature: String,
    },
    Declined {
        reason: String,
    },
    TimedOut,
}

pub trait PaymentGateway: Send + Sync + 'static {
    fn capture(&self, request: CaptureRequest) -> CaptureOutcome;
}
