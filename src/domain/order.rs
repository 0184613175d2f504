use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::cart::{CartLine, CartTotals};
use super::checkout::CaptureReceipt;
use super::money::{Currency, Money};
use super::pricing::{ComponentType, PaymentComponent, PaymentMethod};

/// Status a freshly created order carries.
pub const STATUS_PLACED: &str = "PLACED";

pub fn generate_order_number() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("ORD-{}", id[..10].to_ascii_uppercase())
}

/// A cart line frozen at submission time with its captured unit price.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Money,
    pub line_total: Money,
}

impl OrderLineInput {
    pub fn from_cart_line(line: &CartLine) -> Self {
        OrderLineInput {
            product_id: line.product_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_amount().rounded(),
            line_total: line.base_amount().rounded(),
        }
    }
}

/// The five persisted totals fields. The processing fee has no dedicated
/// column; it lives in the component list and is part of `total_amount`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub shipping_amount: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
}

impl OrderTotals {
    pub fn from_cart_totals(totals: &CartTotals) -> Self {
        let amount_of = |component_type: ComponentType| {
            totals
                .component(component_type)
                .map(|c| c.amount.clone())
                .unwrap_or_else(Money::zero)
                .rounded()
        };
        OrderTotals {
            subtotal: totals.subtotal.clone(),
            tax_amount: amount_of(ComponentType::Tax),
            shipping_amount: amount_of(ComponentType::Shipping),
            discount_amount: amount_of(ComponentType::Discount),
            total_amount: totals.grand_total.clone(),
        }
    }
}

/// Everything frozen into an order at submission. Monetary fields never
/// change after creation.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub order_number: String,
    pub payment_method: PaymentMethod,
    pub capture: Option<CaptureReceipt>,
    pub currency: Currency,
    pub shipping_address_id: Uuid,
    pub billing_address_id: Option<Uuid>,
    pub totals: OrderTotals,
    pub components: Vec<PaymentComponent>,
    pub lines: Vec<OrderLineInput>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub payment_method: PaymentMethod,
    pub payment_id: Option<String>,
    pub gateway_order_id: Option<String>,
    pub currency: Currency,
    pub shipping_address_id: Uuid,
    pub billing_address_id: Option<Uuid>,
    pub totals: OrderTotals,
    pub components: Vec<PaymentComponent>,
    pub lines: Vec<OrderLineView>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}
