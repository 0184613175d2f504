use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::PlaceOrderCommand;
use crate::domain::order::{OrderLineView, OrderView};
use crate::domain::pricing::{PaymentMethod, ShippingMethod};
use crate::errors::AppError;
use crate::handlers::carts::ComponentResponse;
use crate::Services;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    /// Defaults to the user's default address, else the first on file.
    pub shipping_address_id: Option<Uuid>,
    /// Defaults to the shipping address.
    pub billing_address_id: Option<Uuid>,
    /// card | international_card | upi | net_banking | cash_on_delivery
    pub payment_method: String,
    /// standard | ground | express | overnight. Defaults to standard.
    pub shipping_method: Option<String>,
    pub discount_code: Option<String>,
    pub payer_email: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
    pub line_total: String,
}

impl OrderLineResponse {
    fn from_line(l: &OrderLineView) -> Self {
        OrderLineResponse {
            id: l.id,
            product_id: l.product_id,
            name: l.name.clone(),
            quantity: l.quantity,
            unit_price: l.unit_price.to_string(),
            line_total: l.line_total.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: String,
    pub status: String,
    pub payment_method: String,
    pub payment_id: Option<String>,
    pub currency: String,
    pub shipping_address_id: Uuid,
    pub billing_address_id: Option<Uuid>,
    pub subtotal: String,
    pub tax_amount: String,
    pub shipping_amount: String,
    pub discount_amount: String,
    pub total_amount: String,
    pub components: Vec<ComponentResponse>,
    pub lines: Vec<OrderLineResponse>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl OrderResponse {
    fn from_view(view: &OrderView) -> Self {
        OrderResponse {
            id: view.id,
            order_number: view.order_number.clone(),
            status: view.status.clone(),
            payment_method: view.payment_method.as_str().to_string(),
            payment_id: view.payment_id.clone(),
            currency: view.currency.code().to_string(),
            shipping_address_id: view.shipping_address_id,
            billing_address_id: view.billing_address_id,
            subtotal: view.totals.subtotal.to_string(),
            tax_amount: view.totals.tax_amount.to_string(),
            shipping_amount: view.totals.shipping_amount.to_string(),
            discount_amount: view.totals.discount_amount.to_string(),
            total_amount: view.totals.total_amount.to_string(),
            components: view
                .components
                .iter()
                .map(ComponentResponse::from_component)
                .collect(),
            lines: view.lines.iter().map(OrderLineResponse::from_line).collect(),
            notes: view.notes.clone(),
            created_at: view.created_at.to_rfc3339(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /users/{user_id}/orders
///
/// Runs the whole checkout: resolves the addresses, computes the totals,
/// captures payment when the method requires it, and freezes cart, totals,
/// and components into an order. The cart is cleared in the same transaction
/// that records the order.
#[utoipa::path(
    post,
    path = "/users/{user_id}/orders",
    request_body = PlaceOrderRequest,
    params(
        ("user_id" = Uuid, Path, description = "Cart owner placing the order"),
    ),
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Empty cart, missing address, or invalid selection"),
        (status = 402, description = "Payment declined"),
        (status = 500, description = "Order not recorded after capture, or internal error"),
        (status = 504, description = "Payment capture timed out"),
    ),
    tag = "orders"
)]
pub async fn place_order(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
    body: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let body = body.into_inner();

    let payment_method = PaymentMethod::parse(&body.payment_method)?;
    let shipping_method = match body.shipping_method.as_deref() {
        Some(raw) => ShippingMethod::parse(raw)?,
        None => ShippingMethod::Standard,
    };
    let cmd = PlaceOrderCommand {
        shipping_address_id: body.shipping_address_id,
        billing_address_id: body.billing_address_id,
        payment_method,
        shipping_method,
        discount_code: body.discount_code,
        payer_email: body.payer_email,
        notes: body.notes,
    };

    let view = web::block(move || services.orders.place_order(user_id, cmd))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(OrderResponse::from_view(&view)))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = web::block(move || services.orders.get_order(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    match order {
        Some(order) => Ok(HttpResponse::Ok().json(OrderResponse::from_view(&order))),
        None => Err(AppError::NotFound),
    }
}

/// GET /users/{user_id}/orders
///
/// Returns a paginated list of the user's orders (without lines or
/// components), newest first.
#[utoipa::path(
    get,
    path = "/users/{user_id}/orders",
    params(
        ("user_id" = Uuid, Path, description = "Order owner"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || services.orders.list_orders(user_id, page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result.items.iter().map(OrderResponse::from_view).collect(),
        total: result.total,
        page,
        limit,
    }))
}
