use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::cart_service::CartView;
use crate::domain::cart::{CartLine, CartTotals};
use crate::domain::ports::{CartLineUpdate, NewCartLine};
use crate::domain::pricing::{PaymentComponent, PaymentMethod, PricingContext, ShippingMethod};
use crate::errors::AppError;
use crate::Services;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    /// Custom length as a decimal string, e.g. "3.25". Required for
    /// cut-to-size products, rejected otherwise.
    pub custom_length: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateLineRequest {
    pub quantity: Option<i32>,
    pub custom_length: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentResponse {
    #[serde(rename = "type")]
    pub component_type: String,
    /// Decimal amount as a string with two fractional digits, e.g. "9.99"
    pub amount: String,
    pub label: String,
    pub is_negative: bool,
}

impl ComponentResponse {
    pub fn from_component(c: &PaymentComponent) -> Self {
        ComponentResponse {
            component_type: c.component_type.as_str().to_string(),
            amount: c.amount.to_string(),
            label: c.label.clone(),
            is_negative: c.is_negative,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TotalsResponse {
    pub subtotal: String,
    pub components: Vec<ComponentResponse>,
    pub grand_total: String,
}

impl TotalsResponse {
    pub fn from_totals(totals: &CartTotals) -> Self {
        TotalsResponse {
            subtotal: totals.subtotal.to_string(),
            components: totals
                .components
                .iter()
                .map(ComponentResponse::from_component)
                .collect(),
            grand_total: totals.grand_total.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_amount: String,
    pub line_total: String,
    pub tax_included: bool,
}

impl CartLineResponse {
    fn from_line(line: &CartLine) -> Self {
        CartLineResponse {
            id: line.id,
            product_id: line.product_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_amount: line.unit_amount().to_string(),
            line_total: line.base_amount().to_string(),
            tax_included: line.is_tax_inclusive(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub totals: TotalsResponse,
}

impl CartResponse {
    fn from_view(view: &CartView) -> Self {
        CartResponse {
            lines: view.lines.iter().map(CartLineResponse::from_line).collect(),
            totals: TotalsResponse::from_totals(&view.totals),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TotalsParams {
    /// One of standard, ground, express, overnight. Defaults to standard.
    pub shipping_method: Option<String>,
    pub discount_code: Option<String>,
    pub payment_method: Option<String>,
}

fn parse_length(raw: &Option<String>) -> Result<Option<BigDecimal>, AppError> {
    match raw {
        None => Ok(None),
        Some(s) => BigDecimal::from_str(s.trim())
            .map(Some)
            .map_err(|e| AppError::Validation(format!("Invalid custom_length '{s}': {e}"))),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /users/{user_id}/cart
#[utoipa::path(
    get,
    path = "/users/{user_id}/cart",
    params(
        ("user_id" = Uuid, Path, description = "Cart owner"),
    ),
    responses(
        (status = 200, description = "Current cart with totals", body = CartResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn get_cart(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let view = web::block(move || services.carts.view(user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(CartResponse::from_view(&view)))
}

/// GET /users/{user_id}/cart/totals
///
/// Recomputes the full breakdown for the supplied context codes. Called on
/// every materially relevant change (shipping method, discount code, payment
/// method); runs the exact calculation order placement freezes.
#[utoipa::path(
    get,
    path = "/users/{user_id}/cart/totals",
    params(
        ("user_id" = Uuid, Path, description = "Cart owner"),
        ("shipping_method" = Option<String>, Query, description = "standard | ground | express | overnight"),
        ("discount_code" = Option<String>, Query, description = "Promotional code, unknown codes are ignored"),
        ("payment_method" = Option<String>, Query, description = "card | international_card | upi | net_banking | cash_on_delivery"),
    ),
    responses(
        (status = 200, description = "Totals breakdown", body = TotalsResponse),
        (status = 400, description = "Unknown shipping or payment method"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn quote_totals(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
    query: web::Query<TotalsParams>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let params = query.into_inner();

    let shipping_method = match params.shipping_method.as_deref() {
        Some(s) => ShippingMethod::parse(s)?,
        None => ShippingMethod::Standard,
    };
    let payment_method = params
        .payment_method
        .as_deref()
        .map(PaymentMethod::parse)
        .transpose()?;
    let ctx = PricingContext {
        shipping_method,
        discount_code: params.discount_code,
        payment_method,
        region: None,
    };

    let totals = web::block(move || services.carts.quote(user_id, ctx))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(TotalsResponse::from_totals(&totals)))
}

/// POST /users/{user_id}/cart/lines
#[utoipa::path(
    post,
    path = "/users/{user_id}/cart/lines",
    request_body = AddLineRequest,
    params(
        ("user_id" = Uuid, Path, description = "Cart owner"),
    ),
    responses(
        (status = 201, description = "Line added, updated cart returned", body = CartResponse),
        (status = 400, description = "Invalid quantity or custom length"),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn add_line(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
    body: web::Json<AddLineRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let body = body.into_inner();
    let custom_length = parse_length(&body.custom_length)?;

    let view = web::block(move || {
        services.carts.add_line(
            user_id,
            NewCartLine {
                product_id: body.product_id,
                quantity: body.quantity,
                custom_length,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(CartResponse::from_view(&view)))
}

/// PATCH /users/{user_id}/cart/lines/{line_id}
#[utoipa::path(
    patch,
    path = "/users/{user_id}/cart/lines/{line_id}",
    request_body = UpdateLineRequest,
    params(
        ("user_id" = Uuid, Path, description = "Cart owner"),
        ("line_id" = Uuid, Path, description = "Cart line to change"),
    ),
    responses(
        (status = 200, description = "Line updated, updated cart returned", body = CartResponse),
        (status = 400, description = "Invalid quantity or custom length"),
        (status = 404, description = "Line not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn update_line(
    services: web::Data<Services>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateLineRequest>,
) -> Result<HttpResponse, AppError> {
    let (user_id, line_id) = path.into_inner();
    let body = body.into_inner();
    let custom_length = parse_length(&body.custom_length)?;

    let view = web::block(move || {
        services.carts.update_line(
            user_id,
            line_id,
            CartLineUpdate {
                quantity: body.quantity,
                custom_length,
            },
        )
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(CartResponse::from_view(&view)))
}

/// DELETE /users/{user_id}/cart/lines/{line_id}
#[utoipa::path(
    delete,
    path = "/users/{user_id}/cart/lines/{line_id}",
    params(
        ("user_id" = Uuid, Path, description = "Cart owner"),
        ("line_id" = Uuid, Path, description = "Cart line to remove"),
    ),
    responses(
        (status = 200, description = "Line removed, updated cart returned", body = CartResponse),
        (status = 404, description = "Line not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn remove_line(
    services: web::Data<Services>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (user_id, line_id) = path.into_inner();
    let view = web::block(move || services.carts.remove_line(user_id, line_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(CartResponse::from_view(&view)))
}

/// DELETE /users/{user_id}/cart
#[utoipa::path(
    delete,
    path = "/users/{user_id}/cart",
    params(
        ("user_id" = Uuid, Path, description = "Cart owner"),
    ),
    responses(
        (status = 204, description = "Cart cleared"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "carts"
)]
pub async fn clear_cart(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    web::block(move || services.carts.clear(user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::NoContent().finish())
}
