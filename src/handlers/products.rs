use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::catalog::{
    Category, NewCategory, NewProduct, Product, ProductPricing, ProductSummary,
};
use crate::domain::money::Money;
use crate::errors::AppError;
use crate::Services;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: String,
}

impl CategoryResponse {
    fn from_category(c: &Category) -> Self {
        CategoryResponse {
            id: c.id,
            name: c.name.clone(),
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Exactly one pricing mode per product: fixed needs `unit_price` and
/// `tax_rate` (the per-unit tax amount may be supplied or is derived);
/// variable needs `fixed_height` and `rate_per_unit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    /// fixed | variable
    pub pricing_kind: String,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: Option<String>,
    pub tax_rate: Option<String>,
    pub tax_amount: Option<String>,
    pub fixed_height: Option<String>,
    pub rate_per_unit: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub pricing_kind: String,
    pub unit_price: Option<String>,
    pub tax_rate: Option<String>,
    pub tax_amount: Option<String>,
    pub fixed_height: Option<String>,
    pub rate_per_unit: Option<String>,
    pub created_at: String,
}

impl ProductResponse {
    fn from_product(p: &Product) -> Self {
        let mut resp = ProductResponse {
            id: p.id,
            name: p.name.clone(),
            description: p.description.clone(),
            category_id: p.category_id,
            pricing_kind: String::new(),
            unit_price: None,
            tax_rate: None,
            tax_amount: None,
            fixed_height: None,
            rate_per_unit: None,
            created_at: p.created_at.to_rfc3339(),
        };
        match &p.pricing {
            ProductPricing::Fixed {
                unit_price,
                tax_rate,
                unit_tax,
            } => {
                resp.pricing_kind = "fixed".to_string();
                resp.unit_price = Some(unit_price.to_string());
                resp.tax_rate = Some(tax_rate.to_string());
                resp.tax_amount = Some(unit_tax.to_string());
            }
            ProductPricing::Variable {
                fixed_height,
                rate_per_unit,
            } => {
                resp.pricing_kind = "variable".to_string();
                resp.fixed_height = Some(fixed_height.to_string());
                resp.rate_per_unit = Some(rate_per_unit.to_string());
            }
        }
        resp
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductSummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub display_price: String,
}

impl ProductSummaryResponse {
    fn from_summary(s: &ProductSummary) -> Self {
        ProductSummaryResponse {
            id: s.id,
            name: s.name.clone(),
            display_price: s.display_price.to_string(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListProductsParams {
    pub category_id: Option<Uuid>,
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
pub struct ListProductsResponse {
    pub items: Vec<ProductResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RelatedParams {
    /// Number of related products to return. Defaults to 5, maximum 20.
    pub limit: Option<i64>,
}

fn parse_decimal(field: &str, raw: &Option<String>) -> Result<Option<BigDecimal>, AppError> {
    match raw {
        None => Ok(None),
        Some(s) => BigDecimal::from_str(s.trim())
            .map(Some)
            .map_err(|e| AppError::Validation(format!("Invalid {field} '{s}': {e}"))),
    }
}

fn pricing_from_request(body: &CreateProductRequest) -> Result<ProductPricing, AppError> {
    match body.pricing_kind.trim().to_ascii_lowercase().as_str() {
        "fixed" => {
            let unit_price = parse_decimal("unit_price", &body.unit_price)?
                .ok_or_else(|| AppError::Validation("unit_price is required".to_string()))?;
            let tax_rate = parse_decimal("tax_rate", &body.tax_rate)?
                .ok_or_else(|| AppError::Validation("tax_rate is required".to_string()))?;
            let unit_price = Money::new(unit_price);
            // The per-unit tax is stored precomputed; derive it when absent.
            let unit_tax = match parse_decimal("tax_amount", &body.tax_amount)? {
                Some(amount) => Money::new(amount),
                None => unit_price.times_rate(&tax_rate).rounded(),
            };
            Ok(ProductPricing::Fixed {
                unit_price,
                tax_rate,
                unit_tax,
            })
        }
        "variable" => {
            let fixed_height = parse_decimal("fixed_height", &body.fixed_height)?
                .ok_or_else(|| AppError::Validation("fixed_height is required".to_string()))?;
            let rate_per_unit = parse_decimal("rate_per_unit", &body.rate_per_unit)?
                .ok_or_else(|| AppError::Validation("rate_per_unit is required".to_string()))?;
            Ok(ProductPricing::Variable {
                fixed_height,
                rate_per_unit: Money::new(rate_per_unit),
            })
        }
        other => Err(AppError::Validation(format!(
            "unknown pricing kind '{other}'"
        ))),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /categories
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn create_category(
    services: web::Data<Services>,
    body: web::Json<CreateCategoryRequest>,
) -> Result<HttpResponse, AppError> {
    let input = NewCategory {
        name: body.into_inner().name,
    };
    let category = web::block(move || services.catalog.create_category(input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(CategoryResponse::from_category(&category)))
}

/// GET /categories
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "All categories", body = [CategoryResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn list_categories(
    services: web::Data<Services>,
) -> Result<HttpResponse, AppError> {
    let categories = web::block(move || services.catalog.list_categories())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(
        categories
            .iter()
            .map(CategoryResponse::from_category)
            .collect::<Vec<_>>(),
    ))
}

/// POST /products
#[utoipa::path(
    post,
    path = "/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Missing or invalid pricing fields"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn create_product(
    services: web::Data<Services>,
    body: web::Json<CreateProductRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let pricing = pricing_from_request(&body)?;
    let input = NewProduct {
        name: body.name,
        description: body.description,
        category_id: body.category_id,
        pricing,
    };

    let product = web::block(move || services.catalog.create_product(input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(ProductResponse::from_product(&product)))
}

/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    params(
        ("category_id" = Option<Uuid>, Query, description = "Restrict to one category"),
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated product list", body = ListProductsResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn list_products(
    services: web::Data<Services>,
    query: web::Query<ListProductsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);
    let category_id = params.category_id;

    let list = web::block(move || services.catalog.list_products(category_id, page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(ListProductsResponse {
        items: list.items.iter().map(ProductResponse::from_product).collect(),
        total: list.total,
        page,
        limit,
    }))
}

/// GET /products/{id}
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
    ),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let product = web::block(move || services.catalog.get_product(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    match product {
        Some(product) => Ok(HttpResponse::Ok().json(ProductResponse::from_product(&product))),
        None => Err(AppError::NotFound),
    }
}

/// GET /products/{id}/related
///
/// Same-category products, excluding the product itself. An empty list is a
/// valid result; the caller hides the section.
#[utoipa::path(
    get,
    path = "/products/{id}/related",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
        ("limit" = Option<i64>, Query, description = "Max related products (default 5, max 20)"),
    ),
    responses(
        (status = 200, description = "Related products, possibly empty", body = [ProductSummaryResponse]),
        (status = 404, description = "Product not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn related_products(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
    query: web::Query<RelatedParams>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let limit = query.into_inner().limit.unwrap_or(5).clamp(1, 20);

    let related = web::block(move || services.catalog.related_products(id, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(
        related
            .iter()
            .map(ProductSummaryResponse::from_summary)
            .collect::<Vec<_>>(),
    ))
}
