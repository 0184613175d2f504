use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::address::{Address, AddressKind, AddressUpdate, NewAddress};
use crate::errors::AppError;
use crate::Services;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAddressRequest {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    /// shipping | billing | other. Defaults to shipping.
    pub kind: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAddressRequest {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddressResponse {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub kind: String,
    pub is_default: bool,
    pub created_at: String,
}

impl AddressResponse {
    fn from_address(a: &Address) -> Self {
        AddressResponse {
            id: a.id,
            street: a.street.clone(),
            city: a.city.clone(),
            state: a.state.clone(),
            postal_code: a.postal_code.clone(),
            country: a.country.clone(),
            kind: a.kind.as_str().to_string(),
            is_default: a.is_default,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /users/{user_id}/addresses
#[utoipa::path(
    get,
    path = "/users/{user_id}/addresses",
    params(
        ("user_id" = Uuid, Path, description = "Address owner"),
    ),
    responses(
        (status = 200, description = "Addresses in creation order", body = [AddressResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "addresses"
)]
pub async fn list_addresses(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let addresses = web::block(move || services.addresses.list(user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(
        addresses
            .iter()
            .map(AddressResponse::from_address)
            .collect::<Vec<_>>(),
    ))
}

/// POST /users/{user_id}/addresses
///
/// A user's first address always becomes the default, whatever the flag
/// says.
#[utoipa::path(
    post,
    path = "/users/{user_id}/addresses",
    request_body = CreateAddressRequest,
    params(
        ("user_id" = Uuid, Path, description = "Address owner"),
    ),
    responses(
        (status = 201, description = "Address created", body = AddressResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "addresses"
)]
pub async fn create_address(
    services: web::Data<Services>,
    path: web::Path<Uuid>,
    body: web::Json<CreateAddressRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let body = body.into_inner();
    let kind = match body.kind.as_deref() {
        Some(raw) => AddressKind::parse(raw)?,
        None => AddressKind::Shipping,
    };
    let input = NewAddress {
        street: body.street,
        city: body.city,
        state: body.state,
        postal_code: body.postal_code,
        country: body.country,
        kind,
        is_default: body.is_default,
    };

    let address = web::block(move || services.addresses.create(user_id, input))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Created().json(AddressResponse::from_address(&address)))
}

/// PUT /users/{user_id}/addresses/{address_id}
#[utoipa::path(
    put,
    path = "/users/{user_id}/addresses/{address_id}",
    request_body = UpdateAddressRequest,
    params(
        ("user_id" = Uuid, Path, description = "Address owner"),
        ("address_id" = Uuid, Path, description = "Address to change"),
    ),
    responses(
        (status = 200, description = "Address updated", body = AddressResponse),
        (status = 404, description = "Address not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "addresses"
)]
pub async fn update_address(
    services: web::Data<Services>,
    path: web::Path<(Uuid, Uuid)>,
    body: web::Json<UpdateAddressRequest>,
) -> Result<HttpResponse, AppError> {
    let (user_id, address_id) = path.into_inner();
    let body = body.into_inner();
    let kind = body.kind.as_deref().map(AddressKind::parse).transpose()?;
    let change = AddressUpdate {
        street: body.street,
        city: body.city,
        state: body.state,
        postal_code: body.postal_code,
        country: body.country,
        kind,
    };

    let address = web::block(move || services.addresses.update(user_id, address_id, change))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(AddressResponse::from_address(&address)))
}

/// DELETE /users/{user_id}/addresses/{address_id}
///
/// Returns the remaining addresses; when the default was deleted, the
/// earliest-created survivor has already been promoted.
#[utoipa::path(
    delete,
    path = "/users/{user_id}/addresses/{address_id}",
    params(
        ("user_id" = Uuid, Path, description = "Address owner"),
        ("address_id" = Uuid, Path, description = "Address to delete"),
    ),
    responses(
        (status = 200, description = "Remaining addresses", body = [AddressResponse]),
        (status = 404, description = "Address not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "addresses"
)]
pub async fn delete_address(
    services: web::Data<Services>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (user_id, address_id) = path.into_inner();
    let remaining = web::block(move || services.addresses.delete(user_id, address_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(
        remaining
            .iter()
            .map(AddressResponse::from_address)
            .collect::<Vec<_>>(),
    ))
}

/// POST /users/{user_id}/addresses/{address_id}/default
#[utoipa::path(
    post,
    path = "/users/{user_id}/addresses/{address_id}/default",
    params(
        ("user_id" = Uuid, Path, description = "Address owner"),
        ("address_id" = Uuid, Path, description = "Address to make the default"),
    ),
    responses(
        (status = 200, description = "New default address", body = AddressResponse),
        (status = 404, description = "Address not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "addresses"
)]
pub async fn set_default_address(
    services: web::Data<Services>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (user_id, address_id) = path.into_inner();
    let address = web::block(move || services.addresses.set_default(user_id, address_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(HttpResponse::Ok().json(AddressResponse::from_address(&address)))
}
