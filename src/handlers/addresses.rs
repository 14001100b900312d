use crate::{
    auth::CurrentUser, entities::address, errors::ServiceError,
    services::addresses::AddressInput, AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Address book entry as rendered to the caller.
#[derive(Debug, Serialize, ToSchema)]
pub struct AddressResponse {
    pub id: Uuid,
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<address::Model> for AddressResponse {
    fn from(model: address::Model) -> Self {
        Self {
            id: model.id,
            label: model.label,
            full_name: model.full_name,
            phone: model.phone,
            address_line_1: model.address_line_1,
            address_line_2: model.address_line_2,
            city: model.city,
            state: model.state,
            pincode: model.pincode,
            is_default: model.is_default,
            created_at: model.created_at,
        }
    }
}

/// List the caller's addresses
#[utoipa::path(
    get,
    path = "/api/v1/addresses",
    responses(
        (status = 200, description = "Addresses, default first", body = [AddressResponse])
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn list_addresses(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<AddressResponse>>, ServiceError> {
    let addresses = state.services.addresses.list(user.id).await?;
    Ok(Json(
        addresses.into_iter().map(AddressResponse::from).collect(),
    ))
}

/// Add an address
#[utoipa::path(
    post,
    path = "/api/v1/addresses",
    request_body = AddressInput,
    responses(
        (status = 201, description = "Address created", body = AddressResponse),
        (status = 400, description = "Invalid address fields", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn create_address(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<AddressInput>,
) -> Result<(StatusCode, Json<AddressResponse>), ServiceError> {
    let created = state.services.addresses.create(user.id, input).await?;
    Ok((StatusCode::CREATED, Json(AddressResponse::from(created))))
}

/// Update an address
#[utoipa::path(
    put,
    path = "/api/v1/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address id")),
    request_body = AddressInput,
    responses(
        (status = 200, description = "Address updated", body = AddressResponse),
        (status = 404, description = "Not the caller's address", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn update_address(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<AddressInput>,
) -> Result<Json<AddressResponse>, ServiceError> {
    let updated = state.services.addresses.update(user.id, id, input).await?;
    Ok(Json(AddressResponse::from(updated)))
}

/// Delete an address
#[utoipa::path(
    delete,
    path = "/api/v1/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address id")),
    responses(
        (status = 204, description = "Address deleted"),
        (status = 404, description = "Not the caller's address", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.addresses.delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
