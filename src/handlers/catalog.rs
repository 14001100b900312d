use crate::{entities::saree, errors::ServiceError, AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Catalog entry as rendered to the storefront.
#[derive(Debug, Serialize, ToSchema)]
pub struct SareeResponse {
    pub id: Uuid,
    pub name: String,
    /// Whole rupees.
    pub price: i64,
    pub description: String,
    pub images: Vec<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl From<saree::Model> for SareeResponse {
    fn from(model: saree::Model) -> Self {
        let images = model.all_images().into_iter().map(String::from).collect();
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            description: model.description,
            images,
            available: model.available,
            created_at: model.created_at,
        }
    }
}

/// List sarees available for sale
#[utoipa::path(
    get,
    path = "/api/v1/sarees",
    responses(
        (status = 200, description = "Available sarees", body = [SareeResponse])
    ),
    tag = "Catalog"
)]
pub async fn list_sarees(
    State(state): State<AppState>,
) -> Result<Json<Vec<SareeResponse>>, ServiceError> {
    let sarees = state.services.catalog.list_available().await?;
    Ok(Json(sarees.into_iter().map(SareeResponse::from).collect()))
}

/// Fetch one saree
#[utoipa::path(
    get,
    path = "/api/v1/sarees/{id}",
    params(("id" = Uuid, Path, description = "Saree id")),
    responses(
        (status = 200, description = "Saree detail", body = SareeResponse),
        (status = 404, description = "Unknown or unavailable saree", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_saree(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SareeResponse>, ServiceError> {
    let saree = state.services.catalog.get_available(id).await?;
    Ok(Json(SareeResponse::from(saree)))
}

/// Image paths for one saree
#[utoipa::path(
    get,
    path = "/api/v1/sarees/{id}/images",
    params(("id" = Uuid, Path, description = "Saree id")),
    responses(
        (status = 200, description = "Image paths, main image first", body = [String]),
        (status = 404, description = "Unknown or unavailable saree", body = crate::errors::ErrorResponse)
    ),
    tag = "Catalog"
)]
pub async fn get_saree_images(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<String>>, ServiceError> {
    Ok(Json(state.services.catalog.images(id).await?))
}
