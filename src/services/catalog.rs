use crate::{
    entities::{saree, Saree},
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Read-side catalog service. Catalog maintenance is an administrative
/// concern outside the storefront surface.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Lists sarees currently offered for sale, newest first.
    #[instrument(skip(self))]
    pub async fn list_available(&self) -> Result<Vec<saree::Model>, ServiceError> {
        Ok(Saree::find()
            .filter(saree::Column::Available.eq(true))
            .order_by_desc(saree::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Fetches one available saree; unknown or withdrawn items read as
    /// missing.
    #[instrument(skip(self))]
    pub async fn get_available(&self, saree_id: Uuid) -> Result<saree::Model, ServiceError> {
        Saree::find_by_id(saree_id)
            .filter(saree::Column::Available.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Saree {} not found", saree_id)))
    }

    /// Image paths for one saree, main image first.
    #[instrument(skip(self))]
    pub async fn images(&self, saree_id: Uuid) -> Result<Vec<String>, ServiceError> {
        let saree = self.get_available(saree_id).await?;
        Ok(saree.all_images().into_iter().map(String::from).collect())
    }
}
