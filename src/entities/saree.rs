use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entity. Prices are stored in whole rupees.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sarees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub description: String,
    /// Main image plus up to three extra images, stored as media paths.
    #[sea_orm(nullable)]
    pub main_image: Option<String>,
    #[sea_orm(nullable)]
    pub extra_image_1: Option<String>,
    #[sea_orm(nullable)]
    pub extra_image_2: Option<String>,
    #[sea_orm(nullable)]
    pub extra_image_3: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// All configured image paths, main image first.
    pub fn all_images(&self) -> Vec<&str> {
        [
            self.main_image.as_deref(),
            self.extra_image_1.as_deref(),
            self.extra_image_2.as_deref(),
            self.extra_image_3.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cart_item::Entity")]
    CartItems,
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::cart_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_images_keeps_order_and_drops_gaps() {
        let saree = Model {
            id: Uuid::new_v4(),
            name: "Kanjivaram Silk".into(),
            price: 4500,
            description: String::new(),
            main_image: Some("sarees/main.jpg".into()),
            extra_image_1: None,
            extra_image_2: Some("sarees/drape.jpg".into()),
            extra_image_3: None,
            available: true,
            created_at: Utc::now(),
        };
        assert_eq!(saree.all_images(), vec!["sarees/main.jpg", "sarees/drape.jpg"]);
    }
}
