use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery address entity. At most one row per user carries
/// `is_default = true`; the write path unsets prior defaults first.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    /// Address label, e.g. "Home" or "Office".
    pub label: String,
    pub full_name: String,
    pub phone: String,
    pub address_line_1: String,
    #[sea_orm(nullable)]
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Single-line rendering used in notification bodies.
    pub fn full_address(&self) -> String {
        let mut parts = vec![self.address_line_1.clone()];
        if let Some(line2) = &self.address_line_2 {
            if !line2.is_empty() {
                parts.push(line2.clone());
            }
        }
        parts.push(self.city.clone());
        parts.push(self.state.clone());
        parts.push(self.pincode.clone());
        parts.join(", ")
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
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
    use chrono::Utc;

    fn sample() -> Model {
        Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            label: "Home".into(),
            full_name: "Lakshmi Priya".into(),
            phone: "+919876543210".into(),
            address_line_1: "12 Temple Street".into(),
            address_line_2: Some("Near Bus Stand".into()),
            city: "Kanchipuram".into(),
            state: "Tamil Nadu".into(),
            pincode: "631501".into(),
            is_default: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn full_address_includes_second_line_when_present() {
        let addr = sample();
        assert_eq!(
            addr.full_address(),
            "12 Temple Street, Near Bus Stand, Kanchipuram, Tamil Nadu, 631501"
        );
    }

    #[test]
    fn full_address_skips_missing_second_line() {
        let mut addr = sample();
        addr.address_line_2 = None;
        assert_eq!(
            addr.full_address(),
            "12 Temple Street, Kanchipuram, Tamil Nadu, 631501"
        );
    }
}
