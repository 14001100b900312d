use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Order entity. One row per purchased saree; all rows created in a single
/// checkout share one `razorpay_order_id` and settle together.
///
/// A row is created in `PaymentState::Pending` with the gateway order id
/// already allocated, is mutated exactly once (by settlement, which attaches
/// the payment id and signature), and is never mutated again.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub saree_id: Uuid,
    /// Absent for guest orders.
    #[sea_orm(nullable)]
    pub user_id: Option<Uuid>,
    pub quantity: i32,
    #[sea_orm(nullable)]
    pub delivery_address_id: Option<Uuid>,
    // Guest contact fields, retained for backward compatibility when no
    // structured address exists.
    #[sea_orm(nullable)]
    pub guest_name: Option<String>,
    #[sea_orm(nullable)]
    pub guest_email: Option<String>,
    #[sea_orm(nullable)]
    pub guest_phone: Option<String>,
    #[sea_orm(nullable)]
    pub guest_address: Option<String>,
    #[sea_orm(indexed)]
    pub razorpay_order_id: String,
    #[sea_orm(nullable)]
    pub razorpay_payment_id: Option<String>,
    #[sea_orm(nullable)]
    pub razorpay_signature: Option<String>,
    pub payment_state: PaymentState,
    /// Whole rupees.
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn is_paid(&self) -> bool {
        self.payment_state == PaymentState::Paid
    }

    /// Short human-facing order reference used in notifications and receipts.
    pub fn reference(&self) -> String {
        self.id.simple().to_string()[..8].to_uppercase()
    }
}

/// Payment state of an order: a one-way `pending -> paid` transition guarded
/// by the settlement commit step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentState {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::saree::Entity",
        from = "Column::SareeId",
        to = "super::saree::Column::Id"
    )]
    Saree,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::DeliveryAddressId",
        to = "super::address::Column::Id"
    )]
    DeliveryAddress,
}

impl Related<super::saree::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Saree.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DeliveryAddress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
