use crate::{
    entities::{address, Address},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Address form input, shared by create and update.
#[derive(Debug, Deserialize, Validate, utoipa::ToSchema)]
pub struct AddressInput {
    /// Address label (e.g., Home, Office)
    #[validate(length(min = 1, max = 100))]
    pub label: String,
    #[validate(length(min = 1, max = 200))]
    pub full_name: String,
    #[validate(length(min = 6, max = 15))]
    pub phone: String,
    #[validate(length(min = 1, max = 255))]
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 100))]
    pub state: String,
    #[validate(length(min = 4, max = 10))]
    pub pincode: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Address book service. The default flag is enforced on the write path:
/// setting a new default unsets all prior defaults for that user first
/// (last-write-wins, not guarded against concurrent writers).
#[derive(Clone)]
pub struct AddressService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl AddressService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Lists the user's addresses, default first, then newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<address::Model>, ServiceError> {
        Ok(Address::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_desc(address::Column::IsDefault)
            .order_by_desc(address::Column::CreatedAt)
            .all(&*self.db)
            .await?)
    }

    /// Fetches one address, checking ownership.
    #[instrument(skip(self))]
    pub async fn get_owned(
        &self,
        user_id: Uuid,
        address_id: Uuid,
    ) -> Result<address::Model, ServiceError> {
        Address::find_by_id(address_id)
            .filter(address::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Address {} not found", address_id)))
    }

    #[instrument(skip(self, input))]
    pub async fn create(
        &self,
        user_id: Uuid,
        input: AddressInput,
    ) -> Result<address::Model, ServiceError> {
        input.validate()?;

        let txn = self.db.begin().await?;

        if input.is_default {
            self.unset_defaults(&txn, user_id).await?;
        }

        let created = address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            label: Set(input.label),
            full_name: Set(input.full_name),
            phone: Set(input.phone),
            address_line_1: Set(input.address_line_1),
            address_line_2: Set(input.address_line_2.filter(|l| !l.is_empty())),
            city: Set(input.city),
            state: Set(input.state),
            pincode: Set(input.pincode),
            is_default: Set(input.is_default),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::AddressCreated {
                user_id,
                address_id: created.id,
            })
            .await;

        info!("Created address {} for user {}", created.id, user_id);
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        input: AddressInput,
    ) -> Result<address::Model, ServiceError> {
        input.validate()?;

        let existing = self.get_owned(user_id, address_id).await?;

        let txn = self.db.begin().await?;

        if input.is_default && !existing.is_default {
            self.unset_defaults(&txn, user_id).await?;
        }

        let mut active: address::ActiveModel = existing.into();
        active.label = Set(input.label);
        active.full_name = Set(input.full_name);
        active.phone = Set(input.phone);
        active.address_line_1 = Set(input.address_line_1);
        active.address_line_2 = Set(input.address_line_2.filter(|l| !l.is_empty()));
        active.city = Set(input.city);
        active.state = Set(input.state);
        active.pincode = Set(input.pincode);
        active.is_default = Set(input.is_default);
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::AddressUpdated {
                user_id,
                address_id,
            })
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: Uuid, address_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_owned(user_id, address_id).await?;
        existing.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::AddressDeleted {
                user_id,
                address_id,
            })
            .await;

        Ok(())
    }

    async fn unset_defaults(
        &self,
        conn: &impl sea_orm::ConnectionTrait,
        user_id: Uuid,
    ) -> Result<(), ServiceError> {
        Address::update_many()
            .col_expr(address::Column::IsDefault, sea_orm::sea_query::Expr::value(false))
            .filter(address::Column::UserId.eq(user_id))
            .filter(address::Column::IsDefault.eq(true))
            .exec(conn)
            .await?;
        Ok(())
    }
}
