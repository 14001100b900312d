use crate::{
    entities::{cart, cart_item, saree, Cart, CartItem, Saree},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// One rendered cart line.
#[derive(Debug, Serialize)]
pub struct CartLine {
    pub item: cart_item::Model,
    pub saree: saree::Model,
}

/// Cart with lines and derived totals. Quantity is pinned to 1, so the
/// total price is the sum of the line sarees' prices.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub cart: cart::Model,
    pub lines: Vec<CartLine>,
    pub total_price: i64,
    pub total_items: usize,
}

/// Outcome of an add-to-cart request. A duplicate add is reported, not an
/// error: the storefront surfaces "already in your cart" as a message.
#[derive(Debug, Serialize)]
pub struct AddToCartOutcome {
    pub added: bool,
    pub already_in_cart: bool,
    pub saree_name: String,
    pub total_items: usize,
}

/// Shopping cart service: one cart per user, one unit per distinct saree.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Fetches the user's cart, creating it on first use.
    #[instrument(skip(self))]
    pub async fn get_or_create_cart(&self, user_id: Uuid) -> Result<cart::Model, ServiceError> {
        if let Some(existing) = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
        {
            return Ok(existing);
        }

        let now = Utc::now();
        let created = cart::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db)
        .await?;

        self.event_sender
            .send_or_log(Event::CartCreated(created.id))
            .await;
        Ok(created)
    }

    /// The user's cart with lines and totals.
    #[instrument(skip(self))]
    pub async fn view_cart(&self, user_id: Uuid) -> Result<CartView, ServiceError> {
        let cart = self.get_or_create_cart(user_id).await?;

        let items = cart
            .find_related(CartItem)
            .order_by_asc(cart_item::Column::AddedAt)
            .all(&*self.db)
            .await?;

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let saree = Saree::find_by_id(item.saree_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Saree {} not found", item.saree_id))
                })?;
            lines.push(CartLine { item, saree });
        }

        let total_price = lines.iter().map(|line| line.saree.price).sum();
        let total_items = lines.len();

        Ok(CartView {
            cart,
            lines,
            total_price,
            total_items,
        })
    }

    /// Adds one unit of a saree to the user's cart. Adding a saree that is
    /// already present leaves the cart unchanged and reports it.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: Uuid,
        saree_id: Uuid,
    ) -> Result<AddToCartOutcome, ServiceError> {
        let saree = Saree::find_by_id(saree_id)
            .filter(saree::Column::Available.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Saree {} not found", saree_id)))?;

        let cart = self.get_or_create_cart(user_id).await?;

        let txn = self.db.begin().await?;

        let existing = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .filter(cart_item::Column::SareeId.eq(saree_id))
            .one(&txn)
            .await?;

        if existing.is_some() {
            txn.commit().await?;
            let total_items = self.count_items(cart.id).await?;
            return Ok(AddToCartOutcome {
                added: false,
                already_in_cart: true,
                saree_name: saree.name,
                total_items,
            });
        }

        cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            cart_id: Set(cart.id),
            saree_id: Set(saree_id),
            quantity: Set(1),
            added_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await?;

        let mut cart_update: cart::ActiveModel = cart.clone().into();
        cart_update.updated_at = Set(Utc::now());
        cart_update.update(&txn).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                cart_id: cart.id,
                saree_id,
            })
            .await;

        info!("Added saree {} to cart {}", saree_id, cart.id);
        let total_items = self.count_items(cart.id).await?;
        Ok(AddToCartOutcome {
            added: true,
            already_in_cart: false,
            saree_name: saree.name,
            total_items,
        })
    }

    /// Removes a line from the user's cart; the line must belong to it.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<String, ServiceError> {
        let cart = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart not found".to_string()))?;

        let item = CartItem::find_by_id(item_id)
            .filter(cart_item::Column::CartId.eq(cart.id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Cart item {} not found", item_id)))?;

        let saree_name = Saree::find_by_id(item.saree_id)
            .one(&*self.db)
            .await?
            .map(|s| s.name)
            .unwrap_or_else(|| "Item".to_string());

        item.delete(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                cart_id: cart.id,
                item_id,
            })
            .await;

        Ok(saree_name)
    }

    /// Deletes every line in the user's cart.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let Some(cart) = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
        else {
            return Ok(());
        };

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.id))
            .exec(&*self.db)
            .await?;

        self.event_sender
            .send_or_log(Event::CartCleared(cart.id))
            .await;

        info!("Cleared cart: {}", cart.id);
        Ok(())
    }

    async fn count_items(&self, cart_id: Uuid) -> Result<usize, ServiceError> {
        let items = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart_id))
            .all(&*self.db)
            .await?;
        Ok(items.len())
    }
}
