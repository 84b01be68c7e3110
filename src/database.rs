//! # Document store
//!
//! User and order persistence behind the [`Store`] trait. Production runs
//! on Redis hashes; tests and local development use the in-memory backend.
//!
//! Layout in Redis:
//! - `users`: hash, lowercased email → user JSON
//! - `user_ids`: hash, user id → email (secondary index for id lookups)
//! - `orders`: hash, order id → order JSON
//! - `user_orders:{user_id}`: list of order ids, most recent first
//!
//! Status updates are a plain read-modify-write with no optimistic guard.
//! Two concurrent cancels of the same order both land on `cancelled`,
//! which the design tolerates.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use parking_lot::RwLock;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};

use crate::{
    error::AppError,
    models::{Order, OrderStatus, PaymentProfile, User},
};

const USERS_KEY: &str = "users";
const USER_IDS_KEY: &str = "user_ids";
const ORDERS_KEY: &str = "orders";

fn user_orders_key(user_id: &str) -> String {
    format!("user_orders:{user_id}")
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError>;
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    /// Replaces the saved payment profile; returns the updated user, or
    /// `None` if the id is unknown.
    async fn update_payment_info(
        &self,
        user_id: &str,
        info: &PaymentProfile,
    ) -> Result<Option<User>, AppError>;

    async fn insert_order(&self, order: &Order) -> Result<(), AppError>;
    async fn find_order(&self, id: &str) -> Result<Option<Order>, AppError>;
    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<(), AppError>;
    /// Up to `limit` of the owner's orders, most recent first.
    async fn recent_orders_for(&self, user_id: &str, limit: usize)
        -> Result<Vec<Order>, AppError>;
}

// ---------------------------------------------------------------------
// Redis backend

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Self {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(100));

        let client = Client::open(redis_url).expect("Invalid Redis URL!");
        let connection = client
            .get_connection_manager_with_config(config)
            .await
            .expect("Failed to connect to Redis!");

        Self { connection }
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let raw: Option<String> = self.conn().hget(USERS_KEY, email).await?;
        raw.map(|json| serde_json::from_str(&json)).transpose().map_err(Into::into)
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        let email: Option<String> = self.conn().hget(USER_IDS_KEY, id).await?;
        match email {
            Some(email) => self.find_user_by_email(&email).await,
            None => Ok(None),
        }
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let json = serde_json::to_string(user)?;
        let mut conn = self.conn();
        let _: () = conn.hset(USERS_KEY, &user.email, json).await?;
        let _: () = conn.hset(USER_IDS_KEY, &user.id, &user.email).await?;
        Ok(())
    }

    async fn update_payment_info(
        &self,
        user_id: &str,
        info: &PaymentProfile,
    ) -> Result<Option<User>, AppError> {
        let Some(mut user) = self.find_user_by_id(user_id).await? else {
            return Ok(None);
        };
        user.saved_payment_info = Some(info.clone());

        let json = serde_json::to_string(&user)?;
        let _: () = self.conn().hset(USERS_KEY, &user.email, json).await?;
        Ok(Some(user))
    }

    async fn insert_order(&self, order: &Order) -> Result<(), AppError> {
        let json = serde_json::to_string(order)?;
        let mut conn = self.conn();
        let _: () = conn.hset(ORDERS_KEY, &order.id, json).await?;
        let _: () = conn.lpush(user_orders_key(&order.user_id), &order.id).await?;
        Ok(())
    }

    async fn find_order(&self, id: &str) -> Result<Option<Order>, AppError> {
        let raw: Option<String> = self.conn().hget(ORDERS_KEY, id).await?;
        raw.map(|json| serde_json::from_str(&json)).transpose().map_err(Into::into)
    }

    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<(), AppError> {
        let Some(mut order) = self.find_order(id).await? else {
            return Err(AppError::NotFound("Order not found"));
        };
        order.status = status;

        let json = serde_json::to_string(&order)?;
        let _: () = self.conn().hset(ORDERS_KEY, id, json).await?;
        Ok(())
    }

    async fn recent_orders_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Order>, AppError> {
        let mut conn = self.conn();
        let ids: Vec<String> = conn
            .lrange(user_orders_key(user_id), 0, limit as isize - 1)
            .await?;

        let mut orders = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(order) = self.find_order(&id).await? {
                orders.push(order);
            }
        }
        Ok(orders)
    }
}

// ---------------------------------------------------------------------
// In-memory backend

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    orders: RwLock<HashMap<String, Order>>,
    // Owner id → order ids, most recent first.
    by_owner: RwLock<HashMap<String, Vec<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().get(email).cloned())
    }

    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().values().find(|u| u.id == id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.users.write().insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn update_payment_info(
        &self,
        user_id: &str,
        info: &PaymentProfile,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.write();
        let Some(user) = users.values_mut().find(|u| u.id == user_id) else {
            return Ok(None);
        };
        user.saved_payment_info = Some(info.clone());
        Ok(Some(user.clone()))
    }

    async fn insert_order(&self, order: &Order) -> Result<(), AppError> {
        self.orders.write().insert(order.id.clone(), order.clone());
        self.by_owner
            .write()
            .entry(order.user_id.clone())
            .or_default()
            .insert(0, order.id.clone());
        Ok(())
    }

    async fn find_order(&self, id: &str) -> Result<Option<Order>, AppError> {
        Ok(self.orders.read().get(id).cloned())
    }

    async fn update_order_status(&self, id: &str, status: OrderStatus) -> Result<(), AppError> {
        let mut orders = self.orders.write();
        let Some(order) = orders.get_mut(id) else {
            return Err(AppError::NotFound("Order not found"));
        };
        order.status = status;
        Ok(())
    }

    async fn recent_orders_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<Order>, AppError> {
        let by_owner = self.by_owner.read();
        let orders = self.orders.read();

        Ok(by_owner
            .get(user_id)
            .into_iter()
            .flatten()
            .take(limit)
            .filter_map(|id| orders.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeliveryAddress, OrderItem, OrderSummary, PaymentDetails};
    use chrono::Utc;

    fn order(id: &str, user_id: &str) -> Order {
        Order {
            id: id.into(),
            user_id: user_id.into(),
            customer_name: "Pat".into(),
            customer_email: "pat@example.com".into(),
            items: vec![OrderItem {
                id: "i-1".into(),
                name: "Ramen".into(),
                price: 11.0,
                quantity: 2,
                restaurant_name: "Noodle Bar".into(),
            }],
            payment_details: PaymentDetails {
                card_number: "4242".into(),
                card_name: "Pat".into(),
                expiry_date: "12/27".into(),
            },
            delivery_address: DeliveryAddress {
                address: "1 Main St".into(),
                city: "Springfield".into(),
                zip_code: "11111".into(),
            },
            order_summary: OrderSummary {
                subtotal: 22.0,
                delivery_fee: 2.0,
                service_fee: 1.0,
                total: 25.0,
            },
            status: OrderStatus::Confirmed,
            order_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn recent_orders_are_most_recent_first_and_bounded() {
        let store = MemoryStore::new();
        for i in 0..12 {
            store.insert_order(&order(&format!("o-{i}"), "u-1")).await.unwrap();
        }

        let recent = store.recent_orders_for("u-1", 10).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].id, "o-11");
        assert_eq!(recent[9].id, "o-2");
    }

    #[tokio::test]
    async fn listings_are_scoped_to_the_owner() {
        let store = MemoryStore::new();
        store.insert_order(&order("o-a", "u-a")).await.unwrap();
        store.insert_order(&order("o-b", "u-b")).await.unwrap();

        let for_a = store.recent_orders_for("u-a", 10).await.unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_a[0].id, "o-a");
    }

    #[tokio::test]
    async fn update_status_on_unknown_order_is_not_found() {
        let store = MemoryStore::new();
        let result = store.update_order_status("missing", OrderStatus::Cancelled).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
