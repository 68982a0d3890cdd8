//! Order Repository
//!
//! The order document is written only after fulfillment has finished
//! all stock mutations; see the fulfillment service.

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::{Order, OrderStatus, now_millis};

pub const ORDER_TABLE: &str = "order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn record_id(id: &str) -> RecordId {
        RecordId::from_table_key(ORDER_TABLE, strip_table_prefix(ORDER_TABLE, id))
    }

    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Order>> {
        let order: Option<Order> = self.base.db().select(Self::record_id(id)).await?;
        Ok(order)
    }

    pub async fn find_by_user(&self, user_id: &str) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE user_id = $user ORDER BY created_at DESC")
            .bind(("user", user_id.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn find_all(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(orders)
    }

    pub async fn update_status(&self, id: &str, status: OrderStatus) -> RepoResult<Order> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET status = $status, updated_at = $now RETURN AFTER")
            .bind(("thing", Self::record_id(id)))
            .bind(("status", status))
            .bind(("now", now_millis()))
            .await?;
        let orders: Vec<Order> = result.take(0)?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Order {} not found", id)))
    }

    pub async fn delete(&self, id: &str) -> RepoResult<Option<Order>> {
        let deleted: Option<Order> = self.base.db().delete(Self::record_id(id)).await?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_mem;
    use crate::db::models::{OrderItem, ShippingInfo};

    fn sample_order(user: &str) -> Order {
        Order {
            id: None,
            user_id: user.to_string(),
            shipping_info: ShippingInfo {
                address: "1 Main St".into(),
                city: "Metropolis".into(),
                state: "NY".into(),
                country: "US".into(),
                pin_code: "12345".into(),
            },
            order_items: vec![OrderItem {
                product_id: "product:p1".into(),
                quantity: 2,
                price: 20.0,
            }],
            subtotal: 40.0,
            tax: 4.0,
            shipping_charges: 0.0,
            discount: 0.0,
            total: 44.0,
            status: OrderStatus::Processing,
            created_at: now_millis(),
            updated_at: now_millis(),
        }
    }

    #[tokio::test]
    async fn order_lifecycle() {
        let db = connect_mem().await;
        let repo = OrderRepository::new(db);

        let created = repo.create(sample_order("u1")).await.unwrap();
        let id = created.id.unwrap().to_string();

        let shipped = repo.update_status(&id, OrderStatus::Shipped).await.unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        assert_eq!(repo.find_by_user("u1").await.unwrap().len(), 1);
        assert!(repo.find_by_user("u2").await.unwrap().is_empty());

        assert!(repo.delete(&id).await.unwrap().is_some());
        assert!(repo.find_by_id(&id).await.unwrap().is_none());
    }
}
