//! Order fulfillment orchestrator
//!
//! Splits a mixed cart into consignment lines and first-party catalog
//! lines, applies stock effects line by line, and persists the order
//! document last. Processing is fail-fast: the first failing line
//! aborts the order and no order document is written.
//!
//! Partitioning goes by record-id namespace: ids in the `listing`
//! table are consignment lines, everything else is catalog. The two
//! tables never share ids, so this matches resolving each id against
//! live listings; a stale listing id fails as a consignment not-found
//! instead of falling through to the catalog path.
//!
//! Known window: lines already applied before a later line fails are
//! NOT rolled back. Their stock decrements (and any settlement
//! entries) stand without an order referencing them. Closing the
//! window needs compensation or a cross-table transaction; until then
//! it is an accepted operational cost surfaced in the logs.

use std::sync::Arc;

use tracing::{info, warn};

use crate::core::Config;
use crate::db::models::{Order, OrderItem, OrderStatus, ShippingInfo, now_millis};
use crate::db::repository::OrderRepository;
use crate::db::repository::listing::LISTING_TABLE;
use crate::services::cache::Cache;
use crate::services::catalog::CatalogStore;
use crate::services::consignment::ConsignmentService;
use crate::services::invalidation::{CacheInvalidator, InvalidationScope};
use crate::utils::{AppError, AppResult, validate_non_negative_amount, validate_required_text};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PlaceOrder {
    pub user_id: String,
    pub shipping_info: ShippingInfo,
    pub order_items: Vec<OrderItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_charges: f64,
    pub discount: f64,
    pub total: f64,
}

#[derive(Clone)]
pub struct FulfillmentService {
    orders: OrderRepository,
    consignment: ConsignmentService,
    catalog: Arc<dyn CatalogStore>,
    cache: Arc<dyn Cache>,
    invalidator: CacheInvalidator,
    cache_ttl_secs: u64,
}

impl FulfillmentService {
    pub fn new(
        orders: OrderRepository,
        consignment: ConsignmentService,
        catalog: Arc<dyn CatalogStore>,
        cache: Arc<dyn Cache>,
        invalidator: CacheInvalidator,
        config: &Config,
    ) -> Self {
        Self {
            orders,
            consignment,
            catalog,
            cache,
            invalidator,
            cache_ttl_secs: config.cache_ttl_secs,
        }
    }

    fn validate(req: &PlaceOrder) -> AppResult<()> {
        validate_required_text(&req.user_id, "user id", 200)?;
        validate_required_text(&req.shipping_info.address, "address", 500)?;
        validate_required_text(&req.shipping_info.city, "city", 200)?;
        validate_required_text(&req.shipping_info.state, "state", 200)?;
        validate_required_text(&req.shipping_info.country, "country", 200)?;
        validate_required_text(&req.shipping_info.pin_code, "pin code", 20)?;
        if req.order_items.is_empty() {
            return Err(AppError::Validation(
                "Order must contain at least one item".to_string(),
            ));
        }
        for item in &req.order_items {
            if item.quantity < 1 {
                return Err(AppError::Validation(format!(
                    "Invalid quantity for item {}",
                    item.product_id
                )));
            }
        }
        validate_non_negative_amount(req.subtotal, "subtotal")?;
        validate_non_negative_amount(req.tax, "tax")?;
        validate_non_negative_amount(req.shipping_charges, "shipping charges")?;
        validate_non_negative_amount(req.discount, "discount")?;
        validate_non_negative_amount(req.total, "total")?;
        Ok(())
    }

    /// Place an order over a mixed cart. Consignment lines settle
    /// through the consignment service; catalog lines only decrement
    /// stock. The order document is written once every line applied.
    pub async fn place(&self, req: PlaceOrder) -> AppResult<Order> {
        Self::validate(&req)?;

        let mut listing_ids = Vec::new();
        let mut product_ids = Vec::new();
        for item in &req.order_items {
            if item.product_id.starts_with(&format!("{LISTING_TABLE}:")) {
                self.consignment
                    .consume_stock(&item.product_id, item.quantity)
                    .await
                    .inspect_err(|e| {
                        warn!(
                            item = %item.product_id,
                            error = %e,
                            "Order aborted mid-cart; earlier lines are not rolled back"
                        );
                    })?;
                listing_ids.push(item.product_id.clone());
            } else {
                self.catalog
                    .decrement_stock(&item.product_id, item.quantity)
                    .await
                    .inspect_err(|e| {
                        warn!(
                            item = %item.product_id,
                            error = %e,
                            "Order aborted mid-cart; earlier lines are not rolled back"
                        );
                    })?;
                product_ids.push(item.product_id.clone());
            }
        }

        let now = now_millis();
        let order = self
            .orders
            .create(Order {
                id: None,
                user_id: req.user_id.clone(),
                shipping_info: req.shipping_info,
                order_items: req.order_items,
                subtotal: req.subtotal,
                tax: req.tax,
                shipping_charges: req.shipping_charges,
                discount: req.discount,
                total: req.total,
                status: OrderStatus::Processing,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(order_id = ?order.id, user_id = %req.user_id, "Order placed");

        let order_id = order.id.as_ref().map(|id| id.to_string());
        self.invalidator.spawn(InvalidationScope {
            catalog_product: !product_ids.is_empty(),
            listing: !listing_ids.is_empty(),
            product_ids,
            listing_ids,
            ..InvalidationScope::for_order(req.user_id, order_id)
        });
        Ok(order)
    }

    /// Admin processing step: processing → shipped → delivered.
    /// Delivered orders stay delivered.
    pub async fn process(&self, order_id: &str) -> AppResult<Order> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;
        let updated = if order.status == OrderStatus::Delivered {
            order
        } else {
            self.orders
                .update_status(order_id, order.status.next())
                .await?
        };
        self.invalidator.spawn(InvalidationScope::for_order(
            updated.user_id.clone(),
            Some(order_id.to_string()),
        ));
        Ok(updated)
    }

    /// Admin deletion of an order document. Stock and settlements are
    /// untouched; this removes the record only.
    pub async fn delete(&self, order_id: &str) -> AppResult<()> {
        let deleted = self
            .orders
            .delete(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;
        self.invalidator.spawn(InvalidationScope::for_order(
            deleted.user_id,
            Some(order_id.to_string()),
        ));
        Ok(())
    }

    // ========== Cached reads ==========

    async fn cache_put(&self, key: &str, value: String) {
        if let Err(e) = self.cache.set_with_ttl(key, value, self.cache_ttl_secs).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    pub async fn my_orders(&self, user_id: &str) -> AppResult<Vec<Order>> {
        let key = format!("my-orders-{user_id}");
        if let Some(cached) = self.cache.get(&key).await {
            if let Ok(orders) = serde_json::from_str(&cached) {
                return Ok(orders);
            }
        }
        let orders = self.orders.find_by_user(user_id).await?;
        if let Ok(json) = serde_json::to_string(&orders) {
            self.cache_put(&key, json).await;
        }
        Ok(orders)
    }

    pub async fn all_orders(&self) -> AppResult<Vec<Order>> {
        let key = "all-orders";
        if let Some(cached) = self.cache.get(key).await {
            if let Ok(orders) = serde_json::from_str(&cached) {
                return Ok(orders);
            }
        }
        let orders = self.orders.find_all().await?;
        if let Ok(json) = serde_json::to_string(&orders) {
            self.cache_put(key, json).await;
        }
        Ok(orders)
    }

    pub async fn get(&self, order_id: &str) -> AppResult<Order> {
        let key = format!(
            "order-{}",
            crate::db::repository::strip_table_prefix(
                crate::db::repository::order::ORDER_TABLE,
                order_id
            )
        );
        if let Some(cached) = self.cache.get(&key).await {
            if let Ok(order) = serde_json::from_str(&cached) {
                return Ok(order);
            }
        }
        let order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order {order_id} not found")))?;
        if let Ok(json) = serde_json::to_string(&order) {
            self.cache_put(&key, json).await;
        }
        Ok(order)
    }
}
