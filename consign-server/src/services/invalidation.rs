//! Cache Invalidation Coordinator
//!
//! Translates "what changed" into the exact cache keys to drop.
//! Invalidation runs after the primary write commits and is spawned
//! off the request path: a failed delete only shortens freshness,
//! never correctness, because every cached entry also carries a TTL.

use std::sync::Arc;

use tracing::warn;

use crate::db::repository::listing::LISTING_TABLE;
use crate::db::repository::order::ORDER_TABLE;
use crate::db::repository::strip_table_prefix;
use crate::services::cache::Cache;
use crate::services::catalog::PRODUCT_TABLE;

/// What a mutation touched. Flags select key families; the id fields
/// scope the per-entity keys.
#[derive(Debug, Default, Clone)]
pub struct InvalidationScope {
    pub catalog_product: bool,
    pub listing: bool,
    pub order: bool,
    pub admin_stats: bool,
    pub reviews: bool,
    pub user_id: Option<String>,
    pub order_id: Option<String>,
    pub product_ids: Vec<String>,
    pub listing_ids: Vec<String>,
}

impl InvalidationScope {
    pub fn for_listing(listing_id: impl Into<String>) -> Self {
        Self {
            listing: true,
            admin_stats: true,
            listing_ids: vec![listing_id.into()],
            ..Self::default()
        }
    }

    pub fn for_order(user_id: impl Into<String>, order_id: Option<String>) -> Self {
        Self {
            order: true,
            admin_stats: true,
            user_id: Some(user_id.into()),
            order_id,
            ..Self::default()
        }
    }
}

#[derive(Clone)]
pub struct CacheInvalidator {
    cache: Arc<dyn Cache>,
}

impl CacheInvalidator {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Expand a scope into concrete keys. Paginated search keys are
    /// not enumerable and are left to their short TTL instead.
    pub fn keys(scope: &InvalidationScope) -> Vec<String> {
        let mut keys = Vec::new();
        if scope.listing {
            keys.push("latest-reusable-products".to_string());
            keys.push("reusable-categories".to_string());
            for id in &scope.listing_ids {
                let key = strip_table_prefix(LISTING_TABLE, id);
                keys.push(format!("reusable-product-{key}"));
            }
        }
        if scope.catalog_product {
            keys.push("latest-products".to_string());
            keys.push("categories".to_string());
            keys.push("all-products".to_string());
            for id in &scope.product_ids {
                let key = strip_table_prefix(PRODUCT_TABLE, id);
                keys.push(format!("product-{key}"));
            }
        }
        if scope.reviews {
            for id in &scope.product_ids {
                let key = strip_table_prefix(PRODUCT_TABLE, id);
                keys.push(format!("reviews-{key}"));
            }
        }
        if scope.order {
            keys.push("all-orders".to_string());
            if let Some(user_id) = &scope.user_id {
                keys.push(format!("my-orders-{user_id}"));
            }
            if let Some(order_id) = &scope.order_id {
                let key = strip_table_prefix(ORDER_TABLE, order_id);
                keys.push(format!("order-{key}"));
            }
        }
        if scope.admin_stats {
            keys.push("admin-stats".to_string());
            keys.push("admin-pie-charts".to_string());
            keys.push("admin-bar-charts".to_string());
            keys.push("admin-line-charts".to_string());
        }
        keys
    }

    pub async fn invalidate(&self, scope: InvalidationScope) {
        let keys = Self::keys(&scope);
        if keys.is_empty() {
            return;
        }
        if let Err(e) = self.cache.delete(&keys).await {
            warn!(error = %e, ?scope, "Cache invalidation failed, entries will expire by TTL");
        }
    }

    /// Run invalidation off the request path
    pub fn spawn(&self, scope: InvalidationScope) {
        let this = self.clone();
        tokio::spawn(async move {
            this.invalidate(scope).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::MemoryCache;

    #[test]
    fn listing_scope_expands_to_listing_keys() {
        let keys = CacheInvalidator::keys(&InvalidationScope::for_listing("listing:abc"));
        assert!(keys.contains(&"latest-reusable-products".to_string()));
        assert!(keys.contains(&"reusable-categories".to_string()));
        assert!(keys.contains(&"reusable-product-abc".to_string()));
        assert!(keys.contains(&"admin-stats".to_string()));
        assert!(!keys.contains(&"all-orders".to_string()));
    }

    #[test]
    fn order_scope_expands_to_order_keys() {
        let scope = InvalidationScope {
            catalog_product: true,
            product_ids: vec!["product:p1".to_string()],
            ..InvalidationScope::for_order("u1", Some("order:o1".to_string()))
        };
        let keys = CacheInvalidator::keys(&scope);
        assert!(keys.contains(&"all-orders".to_string()));
        assert!(keys.contains(&"my-orders-u1".to_string()));
        assert!(keys.contains(&"order-o1".to_string()));
        assert!(keys.contains(&"product-p1".to_string()));
        assert!(keys.contains(&"latest-products".to_string()));
    }

    #[tokio::test]
    async fn invalidate_drops_cached_entries() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set_with_ttl("latest-reusable-products", "[]".to_string(), 60)
            .await
            .unwrap();
        cache
            .set_with_ttl("reusable-product-abc", "{}".to_string(), 60)
            .await
            .unwrap();
        cache
            .set_with_ttl("all-orders", "[]".to_string(), 60)
            .await
            .unwrap();

        let invalidator = CacheInvalidator::new(cache.clone());
        invalidator
            .invalidate(InvalidationScope::for_listing("abc"))
            .await;

        assert_eq!(cache.get("latest-reusable-products").await, None);
        assert_eq!(cache.get("reusable-product-abc").await, None);
        // Untouched family survives
        assert_eq!(cache.get("all-orders").await.as_deref(), Some("[]"));
    }
}
