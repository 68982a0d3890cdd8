//! Consignment listings and settlement-producing sales
//!
//! A listing only ever comes into existence by promoting an intake
//! query in `success` status; the promotion is a single atomic
//! exchange that consumes the query. Selling listed units goes
//! through `consume_stock`, which pairs the stock decrement with a
//! settlement ledger entry and retires the listing when it empties.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::Config;
use crate::db::models::{
    Listing, PaymentStatus, PhotoRef, ProductPatch, SettlementEntry, now_millis,
};
use crate::db::repository::{ListingRepository, ListingSearch, SettlementRepository};
use crate::services::assets::{AssetStorage, UploadFile};
use crate::services::cache::Cache;
use crate::services::invalidation::{CacheInvalidator, InvalidationScope};
use crate::services::mailer::{MailTemplate, Mailer};
use crate::utils::{
    AppError, AppResult, MAX_DESCRIPTION_LEN, MAX_NAME_LEN, validate_non_negative_amount,
    validate_photo_count, validate_positive_amount, validate_required_text,
};

/// One page of search results, shaped for caching
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchPage {
    pub products: Vec<Listing>,
    pub total_page: usize,
}

#[derive(Clone)]
pub struct ConsignmentService {
    listings: ListingRepository,
    settlements: SettlementRepository,
    assets: Arc<dyn AssetStorage>,
    mailer: Arc<dyn Mailer>,
    cache: Arc<dyn Cache>,
    invalidator: CacheInvalidator,
    cache_ttl_secs: u64,
    search_cache_ttl_secs: u64,
    per_page: usize,
}

impl ConsignmentService {
    pub fn new(
        listings: ListingRepository,
        settlements: SettlementRepository,
        assets: Arc<dyn AssetStorage>,
        mailer: Arc<dyn Mailer>,
        cache: Arc<dyn Cache>,
        invalidator: CacheInvalidator,
        config: &Config,
    ) -> Self {
        Self {
            listings,
            settlements,
            assets,
            mailer,
            cache,
            invalidator,
            cache_ttl_secs: config.cache_ttl_secs,
            search_cache_ttl_secs: config.search_cache_ttl_secs,
            per_page: config.product_per_page,
        }
    }

    async fn cache_put(&self, key: &str, value: String, ttl_secs: u64) {
        if let Err(e) = self.cache.set_with_ttl(key, value, ttl_secs).await {
            warn!(key, error = %e, "Cache write failed");
        }
    }

    fn cleanup_assets(&self, refs: &[PhotoRef]) {
        let assets = Arc::clone(&self.assets);
        let ids: Vec<String> = refs.iter().map(|p| p.asset_id.clone()).collect();
        tokio::spawn(async move {
            if let Err(e) = assets.delete(&ids).await {
                warn!(error = %e, ?ids, "Photo asset cleanup failed");
            }
        });
    }

    // ========== Mutations ==========

    /// Promote a `success` query into a live listing. The commission
    /// comes from the admin performing the promotion. On success the
    /// seller is notified and listing caches are invalidated.
    pub async fn promote(&self, query_id: &str, commission: f64) -> AppResult<Listing> {
        validate_non_negative_amount(commission, "commission")?;

        let listing = self.listings.promote_from_query(query_id, commission).await?;
        info!(query_id, listing_id = %listing.id_string(), "Query promoted into listing");

        self.mailer
            .send(
                &listing.seller_email,
                MailTemplate::ProductAccepted,
                &listing.product_details.name,
            )
            .await;
        self.invalidator
            .spawn(InvalidationScope::for_listing(listing.id_string()));
        Ok(listing)
    }

    /// Record the sale of `quantity` units. The decrement is the
    /// atomic gate: only after it succeeds does the ledger entry
    /// exist. A listing that reaches zero stock is deleted, its
    /// photos reclaimed and the seller told why.
    pub async fn consume_stock(
        &self,
        listing_id: &str,
        quantity: i64,
    ) -> AppResult<SettlementEntry> {
        if quantity < 1 {
            return Err(AppError::Validation(
                "Quantity must be at least 1".to_string(),
            ));
        }

        let after = self.listings.decrement_stock(listing_id, quantity).await?;

        // Ledger first: the sale is recorded before any notification
        // or cleanup gets a chance to stall.
        let now = now_millis();
        let entry = self
            .settlements
            .create(SettlementEntry {
                id: None,
                seller_user_id: after.seller_user_id.clone(),
                listing_id: after.id_string(),
                amount_owed: after.product_details.price * quantity as f64,
                commission: after.commission * quantity as f64,
                payment_status: PaymentStatus::Pending,
                created_at: now,
                updated_at: now,
            })
            .await?;

        if after.product_details.stock == 0 {
            if self.listings.delete(listing_id).await?.is_some() {
                self.cleanup_assets(&after.product_details.photos);
                self.mailer
                    .send(
                        &after.seller_email,
                        MailTemplate::ProductDepleted,
                        &after.product_details.name,
                    )
                    .await;
                info!(listing_id, "Listing retired after stock depletion");
            }
        }

        self.invalidator
            .spawn(InvalidationScope::for_listing(after.id_string()));
        Ok(entry)
    }

    /// Admin edit. New photos are stored before old ones are removed.
    pub async fn edit_by_admin(
        &self,
        listing_id: &str,
        product_patch: ProductPatch,
        commission: Option<f64>,
        new_photos: Vec<UploadFile>,
    ) -> AppResult<Listing> {
        let mut listing = self
            .listings
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))?;

        let old_photos = if new_photos.is_empty() {
            Vec::new()
        } else {
            validate_photo_count(new_photos.len())?;
            let refs = self.assets.upload(new_photos).await?;
            std::mem::replace(&mut listing.product_details.photos, refs)
        };
        let new_refs = listing.product_details.photos.clone();

        product_patch.apply(&mut listing.product_details);
        if let Some(v) = commission {
            listing.commission = v;
        }
        // Category stays normalized for the search index
        listing.product_details.category = listing.product_details.category.to_lowercase();

        let validated = validate_required_text(&listing.product_details.name, "name", MAX_NAME_LEN)
            .and_then(|()| {
                validate_required_text(
                    &listing.product_details.description,
                    "description",
                    MAX_DESCRIPTION_LEN,
                )
            })
            .and_then(|()| validate_positive_amount(listing.product_details.price, "price"))
            .and_then(|()| validate_non_negative_amount(listing.commission, "commission"));
        if let Err(e) = validated {
            if !old_photos.is_empty() {
                self.cleanup_assets(&new_refs);
            }
            return Err(e);
        }

        match self.listings.replace(listing_id, listing).await {
            Ok(updated) => {
                self.cleanup_assets(&old_photos);
                self.invalidator
                    .spawn(InvalidationScope::for_listing(updated.id_string()));
                Ok(updated)
            }
            Err(e) => {
                if !old_photos.is_empty() {
                    self.cleanup_assets(&new_refs);
                }
                Err(e.into())
            }
        }
    }

    /// Admin removal. The deletion is the primary effect; seller
    /// notification and asset cleanup are attempted afterwards and
    /// never fail the call.
    pub async fn delete_by_admin(&self, listing_id: &str) -> AppResult<()> {
        let deleted = self
            .listings
            .delete(listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))?;

        self.cleanup_assets(&deleted.product_details.photos);
        self.mailer
            .send(
                &deleted.seller_email,
                MailTemplate::ProductDeleted,
                &deleted.product_details.name,
            )
            .await;
        self.invalidator
            .spawn(InvalidationScope::for_listing(deleted.id_string()));
        info!(listing_id, "Listing deleted by admin");
        Ok(())
    }

    // ========== Cached reads ==========

    pub async fn latest(&self) -> AppResult<Vec<Listing>> {
        let key = "latest-reusable-products";
        if let Some(cached) = self.cache.get(key).await {
            if let Ok(listings) = serde_json::from_str(&cached) {
                return Ok(listings);
            }
        }
        let listings = self.listings.find_latest(5).await?;
        if let Ok(json) = serde_json::to_string(&listings) {
            self.cache_put(key, json, self.cache_ttl_secs).await;
        }
        Ok(listings)
    }

    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let key = "reusable-categories";
        if let Some(cached) = self.cache.get(key).await {
            if let Ok(categories) = serde_json::from_str(&cached) {
                return Ok(categories);
            }
        }
        let categories = self.listings.categories().await?;
        if let Ok(json) = serde_json::to_string(&categories) {
            self.cache_put(key, json, self.cache_ttl_secs).await;
        }
        Ok(categories)
    }

    fn search_key(params: &ListingSearch) -> String {
        format!(
            "reusable-products-{}-{}-{}-{}-{}",
            params.search.as_deref().unwrap_or(""),
            params.sort.map(|s| s.as_str()).unwrap_or(""),
            params.category.as_deref().unwrap_or(""),
            params.max_price.map(|p| p.to_string()).unwrap_or_default(),
            params.page,
        )
    }

    /// Filtered, paginated browse. Every distinct filter combination
    /// caches under its own short-lived key.
    pub async fn search(&self, mut params: ListingSearch) -> AppResult<SearchPage> {
        if params.per_page == 0 {
            params.per_page = self.per_page;
        }
        if params.page == 0 {
            params.page = 1;
        }
        let key = Self::search_key(&params);
        if let Some(cached) = self.cache.get(&key).await {
            if let Ok(page) = serde_json::from_str(&cached) {
                return Ok(page);
            }
        }
        let (products, total_page) = self.listings.search(&params).await?;
        let page = SearchPage {
            products,
            total_page,
        };
        if let Ok(json) = serde_json::to_string(&page) {
            self.cache_put(&key, json, self.search_cache_ttl_secs).await;
        }
        Ok(page)
    }

    pub async fn get(&self, listing_id: &str) -> AppResult<Listing> {
        let key = format!(
            "reusable-product-{}",
            crate::db::repository::strip_table_prefix(
                crate::db::repository::listing::LISTING_TABLE,
                listing_id
            )
        );
        if let Some(cached) = self.cache.get(&key).await {
            if let Ok(listing) = serde_json::from_str(&cached) {
                return Ok(listing);
            }
        }
        let listing = self
            .listings
            .find_by_id(listing_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Listing {listing_id} not found")))?;
        if let Ok(json) = serde_json::to_string(&listing) {
            self.cache_put(&key, json, self.cache_ttl_secs).await;
        }
        Ok(listing)
    }

    pub async fn list_all(&self) -> AppResult<Vec<Listing>> {
        Ok(self.listings.find_all().await?)
    }

    pub async fn list_by_seller(&self, seller_user_id: &str) -> AppResult<Vec<Listing>> {
        Ok(self.listings.find_by_seller(seller_user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use surrealdb::Surreal;
    use surrealdb::engine::local::Db;

    use crate::db::connect_mem;
    use crate::db::models::{
        IntakeQuery, PickupDetails, ProductDetails, QueryStatus,
    };
    use crate::db::repository::IntakeQueryRepository;
    use crate::services::cache::MemoryCache;
    use crate::services::testing::{MockAssets, MockMailer};

    struct Harness {
        service: ConsignmentService,
        settlements: SettlementRepository,
        cache: Arc<MemoryCache>,
        assets: Arc<MockAssets>,
        mailer: Arc<MockMailer>,
        db: Surreal<Db>,
    }

    fn test_config() -> Config {
        Config {
            work_dir: String::new(),
            http_port: 0,
            cache_ttl_secs: 60,
            search_cache_ttl_secs: 30,
            product_per_page: 8,
            rate_limit_max_requests: 8,
            rate_limit_window_secs: 30,
            resend_key: String::new(),
            mail_from: String::new(),
        }
    }

    async fn harness() -> Harness {
        let db = connect_mem().await;
        let cache = Arc::new(MemoryCache::new());
        let assets = Arc::new(MockAssets::new());
        let mailer = Arc::new(MockMailer::new());
        let settlements = SettlementRepository::new(db.clone());
        let service = ConsignmentService::new(
            ListingRepository::new(db.clone()),
            settlements.clone(),
            assets.clone(),
            mailer.clone(),
            cache.clone(),
            CacheInvalidator::new(cache.clone()),
            &test_config(),
        );
        Harness {
            service,
            settlements,
            cache,
            assets,
            mailer,
            db,
        }
    }

    async fn seed_success_query(db: &Surreal<Db>, price: f64, stock: i64) -> String {
        let repo = IntakeQueryRepository::new(db.clone());
        let created = repo
            .create(IntakeQuery {
                id: None,
                owner_user_id: "seller1".into(),
                owner_email: "seller1@example.com".into(),
                product_details: ProductDetails {
                    name: "Road Bike".into(),
                    category: "Sports".into(),
                    description: "Well kept".into(),
                    price,
                    stock,
                    photos: vec![crate::db::models::PhotoRef {
                        asset_id: "a1.jpg".into(),
                        url: "/assets/a1.jpg".into(),
                    }],
                },
                pickup_details: PickupDetails {
                    address: "1 Main St".into(),
                    city: "Metropolis".into(),
                    postal_code: "12345".into(),
                },
                status: QueryStatus::Success,
                created_at: crate::db::models::now_millis(),
                updated_at: crate::db::models::now_millis(),
            })
            .await
            .unwrap();
        created.id.unwrap().to_string()
    }

    /// Mailer that records whether the pending ledger entry already
    /// existed when the depletion mail went out
    struct LedgerCheckingMailer {
        settlements: SettlementRepository,
        entry_before_mail: AtomicBool,
    }

    #[async_trait]
    impl Mailer for LedgerCheckingMailer {
        async fn send(&self, _to: &str, template: MailTemplate, _product_name: &str) {
            if template == MailTemplate::ProductDepleted {
                let pending = self
                    .settlements
                    .find_by_status(PaymentStatus::Pending)
                    .await
                    .unwrap_or_default();
                self.entry_before_mail
                    .store(!pending.is_empty(), Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn promote_notifies_seller() {
        let h = harness().await;
        let query_id = seed_success_query(&h.db, 100.0, 3).await;

        let listing = h.service.promote(&query_id, 10.0).await.unwrap();
        assert_eq!(listing.total_price(), 110.0);

        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "seller1@example.com");
        assert_eq!(sent[0].1, MailTemplate::ProductAccepted);
    }

    #[tokio::test]
    async fn promote_rejects_negative_commission() {
        let h = harness().await;
        let query_id = seed_success_query(&h.db, 100.0, 3).await;
        let err = h.service.promote(&query_id, -1.0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn consume_stock_records_settlement() {
        let h = harness().await;
        let query_id = seed_success_query(&h.db, 100.0, 5).await;
        let listing = h.service.promote(&query_id, 10.0).await.unwrap();

        let entry = h.service.consume_stock(&listing.id_string(), 2).await.unwrap();
        assert_eq!(entry.amount_owed, 200.0);
        assert_eq!(entry.commission, 20.0);
        assert_eq!(entry.payment_status, PaymentStatus::Pending);
        assert_eq!(entry.seller_user_id, "seller1");

        // Listing survives with reduced stock
        let remaining = h.service.get(&listing.id_string()).await.unwrap();
        assert_eq!(remaining.product_details.stock, 3);
    }

    #[tokio::test]
    async fn depleting_sale_retires_listing_and_settles_full_amount() {
        let h = harness().await;
        let query_id = seed_success_query(&h.db, 100.0, 5).await;
        let listing = h.service.promote(&query_id, 10.0).await.unwrap();
        let listing_id = listing.id_string();

        let entry = h.service.consume_stock(&listing_id, 5).await.unwrap();
        assert_eq!(entry.amount_owed, 500.0);
        assert_eq!(entry.commission, 50.0);
        assert_eq!(entry.payment_status, PaymentStatus::Pending);

        // Listing is gone
        assert!(matches!(
            h.service.get(&listing_id).await,
            Err(AppError::NotFound(_))
        ));

        // Seller got acceptance at promotion, depletion notice at sale
        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].1, MailTemplate::ProductDepleted);

        tokio::task::yield_now().await;
        assert_eq!(h.assets.deleted_count(), 1);

        // Ledger entry survives the listing
        let entries = h
            .settlements
            .find_by_seller("seller1", None)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn depletion_ledger_exists_before_seller_is_mailed() {
        let db = connect_mem().await;
        let cache = Arc::new(MemoryCache::new());
        let settlements = SettlementRepository::new(db.clone());
        let mailer = Arc::new(LedgerCheckingMailer {
            settlements: settlements.clone(),
            entry_before_mail: AtomicBool::new(false),
        });
        let service = ConsignmentService::new(
            ListingRepository::new(db.clone()),
            settlements,
            Arc::new(MockAssets::new()),
            mailer.clone(),
            cache.clone(),
            CacheInvalidator::new(cache),
            &test_config(),
        );

        let query_id = seed_success_query(&db, 100.0, 1).await;
        let listing = service.promote(&query_id, 10.0).await.unwrap();
        service.consume_stock(&listing.id_string(), 1).await.unwrap();

        assert!(mailer.entry_before_mail.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn oversell_leaves_no_settlement() {
        let h = harness().await;
        let query_id = seed_success_query(&h.db, 100.0, 1).await;
        let listing = h.service.promote(&query_id, 0.0).await.unwrap();

        let err = h
            .service
            .consume_stock(&listing.id_string(), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock(_)));

        let entries = h
            .settlements
            .find_by_seller("seller1", None)
            .await
            .unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn reads_are_served_from_cache_until_invalidated() {
        let h = harness().await;
        let query_id = seed_success_query(&h.db, 100.0, 5).await;
        let listing = h.service.promote(&query_id, 10.0).await.unwrap();

        // Prime the latest view
        let latest = h.service.latest().await.unwrap();
        assert_eq!(latest.len(), 1);
        assert!(h.cache.get("latest-reusable-products").await.is_some());

        // Deletion invalidates the listing key family
        h.service.delete_by_admin(&listing.id_string()).await.unwrap();
        tokio::task::yield_now().await;
        assert!(h.cache.get("latest-reusable-products").await.is_none());
    }

    #[tokio::test]
    async fn edit_updates_commission_and_normalizes_category() {
        let h = harness().await;
        let query_id = seed_success_query(&h.db, 100.0, 5).await;
        let listing = h.service.promote(&query_id, 10.0).await.unwrap();

        let updated = h
            .service
            .edit_by_admin(
                &listing.id_string(),
                ProductPatch {
                    category: Some("Outdoor Gear".into()),
                    ..Default::default()
                },
                Some(15.0),
                vec![],
            )
            .await
            .unwrap();
        assert_eq!(updated.commission, 15.0);
        assert_eq!(updated.product_details.category, "outdoor gear");
        assert_eq!(updated.total_price(), 115.0);
    }

    #[tokio::test]
    async fn search_pages_are_cached_per_filter() {
        let h = harness().await;
        let query_id = seed_success_query(&h.db, 100.0, 5).await;
        h.service.promote(&query_id, 10.0).await.unwrap();

        let page = h
            .service
            .search(ListingSearch {
                category: Some("sports".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.total_page, 1);
        assert!(
            h.cache
                .get("reusable-products---sports--1")
                .await
                .is_some()
        );
    }
}
