//! Shared application state
//!
//! Everything a request handler may need, built once at startup and
//! cloned cheaply into each handler. Collaborators sit behind trait
//! objects so tests can substitute recording fakes.

use std::path::Path;
use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::core::Config;
use crate::db;
use crate::db::repository::{
    IntakeQueryRepository, ListingRepository, OrderRepository, SettlementRepository,
    StockWatchRepository,
};
use crate::services::{
    AssetStorage, Cache, CacheInvalidator, CatalogStore, ConsignmentService, FulfillmentService,
    IntakeService, LocalAssetStorage, Mailer, MemoryCache, ResendMailer, SettlementService,
    StockWatchService, SurrealCatalog,
};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub cache: Arc<dyn Cache>,
    pub invalidator: CacheInvalidator,
    pub intake: IntakeService,
    pub consignment: ConsignmentService,
    pub settlement: SettlementService,
    pub fulfillment: FulfillmentService,
    pub stock_watch: StockWatchService,
}

impl AppState {
    /// Build the full service graph with the default collaborators:
    /// embedded database, in-process cache, filesystem asset storage
    /// and the Resend mailer.
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        tokio::fs::create_dir_all(&config.work_dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create work dir: {e}")))?;

        let db = db::connect(&config.work_dir).await?;

        let assets = LocalAssetStorage::new(Path::new(&config.work_dir).join("assets"), "/assets");
        assets
            .ensure_root()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create asset dir: {e}")))?;
        let assets: Arc<dyn AssetStorage> = Arc::new(assets);

        let mailer: Arc<dyn Mailer> =
            Arc::new(ResendMailer::new(&config.resend_key, &config.mail_from));
        let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
        let catalog: Arc<dyn CatalogStore> = Arc::new(SurrealCatalog::new(db.clone()));

        Ok(Self::with_collaborators(
            config.clone(),
            db,
            cache,
            assets,
            mailer,
            catalog,
        ))
    }

    /// Wire the service graph from explicit collaborators
    pub fn with_collaborators(
        config: Config,
        db: Surreal<Db>,
        cache: Arc<dyn Cache>,
        assets: Arc<dyn AssetStorage>,
        mailer: Arc<dyn Mailer>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        let invalidator = CacheInvalidator::new(cache.clone());

        let intake = IntakeService::new(
            IntakeQueryRepository::new(db.clone()),
            assets.clone(),
            mailer.clone(),
        );
        let consignment = ConsignmentService::new(
            ListingRepository::new(db.clone()),
            SettlementRepository::new(db.clone()),
            assets,
            mailer.clone(),
            cache.clone(),
            invalidator.clone(),
            &config,
        );
        let settlement = SettlementService::new(SettlementRepository::new(db.clone()));
        let fulfillment = FulfillmentService::new(
            OrderRepository::new(db.clone()),
            consignment.clone(),
            catalog.clone(),
            cache.clone(),
            invalidator.clone(),
            &config,
        );
        let stock_watch =
            StockWatchService::new(StockWatchRepository::new(db.clone()), catalog, mailer);

        Self {
            config,
            db,
            cache,
            invalidator,
            intake,
            consignment,
            settlement,
            fulfillment,
            stock_watch,
        }
    }
}
