//! Service Module
//!
//! Business services plus the collaborator traits they depend on
//! (asset storage, mail, cache, catalog). Services own the lifecycle
//! rules; repositories only persist.

pub mod assets;
pub mod cache;
pub mod catalog;
pub mod consignment;
pub mod fulfillment;
pub mod intake;
pub mod invalidation;
pub mod mailer;
pub mod settlement;
pub mod stock_watch;

#[cfg(test)]
pub mod testing;

// Re-exports
pub use assets::{AssetStorage, LocalAssetStorage, UploadFile};
pub use cache::{Cache, MemoryCache};
pub use catalog::{CatalogStore, SurrealCatalog};
pub use consignment::ConsignmentService;
pub use fulfillment::{FulfillmentService, PlaceOrder};
pub use intake::{IntakeService, ProductDraft, SubmitQuery};
pub use invalidation::{CacheInvalidator, InvalidationScope};
pub use mailer::{MailTemplate, Mailer, ResendMailer};
pub use settlement::SettlementService;
pub use stock_watch::StockWatchService;
