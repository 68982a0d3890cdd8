//! Back-in-stock subscriptions
//!
//! Buyers subscribe to a sold-out catalog product; when it is
//! restocked every subscriber is emailed once and the subscriptions
//! are cleared.

use std::sync::Arc;

use tracing::info;

use crate::db::models::{StockWatch, now_millis};
use crate::db::repository::StockWatchRepository;
use crate::services::catalog::CatalogStore;
use crate::services::mailer::{MailTemplate, Mailer};
use crate::utils::{AppError, AppResult, validate_email};

#[derive(Clone)]
pub struct StockWatchService {
    watches: StockWatchRepository,
    catalog: Arc<dyn CatalogStore>,
    mailer: Arc<dyn Mailer>,
}

impl StockWatchService {
    pub fn new(
        watches: StockWatchRepository,
        catalog: Arc<dyn CatalogStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            watches,
            catalog,
            mailer,
        }
    }

    /// Subscribe an email to a product's restock. One subscription
    /// per email and product.
    pub async fn subscribe(&self, email: &str, product_id: &str) -> AppResult<StockWatch> {
        validate_email(email, "email")?;
        let product_name = self
            .catalog
            .find_name(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {product_id} not found")))?;

        if self
            .watches
            .find_by_email_and_product(email, product_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Already subscribed. We will notify you when it is back in stock.".to_string(),
            ));
        }

        let watch = self
            .watches
            .create(StockWatch {
                id: None,
                email: email.to_string(),
                product_id: product_id.to_string(),
                product_name,
                created_at: now_millis(),
            })
            .await?;
        info!(email, product_id, "Stock watch registered");
        Ok(watch)
    }

    /// Remove a subscription; absent subscriptions are not an error
    pub async fn unsubscribe(&self, email: &str, product_id: &str) -> AppResult<()> {
        self.watches
            .delete_by_email_and_product(email, product_id)
            .await?;
        Ok(())
    }

    pub async fn list_all(&self) -> AppResult<Vec<StockWatch>> {
        Ok(self.watches.find_all().await?)
    }

    /// Notify every watcher of a restocked product, then clear the
    /// subscriptions. Returns the number of notifications sent.
    pub async fn notify_back_in_stock(&self, product_id: &str) -> AppResult<usize> {
        let watches = self.watches.find_by_product(product_id).await?;
        for watch in &watches {
            self.mailer
                .send(&watch.email, MailTemplate::BackInStock, &watch.product_name)
                .await;
        }
        self.watches.delete_by_product(product_id).await?;
        info!(product_id, count = watches.len(), "Back-in-stock notifications sent");
        Ok(watches.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::Surreal;
    use surrealdb::engine::local::Db;

    use crate::db::connect_mem;
    use crate::services::catalog::{PRODUCT_TABLE, SurrealCatalog};
    use crate::services::testing::MockMailer;

    async fn seed_product(db: &Surreal<Db>, key: &str) {
        db.query("CREATE type::thing($table, $id) SET name = 'Lamp', price = 20.0, stock = 0")
            .bind(("table", PRODUCT_TABLE))
            .bind(("id", key.to_string()))
            .await
            .unwrap();
    }

    async fn service() -> (StockWatchService, Arc<MockMailer>, Surreal<Db>) {
        let db = connect_mem().await;
        let mailer = Arc::new(MockMailer::new());
        let service = StockWatchService::new(
            StockWatchRepository::new(db.clone()),
            Arc::new(SurrealCatalog::new(db.clone())),
            mailer.clone(),
        );
        (service, mailer, db)
    }

    #[tokio::test]
    async fn subscribe_requires_existing_product() {
        let (service, _, _db) = service().await;
        let err = service.subscribe("a@example.com", "ghost").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_subscription_is_conflict() {
        let (service, _, db) = service().await;
        seed_product(&db, "p1").await;

        service.subscribe("a@example.com", "p1").await.unwrap();
        let err = service.subscribe("a@example.com", "p1").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // A different subscriber is fine
        service.subscribe("b@example.com", "p1").await.unwrap();
    }

    #[tokio::test]
    async fn notify_emails_watchers_once_and_clears() {
        let (service, mailer, db) = service().await;
        seed_product(&db, "p1").await;
        service.subscribe("a@example.com", "p1").await.unwrap();
        service.subscribe("b@example.com", "p1").await.unwrap();

        assert_eq!(service.notify_back_in_stock("p1").await.unwrap(), 2);
        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(_, t, _)| *t == MailTemplate::BackInStock));

        // Subscriptions cleared, second notify reaches nobody
        assert_eq!(service.notify_back_in_stock("p1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_missing_is_ok() {
        let (service, _, db) = service().await;
        seed_product(&db, "p1").await;
        service.unsubscribe("a@example.com", "p1").await.unwrap();
    }
}
