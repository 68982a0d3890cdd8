//! Stock Watch Repository
//!
//! Back-in-stock subscriptions, unique per (email, product).

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::StockWatch;

pub const STOCK_WATCH_TABLE: &str = "stock_watch";

#[derive(Clone)]
pub struct StockWatchRepository {
    base: BaseRepository,
}

impl StockWatchRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(&self, watch: StockWatch) -> RepoResult<StockWatch> {
        let created: Option<StockWatch> =
            self.base.db().create(STOCK_WATCH_TABLE).content(watch).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create stock watch".to_string()))
    }

    pub async fn find_by_email_and_product(
        &self,
        email: &str,
        product_id: &str,
    ) -> RepoResult<Option<StockWatch>> {
        let watches: Vec<StockWatch> = self
            .base
            .db()
            .query("SELECT * FROM stock_watch WHERE email = $email AND product_id = $product")
            .bind(("email", email.to_string()))
            .bind(("product", product_id.to_string()))
            .await?
            .take(0)?;
        Ok(watches.into_iter().next())
    }

    pub async fn find_by_product(&self, product_id: &str) -> RepoResult<Vec<StockWatch>> {
        let watches: Vec<StockWatch> = self
            .base
            .db()
            .query("SELECT * FROM stock_watch WHERE product_id = $product")
            .bind(("product", product_id.to_string()))
            .await?
            .take(0)?;
        Ok(watches)
    }

    pub async fn find_all(&self) -> RepoResult<Vec<StockWatch>> {
        let watches: Vec<StockWatch> = self
            .base
            .db()
            .query("SELECT * FROM stock_watch ORDER BY created_at")
            .await?
            .take(0)?;
        Ok(watches)
    }

    /// Remove one subscription; removing a missing one is not an error
    pub async fn delete_by_email_and_product(
        &self,
        email: &str,
        product_id: &str,
    ) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE stock_watch WHERE email = $email AND product_id = $product")
            .bind(("email", email.to_string()))
            .bind(("product", product_id.to_string()))
            .await?;
        Ok(())
    }

    /// Remove every subscription for a product (after notifying)
    pub async fn delete_by_product(&self, product_id: &str) -> RepoResult<()> {
        self.base
            .db()
            .query("DELETE stock_watch WHERE product_id = $product")
            .bind(("product", product_id.to_string()))
            .await?;
        Ok(())
    }
}
