//! Catalog collaborator
//!
//! First-party catalog products live in their own `product` table,
//! outside the consignment lifecycle. Fulfillment only needs two
//! things from them: an atomic stock decrement and a name lookup for
//! back-in-stock notifications, so that is the whole trait surface.

use async_trait::async_trait;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::repository::{RepoError, RepoResult, strip_table_prefix};

pub const PRODUCT_TABLE: &str = "product";

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Atomically decrement stock, failing when the product is missing
    /// or holds fewer than `quantity` units
    async fn decrement_stock(&self, product_id: &str, quantity: i64) -> RepoResult<()>;

    /// Add stock back to a product
    async fn replenish(&self, product_id: &str, quantity: i64) -> RepoResult<()>;

    /// Product name, `None` when the product does not exist
    async fn find_name(&self, product_id: &str) -> RepoResult<Option<String>>;
}

#[derive(Deserialize)]
struct ProductRow {
    #[allow(dead_code)]
    stock: i64,
}

#[derive(Deserialize)]
struct ProductName {
    name: String,
}

/// Catalog over the embedded document store
pub struct SurrealCatalog {
    db: Surreal<Db>,
}

impl SurrealCatalog {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    fn key_of(product_id: &str) -> &str {
        strip_table_prefix(PRODUCT_TABLE, product_id)
    }

    async fn exists(&self, key: &str) -> RepoResult<bool> {
        let mut result = self
            .db
            .query("SELECT name FROM type::thing($table, $id)")
            .bind(("table", PRODUCT_TABLE))
            .bind(("id", key.to_string()))
            .await?;
        let rows: Vec<ProductName> = result.take(0)?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl CatalogStore for SurrealCatalog {
    async fn decrement_stock(&self, product_id: &str, quantity: i64) -> RepoResult<()> {
        let key = Self::key_of(product_id);
        // Single-statement guard so concurrent orders cannot oversell
        let mut result = self
            .db
            .query(
                "UPDATE type::thing($table, $id) SET stock -= $qty \
                 WHERE stock >= $qty RETURN AFTER",
            )
            .bind(("table", PRODUCT_TABLE))
            .bind(("id", key.to_string()))
            .bind(("qty", quantity))
            .await?;
        let updated: Vec<ProductRow> = result.take(0)?;
        if !updated.is_empty() {
            return Ok(());
        }
        // Empty result is either a missing product or not enough stock
        if self.exists(key).await? {
            Err(RepoError::InsufficientStock(format!(
                "Not enough stock for product {product_id}"
            )))
        } else {
            Err(RepoError::NotFound(format!("Product {product_id} not found")))
        }
    }

    async fn replenish(&self, product_id: &str, quantity: i64) -> RepoResult<()> {
        let key = Self::key_of(product_id);
        let mut result = self
            .db
            .query("UPDATE type::thing($table, $id) SET stock += $qty RETURN AFTER")
            .bind(("table", PRODUCT_TABLE))
            .bind(("id", key.to_string()))
            .bind(("qty", quantity))
            .await?;
        let updated: Vec<ProductRow> = result.take(0)?;
        if updated.is_empty() {
            return Err(RepoError::NotFound(format!("Product {product_id} not found")));
        }
        Ok(())
    }

    async fn find_name(&self, product_id: &str) -> RepoResult<Option<String>> {
        let key = Self::key_of(product_id);
        let mut result = self
            .db
            .query("SELECT name FROM type::thing($table, $id)")
            .bind(("table", PRODUCT_TABLE))
            .bind(("id", key.to_string()))
            .await?;
        let rows: Vec<ProductName> = result.take(0)?;
        Ok(rows.into_iter().next().map(|row| row.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_mem;

    async fn seed(db: &Surreal<Db>, key: &str, name: &str, stock: i64) {
        db.query("CREATE type::thing($table, $id) SET name = $name, price = 10.0, stock = $stock")
            .bind(("table", PRODUCT_TABLE))
            .bind(("id", key.to_string()))
            .bind(("name", name.to_string()))
            .bind(("stock", stock))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn decrement_guards_stock_and_existence() {
        let db = connect_mem().await;
        let catalog = SurrealCatalog::new(db.clone());
        seed(&db, "p1", "Lamp", 3).await;

        catalog.decrement_stock("p1", 2).await.unwrap();
        assert!(matches!(
            catalog.decrement_stock("p1", 2).await,
            Err(RepoError::InsufficientStock(_))
        ));
        assert!(matches!(
            catalog.decrement_stock("ghost", 1).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn replenish_and_name_lookup() {
        let db = connect_mem().await;
        let catalog = SurrealCatalog::new(db.clone());
        seed(&db, "p1", "Lamp", 0).await;

        catalog.replenish("product:p1", 5).await.unwrap();
        catalog.decrement_stock("p1", 5).await.unwrap();

        assert_eq!(catalog.find_name("p1").await.unwrap().as_deref(), Some("Lamp"));
        assert_eq!(catalog.find_name("ghost").await.unwrap(), None);
    }
}
