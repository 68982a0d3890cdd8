//! Intake Query Repository

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::{IntakeQuery, QueryStatus, now_millis};

pub const QUERY_TABLE: &str = "intake_query";

#[derive(Clone)]
pub struct IntakeQueryRepository {
    base: BaseRepository,
}

impl IntakeQueryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn record_id(id: &str) -> RecordId {
        RecordId::from_table_key(QUERY_TABLE, strip_table_prefix(QUERY_TABLE, id))
    }

    /// Persist a new query
    pub async fn create(&self, query: IntakeQuery) -> RepoResult<IntakeQuery> {
        let created: Option<IntakeQuery> =
            self.base.db().create(QUERY_TABLE).content(query).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create intake query".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<IntakeQuery>> {
        let query: Option<IntakeQuery> = self.base.db().select(Self::record_id(id)).await?;
        Ok(query)
    }

    /// All queries submitted by one owner, newest first
    pub async fn find_by_owner(&self, owner_user_id: &str) -> RepoResult<Vec<IntakeQuery>> {
        let queries: Vec<IntakeQuery> = self
            .base
            .db()
            .query("SELECT * FROM intake_query WHERE owner_user_id = $owner ORDER BY created_at DESC")
            .bind(("owner", owner_user_id.to_string()))
            .await?
            .take(0)?;
        Ok(queries)
    }

    /// Admin view: queries in one state, oldest first (FIFO review)
    pub async fn find_by_status(&self, status: QueryStatus) -> RepoResult<Vec<IntakeQuery>> {
        let queries: Vec<IntakeQuery> = self
            .base
            .db()
            .query("SELECT * FROM intake_query WHERE status = $status ORDER BY created_at")
            .bind(("status", status.as_str()))
            .await?
            .take(0)?;
        Ok(queries)
    }

    /// Set the status field, returning the updated record
    pub async fn update_status(&self, id: &str, status: QueryStatus) -> RepoResult<IntakeQuery> {
        let mut result = self
            .base
            .db()
            .query("UPDATE $thing SET status = $status, updated_at = $now RETURN AFTER")
            .bind(("thing", Self::record_id(id)))
            .bind(("status", status.as_str()))
            .bind(("now", now_millis()))
            .await?;
        let queries: Vec<IntakeQuery> = result.take(0)?;
        queries
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("Intake query {} not found", id)))
    }

    /// Replace the whole document (owner edits)
    pub async fn replace(&self, id: &str, mut query: IntakeQuery) -> RepoResult<IntakeQuery> {
        query.id = None;
        query.updated_at = now_millis();
        let updated: Option<IntakeQuery> = self
            .base
            .db()
            .update(Self::record_id(id))
            .content(query)
            .await?;
        updated.ok_or_else(|| RepoError::NotFound(format!("Intake query {} not found", id)))
    }

    /// Delete, returning the removed record if it existed
    pub async fn delete(&self, id: &str) -> RepoResult<Option<IntakeQuery>> {
        let deleted: Option<IntakeQuery> = self.base.db().delete(Self::record_id(id)).await?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_mem;
    use crate::db::models::{PhotoRef, PickupDetails, ProductDetails};

    fn sample_query(owner: &str) -> IntakeQuery {
        IntakeQuery {
            id: None,
            owner_user_id: owner.to_string(),
            owner_email: format!("{owner}@example.com"),
            product_details: ProductDetails {
                name: "Mountain Bike".into(),
                category: "sports".into(),
                description: "Lightly used".into(),
                price: 150.0,
                stock: 1,
                photos: vec![PhotoRef {
                    asset_id: "a1".into(),
                    url: "/assets/a1.jpg".into(),
                }],
            },
            pickup_details: PickupDetails {
                address: "1 Main St".into(),
                city: "Metropolis".into(),
                postal_code: "12345".into(),
            },
            status: QueryStatus::Pending,
            created_at: now_millis(),
            updated_at: now_millis(),
        }
    }

    #[tokio::test]
    async fn create_and_find_roundtrip() {
        let db = connect_mem().await;
        let repo = IntakeQueryRepository::new(db);

        let created = repo.create(sample_query("u1")).await.unwrap();
        let id = created.id.as_ref().unwrap().to_string();

        let found = repo.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.owner_user_id, "u1");
        assert_eq!(found.status, QueryStatus::Pending);
        assert_eq!(found.product_details.photos.len(), 1);
    }

    #[tokio::test]
    async fn find_by_status_filters() {
        let db = connect_mem().await;
        let repo = IntakeQueryRepository::new(db);

        let a = repo.create(sample_query("u1")).await.unwrap();
        repo.create(sample_query("u2")).await.unwrap();
        repo.update_status(&a.id.unwrap().to_string(), QueryStatus::Approved)
            .await
            .unwrap();

        let pending = repo.find_by_status(QueryStatus::Pending).await.unwrap();
        let approved = repo.find_by_status(QueryStatus::Approved).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].owner_user_id, "u1");
    }

    #[tokio::test]
    async fn delete_returns_removed_record() {
        let db = connect_mem().await;
        let repo = IntakeQueryRepository::new(db);

        let created = repo.create(sample_query("u1")).await.unwrap();
        let id = created.id.unwrap().to_string();

        let deleted = repo.delete(&id).await.unwrap();
        assert!(deleted.is_some());
        assert!(repo.find_by_id(&id).await.unwrap().is_none());
        // Second delete is a no-op
        assert!(repo.delete(&id).await.unwrap().is_none());
    }
}
