//! Settlement Ledger Repository
//!
//! Append-mostly: entries are created by sales and never deleted.
//! The only mutation is the pending → completed status flip.

use surrealdb::{RecordId, Surreal};
use surrealdb::engine::local::Db;

use super::{BaseRepository, RepoError, RepoResult, strip_table_prefix};
use crate::db::models::{PaymentStatus, SettlementEntry, now_millis};

pub const SETTLEMENT_TABLE: &str = "settlement";

#[derive(Clone)]
pub struct SettlementRepository {
    base: BaseRepository,
}

impl SettlementRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn record_id(id: &str) -> RecordId {
        RecordId::from_table_key(SETTLEMENT_TABLE, strip_table_prefix(SETTLEMENT_TABLE, id))
    }

    pub async fn create(&self, entry: SettlementEntry) -> RepoResult<SettlementEntry> {
        let created: Option<SettlementEntry> =
            self.base.db().create(SETTLEMENT_TABLE).content(entry).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create settlement entry".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<SettlementEntry>> {
        let entry: Option<SettlementEntry> = self.base.db().select(Self::record_id(id)).await?;
        Ok(entry)
    }

    /// Entries owed to one seller, optionally filtered by status
    pub async fn find_by_seller(
        &self,
        seller_user_id: &str,
        status: Option<PaymentStatus>,
    ) -> RepoResult<Vec<SettlementEntry>> {
        let mut query = String::from(
            "SELECT * FROM settlement WHERE seller_user_id = $seller",
        );
        if status.is_some() {
            query.push_str(" AND payment_status = $status");
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut q = self
            .base
            .db()
            .query(query)
            .bind(("seller", seller_user_id.to_string()));
        if let Some(s) = status {
            q = q.bind(("status", s.as_str()));
        }
        let entries: Vec<SettlementEntry> = q.await?.take(0)?;
        Ok(entries)
    }

    /// Admin view: all entries in one status, oldest first
    pub async fn find_by_status(&self, status: PaymentStatus) -> RepoResult<Vec<SettlementEntry>> {
        let entries: Vec<SettlementEntry> = self
            .base
            .db()
            .query("SELECT * FROM settlement WHERE payment_status = $status ORDER BY created_at")
            .bind(("status", status.as_str()))
            .await?
            .take(0)?;
        Ok(entries)
    }

    /// Flip pending → completed.
    ///
    /// The transition only fires on a pending entry; calling it on an
    /// already-completed entry returns the entry unchanged. The flag
    /// never moves back.
    pub async fn mark_completed(&self, id: &str) -> RepoResult<SettlementEntry> {
        let mut result = self
            .base
            .db()
            .query(
                "UPDATE $thing SET payment_status = 'completed', updated_at = $now \
                 WHERE payment_status = 'pending' RETURN AFTER",
            )
            .bind(("thing", Self::record_id(id)))
            .bind(("now", now_millis()))
            .await?;
        let entries: Vec<SettlementEntry> = result.take(0)?;

        match entries.into_iter().next() {
            Some(entry) => Ok(entry),
            None => self
                .find_by_id(id)
                .await?
                .ok_or_else(|| RepoError::NotFound(format!("Settlement entry {} not found", id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect_mem;

    fn sample_entry(seller: &str, amount: f64) -> SettlementEntry {
        SettlementEntry {
            id: None,
            seller_user_id: seller.to_string(),
            listing_id: "listing:abc".to_string(),
            amount_owed: amount,
            commission: 10.0,
            payment_status: PaymentStatus::Pending,
            created_at: now_millis(),
            updated_at: now_millis(),
        }
    }

    #[tokio::test]
    async fn create_and_filter_by_seller_status() {
        let db = connect_mem().await;
        let repo = SettlementRepository::new(db);

        let a = repo.create(sample_entry("s1", 100.0)).await.unwrap();
        repo.create(sample_entry("s1", 200.0)).await.unwrap();
        repo.create(sample_entry("s2", 300.0)).await.unwrap();

        repo.mark_completed(&a.id.unwrap().to_string()).await.unwrap();

        let all_s1 = repo.find_by_seller("s1", None).await.unwrap();
        assert_eq!(all_s1.len(), 2);

        let pending_s1 = repo
            .find_by_seller("s1", Some(PaymentStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending_s1.len(), 1);
        assert_eq!(pending_s1[0].amount_owed, 200.0);

        let pending_all = repo.find_by_status(PaymentStatus::Pending).await.unwrap();
        assert_eq!(pending_all.len(), 2);
    }

    #[tokio::test]
    async fn mark_completed_is_idempotent_and_never_regresses() {
        let db = connect_mem().await;
        let repo = SettlementRepository::new(db);

        let entry = repo.create(sample_entry("s1", 500.0)).await.unwrap();
        let id = entry.id.unwrap().to_string();

        let first = repo.mark_completed(&id).await.unwrap();
        assert_eq!(first.payment_status, PaymentStatus::Completed);

        // Second call is a no-op success, not an error
        let second = repo.mark_completed(&id).await.unwrap();
        assert_eq!(second.payment_status, PaymentStatus::Completed);
        assert_eq!(second.amount_owed, 500.0);

        let missing = repo.mark_completed("settlement:missing").await;
        assert!(matches!(missing, Err(RepoError::NotFound(_))));
    }
}
