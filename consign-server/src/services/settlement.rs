//! Settlement ledger queries and payout marking
//!
//! Thin layer over the ledger repository. Entries are created by the
//! consignment service at sale time; here admins review what is owed
//! and flag entries as paid.

use tracing::info;

use crate::db::models::{PaymentStatus, SettlementEntry};
use crate::db::repository::SettlementRepository;
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct SettlementService {
    settlements: SettlementRepository,
}

impl SettlementService {
    pub fn new(settlements: SettlementRepository) -> Self {
        Self { settlements }
    }

    pub async fn get(&self, entry_id: &str) -> AppResult<SettlementEntry> {
        self.settlements
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Settlement {entry_id} not found")))
    }

    pub async fn list_by_seller(
        &self,
        seller_user_id: &str,
        status: Option<PaymentStatus>,
    ) -> AppResult<Vec<SettlementEntry>> {
        Ok(self.settlements.find_by_seller(seller_user_id, status).await?)
    }

    pub async fn list_pending(&self) -> AppResult<Vec<SettlementEntry>> {
        Ok(self.settlements.find_by_status(PaymentStatus::Pending).await?)
    }

    /// Flag an entry as paid out. Idempotent: marking a completed
    /// entry again succeeds without changing it.
    pub async fn mark_completed(&self, entry_id: &str) -> AppResult<SettlementEntry> {
        let entry = self.settlements.mark_completed(entry_id).await?;
        info!(entry_id, "Settlement marked completed");
        Ok(entry)
    }
}
