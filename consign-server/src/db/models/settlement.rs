//! Settlement ledger model
//!
//! One entry per sale event: the obligation to pay a seller after a
//! unit of their listing is sold. Append-mostly; only the payment
//! status flag ever changes, and only pending → completed.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
        }
    }
}

/// Settlement ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementEntry {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub seller_user_id: String,
    /// Source listing id as a plain string; the listing may have been
    /// deleted by the time the entry is paid out.
    pub listing_id: String,
    /// Seller's share: unit price × quantity, commission excluded
    pub amount_owed: f64,
    /// Platform share recorded for the same sale
    pub commission: f64,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}
