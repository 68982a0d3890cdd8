//! Back-in-stock subscription model

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

/// A user's request to be emailed when a catalog product is restocked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockWatch {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub email: String,
    pub product_id: String,
    pub product_name: String,
    #[serde(default)]
    pub created_at: i64,
}
