//! Photo asset reference
//!
//! Value object owned by intake queries and listings; the bytes live
//! in the asset-storage collaborator, only the refs are persisted.

use serde::{Deserialize, Serialize};

/// Reference to an uploaded photo asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRef {
    /// Identifier in the asset store
    pub asset_id: String,
    /// Public URL
    pub url: String,
}
