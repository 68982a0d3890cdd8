//! Intake query model
//!
//! A user's submission of a candidate product for resale. Progresses
//! through an approval state machine driven by admin actions:
//! pending → approved → success, then deleted on rejection or on
//! promotion into a listing.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::{PhotoRef, serde_helpers};

/// Approval state of an intake query. Never regresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Pending,
    Approved,
    Success,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Pending => "pending",
            QueryStatus::Approved => "approved",
            QueryStatus::Success => "success",
        }
    }

    /// The state reached by one admin advance. `Success` is terminal
    /// and advances to itself.
    pub fn next(&self) -> QueryStatus {
        match self {
            QueryStatus::Pending => QueryStatus::Approved,
            QueryStatus::Approved | QueryStatus::Success => QueryStatus::Success,
        }
    }
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Product details embedded in queries and listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub photos: Vec<PhotoRef>,
}

/// Pickup location for the candidate product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupDetails {
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

/// Intake query record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeQuery {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub owner_user_id: String,
    pub owner_email: String,
    pub product_details: ProductDetails,
    pub pickup_details: PickupDetails,
    pub status: QueryStatus,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// Replace-if-present patch for product details
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

impl ProductPatch {
    /// Apply the present fields onto `details`
    pub fn apply(&self, details: &mut ProductDetails) {
        if let Some(v) = &self.name {
            details.name = v.clone();
        }
        if let Some(v) = &self.category {
            details.category = v.clone();
        }
        if let Some(v) = &self.description {
            details.description = v.clone();
        }
        if let Some(v) = self.price {
            details.price = v;
        }
        if let Some(v) = self.stock {
            details.stock = v;
        }
    }
}

/// Replace-if-present patch for pickup details
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PickupPatch {
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl PickupPatch {
    pub fn apply(&self, details: &mut PickupDetails) {
        if let Some(v) = &self.address {
            details.address = v.clone();
        }
        if let Some(v) = &self.city {
            details.city = v.clone();
        }
        if let Some(v) = &self.postal_code {
            details.postal_code = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_advances_and_saturates() {
        assert_eq!(QueryStatus::Pending.next(), QueryStatus::Approved);
        assert_eq!(QueryStatus::Approved.next(), QueryStatus::Success);
        assert_eq!(QueryStatus::Success.next(), QueryStatus::Success);
    }

    #[test]
    fn patch_replaces_only_present_fields() {
        let mut details = ProductDetails {
            name: "Bike".into(),
            category: "sports".into(),
            description: "A bike".into(),
            price: 100.0,
            stock: 2,
            photos: vec![],
        };
        let patch = ProductPatch {
            price: Some(80.0),
            ..Default::default()
        };
        patch.apply(&mut details);
        assert_eq!(details.price, 80.0);
        assert_eq!(details.name, "Bike");
        assert_eq!(details.stock, 2);
    }
}
