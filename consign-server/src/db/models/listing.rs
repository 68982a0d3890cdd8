//! Consignment listing model
//!
//! A product accepted for resale, created only by promoting an
//! intake query in `success` status. Destroyed by admin deletion or
//! automatically when a sale drives stock to zero.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use surrealdb::RecordId;

use super::{ProductDetails, serde_helpers};

/// Consignment listing record
#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RecordId>,
    pub seller_user_id: String,
    pub seller_email: String,
    pub product_details: ProductDetails,
    /// Flat platform markup added per unit sold
    pub commission: f64,
    /// Source intake query id. Promotion dedup key.
    pub promoted_from: String,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Listing {
    /// Buyer-facing unit price: seller's price plus commission
    pub fn total_price(&self) -> f64 {
        self.product_details.price + self.commission
    }

    /// Record id rendered as `listing:id`, empty for unsaved records
    pub fn id_string(&self) -> String {
        self.id.as_ref().map(|id| id.to_string()).unwrap_or_default()
    }
}

// Hand-written so every serialized listing carries the derived
// `total_price` alongside the stored fields. Deserialization ignores
// it, so the stored document never becomes the source of truth for it.
impl Serialize for Listing {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut out = serializer.serialize_struct("Listing", 9)?;
        if let Some(id) = &self.id {
            out.serialize_field("id", &id.to_string())?;
        }
        out.serialize_field("seller_user_id", &self.seller_user_id)?;
        out.serialize_field("seller_email", &self.seller_email)?;
        out.serialize_field("product_details", &self.product_details)?;
        out.serialize_field("commission", &self.commission)?;
        out.serialize_field("total_price", &self.total_price())?;
        out.serialize_field("promoted_from", &self.promoted_from)?;
        out.serialize_field("created_at", &self.created_at)?;
        out.serialize_field("updated_at", &self.updated_at)?;
        out.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::PhotoRef;

    fn sample() -> Listing {
        Listing {
            id: None,
            seller_user_id: "seller1".into(),
            seller_email: "seller1@example.com".into(),
            product_details: ProductDetails {
                name: "Road Bike".into(),
                category: "sports".into(),
                description: "Well kept".into(),
                price: 100.0,
                stock: 3,
                photos: vec![PhotoRef {
                    asset_id: "a1.jpg".into(),
                    url: "/assets/a1.jpg".into(),
                }],
            },
            commission: 10.0,
            promoted_from: "q1".into(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn serialized_listing_carries_total_price() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["total_price"], 110.0);
        assert_eq!(value["commission"], 10.0);
        assert_eq!(value["product_details"]["price"], 100.0);
    }

    #[test]
    fn total_price_survives_a_cache_round_trip() {
        let json = serde_json::to_string(&sample()).unwrap();
        let back: Listing = serde_json::from_str(&json).unwrap();
        // Recomputed from the stored fields, never read back
        assert_eq!(back.total_price(), 110.0);
    }
}
