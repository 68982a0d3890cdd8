//! Order model
//!
//! The order document persisted after fulfillment succeeds. Payment
//! capture is out of scope; the order is the trigger for stock
//! depletion and settlement ledger creation.

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
}

impl OrderStatus {
    /// Admin processing step: processing → shipped → delivered
    pub fn next(&self) -> OrderStatus {
        match self {
            OrderStatus::Processing => OrderStatus::Shipped,
            OrderStatus::Shipped | OrderStatus::Delivered => OrderStatus::Delivered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pin_code: String,
}

/// One line of an order: a catalog product or a consignment listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Catalog product id or listing id (`listing:...`)
    pub product_id: String,
    pub quantity: i64,
    /// Unit price charged to the buyer
    pub price: f64,
}

/// Order record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub user_id: String,
    pub shipping_info: ShippingInfo,
    pub order_items: Vec<OrderItem>,
    pub subtotal: f64,
    pub tax: f64,
    #[serde(default)]
    pub shipping_charges: f64,
    #[serde(default)]
    pub discount: f64,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}
