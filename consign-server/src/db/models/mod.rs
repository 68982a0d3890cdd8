//! Data models
//!
//! Serde models for the document store plus the patch DTOs used by
//! the services. Timestamps are unix milliseconds.

pub mod intake_query;
pub mod listing;
pub mod order;
pub mod photo;
pub mod serde_helpers;
pub mod settlement;
pub mod stock_watch;

pub use intake_query::{
    IntakeQuery, PickupDetails, PickupPatch, ProductDetails, ProductPatch, QueryStatus,
};
pub use listing::Listing;
pub use order::{Order, OrderItem, OrderStatus, ShippingInfo};
pub use photo::PhotoRef;
pub use settlement::{PaymentStatus, SettlementEntry};
pub use stock_watch::StockWatch;

/// Current time as unix milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
