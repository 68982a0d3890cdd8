//! Back-in-stock subscription API module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::AppState;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/v1/stock-watch", watch_routes())
}

fn watch_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handler::subscribe).delete(handler::unsubscribe))
        .route("/admin", get(handler::list_all))
        .route("/notify/{product_id}", post(handler::notify))
}
