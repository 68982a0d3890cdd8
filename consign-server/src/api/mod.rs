//! API route modules
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`queries`] - intake query lifecycle
//! - [`listings`] - consignment listings and promotion
//! - [`orders`] - order placement and fulfillment
//! - [`settlements`] - settlement ledger
//! - [`stock_watch`] - back-in-stock subscriptions

pub mod middleware;
pub mod upload;

pub mod health;
pub mod listings;
pub mod orders;
pub mod queries;
pub mod settlements;
pub mod stock_watch;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Request},
    middleware as axum_middleware,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::core::AppState;

#[derive(Clone, Copy)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

fn build_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(queries::router())
        .merge(listings::router())
        .merge(orders::router())
        .merge(settlements::router())
        .merge(stock_watch::router())
}

/// Assemble the application with all middleware applied
pub fn build_app(state: AppState) -> Router {
    build_router()
        // Rate limit sits inside so it sees the matched route
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit,
        ))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            XRequestId,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
}
