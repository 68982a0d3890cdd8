//! Request middleware: logging and rate limiting

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};

use crate::core::AppState;
use crate::utils::AppError;

/// Log every request with its outcome and latency
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = req.method().clone();
    let uri = req.uri().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let response = next.run(req).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis();
    if status.is_server_error() {
        warn!(request_id = %request_id, %method, %path, status = %status, latency_ms, "Request failed");
    } else {
        info!(request_id = %request_id, %method, %path, status = %status, latency_ms, "Request completed");
    }
    response
}

/// Client identity for the rate-limit bucket: the first
/// `x-forwarded-for` entry when a proxy sits in front, otherwise the
/// peer address. `None` when neither exists.
fn client_key(req: &Request) -> Option<String> {
    let forwarded = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    let ip = forwarded.or_else(|| {
        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    })?;
    Some(format!("rate-limit-{ip}"))
}

/// Fixed-window rate limit per client IP. The counter lives in the
/// cache; a cache failure lets the request through rather than
/// blocking traffic.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(key) = client_key(&req) else {
        // Without a client identity there is no per-client bucket
        return next.run(req).await;
    };
    match state
        .cache
        .increment(&key, state.config.rate_limit_window_secs)
        .await
    {
        Ok(count) if count > state.config.rate_limit_max_requests => {
            warn!(key = %key, count, "Rate limit exceeded");
            AppError::RateLimited.into_response()
        }
        Ok(_) => next.run(req).await,
        Err(e) => {
            warn!(error = %e, "Rate limit counter unavailable, letting request through");
            next.run(req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use crate::core::{AppState, Config};
    use crate::db::connect_mem;
    use crate::services::cache::{Cache, CacheError, MemoryCache};
    use crate::services::catalog::SurrealCatalog;
    use crate::services::testing::{MockAssets, MockMailer};

    struct DownCache;

    #[async_trait]
    impl Cache for DownCache {
        async fn get(&self, _key: &str) -> Option<String> {
            None
        }
        async fn set_with_ttl(
            &self,
            _key: &str,
            _value: String,
            _ttl_secs: u64,
        ) -> Result<(), CacheError> {
            Err(CacheError::Backend("cache down".to_string()))
        }
        async fn delete(&self, _keys: &[String]) -> Result<(), CacheError> {
            Err(CacheError::Backend("cache down".to_string()))
        }
        async fn increment(&self, _key: &str, _ttl_secs: u64) -> Result<i64, CacheError> {
            Err(CacheError::Backend("cache down".to_string()))
        }
    }

    async fn test_app(cache: Arc<dyn Cache>, max_requests: i64) -> Router {
        let db = connect_mem().await;
        let config = Config {
            work_dir: String::new(),
            http_port: 0,
            cache_ttl_secs: 60,
            search_cache_ttl_secs: 30,
            product_per_page: 8,
            rate_limit_max_requests: max_requests,
            rate_limit_window_secs: 30,
            resend_key: String::new(),
            mail_from: String::new(),
        };
        let state = AppState::with_collaborators(
            config,
            db.clone(),
            cache,
            Arc::new(MockAssets::new()),
            Arc::new(MockMailer::new()),
            Arc::new(SurrealCatalog::new(db)),
        );
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(from_fn_with_state(state, rate_limit))
    }

    fn request_from_peer(addr: &str) -> Request {
        let mut req = Request::builder()
            .uri("/ping")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(addr.parse::<SocketAddr>().unwrap()));
        req
    }

    #[tokio::test]
    async fn request_over_the_window_limit_is_rejected() {
        let app = test_app(Arc::new(MemoryCache::new()), 8).await;

        for _ in 0..8 {
            let response = app
                .clone()
                .oneshot(request_from_peer("10.0.0.1:5000"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app
            .oneshot(request_from_peer("10.0.0.1:5000"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn peers_without_forwarded_header_get_separate_buckets() {
        let app = test_app(Arc::new(MemoryCache::new()), 2).await;

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(request_from_peer("10.0.0.1:5000"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let blocked = app
            .clone()
            .oneshot(request_from_peer("10.0.0.1:5001"))
            .await
            .unwrap();
        assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);

        // A different peer still has a fresh window
        let other = app
            .oneshot(request_from_peer("10.0.0.2:5000"))
            .await
            .unwrap();
        assert_eq!(other.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn forwarded_header_takes_precedence_over_peer() {
        let app = test_app(Arc::new(MemoryCache::new()), 1).await;

        let mut first = request_from_peer("10.0.0.1:5000");
        first
            .headers_mut()
            .insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
        assert_eq!(app.clone().oneshot(first).await.unwrap().status(), StatusCode::OK);

        // Same peer, different forwarded client: its own bucket
        let mut second = request_from_peer("10.0.0.1:5000");
        second
            .headers_mut()
            .insert("x-forwarded-for", "203.0.113.8".parse().unwrap());
        assert_eq!(app.oneshot(second).await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn cache_failure_lets_requests_through() {
        let app = test_app(Arc::new(DownCache), 1).await;

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(request_from_peer("10.0.0.1:5000"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn missing_client_identity_skips_the_limiter() {
        let app = test_app(Arc::new(MemoryCache::new()), 1).await;

        for _ in 0..3 {
            let req = Request::builder().uri("/ping").body(Body::empty()).unwrap();
            let response = app.clone().oneshot(req).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
