//! Server configuration
//!
//! All settings can be overridden through environment variables:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | WORK_DIR | /var/lib/consign | Work directory (db, assets, logs) |
//! | HTTP_PORT | 4000 | HTTP API port |
//! | CACHE_TTL_SECS | 14400 | Default TTL for cached read views (4h) |
//! | SEARCH_CACHE_TTL_SECS | 30 | TTL for paginated search pages |
//! | PRODUCT_PER_PAGE | 8 | Page size for listing search |
//! | RATE_LIMIT_MAX_REQUESTS | 8 | Requests allowed per window |
//! | RATE_LIMIT_WINDOW_SECS | 30 | Rate limit window |
//! | RESEND_KEY | (empty) | Resend API key; empty disables outbound mail |
//! | MAIL_FROM | see below | From address for notification mail |

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Work directory holding the database, uploaded assets and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Default TTL (seconds) for cached read views
    pub cache_ttl_secs: u64,
    /// TTL (seconds) for paginated search result pages.
    /// Short-lived because pagination keys are volatile.
    pub search_cache_ttl_secs: u64,
    /// Page size for listing search
    pub product_per_page: usize,
    /// Requests allowed per rate-limit window
    pub rate_limit_max_requests: i64,
    /// Rate-limit window length (seconds)
    pub rate_limit_window_secs: u64,
    /// Resend API key; empty disables outbound mail
    pub resend_key: String,
    /// From address for notification mail
    pub mail_from: String,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/consign".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            cache_ttl_secs: std::env::var("CACHE_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60 * 60 * 4),
            search_cache_ttl_secs: std::env::var("SEARCH_CACHE_TTL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            product_per_page: std::env::var("PRODUCT_PER_PAGE")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8),
            rate_limit_max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8),
            rate_limit_window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30),
            resend_key: std::env::var("RESEND_KEY").unwrap_or_default(),
            mail_from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Consign <no-reply@consign.example>".into()),
        }
    }
}
