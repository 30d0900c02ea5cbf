//! Fixed-window rate limiting for public-facing mutation endpoints.
//!
//! The admission policy lives behind [`RateLimitStore`] so the backing state
//! can be swapped (in-memory map for a single instance, a shared cache for
//! horizontally scaled deployments) without touching callers.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

/// Admission decision store keyed by `bucket:key`.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Returns true when one more request for `key` within `bucket` is
    /// admitted under a fixed window of `window` holding at most
    /// `max_requests` requests.
    ///
    /// An empty key is always admitted (fail-open): callers that cannot
    /// resolve an identity should not be blocked outright.
    async fn allow(&self, key: &str, bucket: &str, window: Duration, max_requests: u32) -> bool;
}

#[derive(Debug)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Process-local rate limit state.
///
/// State resets on restart, which is acceptable for single-instance
/// deployments and explicitly insufficient for horizontally scaled ones.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    windows: DashMap<String, WindowEntry>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose window has elapsed to bound memory.
    fn purge_expired(&self, now: Instant) {
        self.windows.retain(|_, entry| entry.reset_at > now);
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn allow(&self, key: &str, bucket: &str, window: Duration, max_requests: u32) -> bool {
        if key.is_empty() {
            return true;
        }

        let now = Instant::now();
        self.purge_expired(now);

        let mut entry = self
            .windows
            .entry(format!("{}:{}", bucket, key))
            .or_insert_with(|| WindowEntry {
                count: 0,
                reset_at: now + window,
            });

        if now >= entry.reset_at {
            entry.count = 1;
            entry.reset_at = now + window;
            return true;
        }

        let allowed = entry.count < max_requests;
        entry.count += 1;
        allowed
    }
}

/// Middleware state: the store plus the policy for one bucket.
#[derive(Clone)]
pub struct IpRateLimit {
    pub store: Arc<dyn RateLimitStore>,
    pub bucket: String,
    pub window: Duration,
    pub max_requests: u32,
}

impl IpRateLimit {
    pub fn new(
        store: Arc<dyn RateLimitStore>,
        bucket: impl Into<String>,
        window: Duration,
        max_requests: u32,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            window,
            max_requests,
        }
    }
}

/// Middleware for IP-keyed rate limiting.
pub async fn ip_rate_limit_middleware(
    State(limit): State<IpRateLimit>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let forwarded_ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<std::net::IpAddr>().ok());

    let key = if let Some(ip) = forwarded_ip {
        Some(ip.to_string())
    } else {
        request
            .extensions()
            .get::<axum::extract::ConnectInfo<SocketAddr>>()
            .map(|axum::extract::ConnectInfo(addr)| addr.ip().to_string())
    };

    match key {
        Some(key) => {
            if limit
                .store
                .allow(&key, &limit.bucket, limit.window, limit.max_requests)
                .await
            {
                Ok(next.run(request).await)
            } else {
                Err(AppError::TooManyRequests(
                    "Too many requests. Please try again later.".to_string(),
                    Some(limit.window.as_secs()),
                ))
            }
        }
        None => {
            tracing::warn!("Could not determine client IP for rate limiting");
            Ok(next.run(request).await)
        }
    }
}
