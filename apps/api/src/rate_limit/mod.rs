//! Per-client rate limiting backed by a keyed counter store.
//!
//! Every request atomically increments the counter for its client key. The
//! first increment attaches the window expiry; once the post-increment value
//! exceeds the limit the request is rejected until the key expires.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use thiserror::Error;

use crate::errors::AppError;

pub mod memory_store;
pub mod redis_store;

pub use memory_store::MemoryCounterStore;
pub use redis_store::RedisCounterStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// An atomic increment-with-expiry key-value service.
///
/// Carried in `AppState` behind an `Arc<dyn CounterStore>`.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increments `key` and returns the post-increment value. When the value
    /// is 1 the key is given a time-to-live of `ttl`.
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64, StoreError>;
}

/// Outcome of an allowed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub count: i64,
    pub limit: i64,
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    max_requests: i64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, max_requests: i64, window: Duration) -> Self {
        Self {
            store,
            max_requests,
            window,
        }
    }

    pub fn max_requests(&self) -> i64 {
        self.max_requests
    }

    /// Counts one request for `key`. Rejects with `RateLimited` once the
    /// window's count exceeds the limit.
    pub async fn check(&self, key: &str) -> Result<Usage, AppError> {
        let count = self
            .store
            .incr_with_expiry(key, self.window)
            .await
            .map_err(|source| AppError::StoreFailure {
                key: key.to_string(),
                source,
            })?;

        if count > self.max_requests {
            tracing::warn!(
                client = %key,
                limit = self.max_requests,
                "Client has reached usage limit, blocking request"
            );
            return Err(AppError::RateLimited {
                limit: self.max_requests,
            });
        }

        Ok(Usage {
            count,
            limit: self.max_requests,
        })
    }
}

/// Derives the client identity: first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then the peer address without its port.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tokio::task::JoinSet;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn limiter() -> RateLimiter {
        RateLimiter::new(Arc::new(MemoryCounterStore::new()), 3, DAY)
    }

    #[tokio::test]
    async fn test_three_requests_allowed_fourth_rejected() {
        let limiter = limiter();
        for expected in 1..=3 {
            let usage = limiter.check("203.0.113.7").await.unwrap();
            assert_eq!(usage, Usage { count: expected, limit: 3 });
        }
        let err = limiter.check("203.0.113.7").await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited { limit: 3 }));

        // Still rejected on subsequent attempts within the window
        assert!(limiter.check("203.0.113.7").await.is_err());
    }

    #[tokio::test]
    async fn test_keys_are_counted_independently() {
        let limiter = limiter();
        for _ in 0..3 {
            limiter.check("a").await.unwrap();
        }
        assert!(limiter.check("a").await.is_err());
        assert_eq!(limiter.check("b").await.unwrap().count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_expiry_resets_counter() {
        let limiter = limiter();
        for _ in 0..3 {
            limiter.check("198.51.100.1").await.unwrap();
        }
        assert!(limiter.check("198.51.100.1").await.is_err());

        tokio::time::advance(DAY + Duration::from_secs(1)).await;

        let usage = limiter.check("198.51.100.1").await.unwrap();
        assert_eq!(usage.count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_anchored_at_first_request() {
        let limiter = limiter();
        limiter.check("k").await.unwrap();
        tokio::time::advance(DAY - Duration::from_secs(60)).await;
        limiter.check("k").await.unwrap();
        limiter.check("k").await.unwrap();
        assert!(limiter.check("k").await.is_err());

        // Later requests do not push the expiry out
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(limiter.check("k").await.unwrap().count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_increments_have_no_gaps_or_duplicates() {
        const K: i64 = 64;
        let store = Arc::new(MemoryCounterStore::new());

        let mut tasks = JoinSet::new();
        for _ in 0..K {
            let store = store.clone();
            tasks.spawn(async move { store.incr_with_expiry("same-client", DAY).await.unwrap() });
        }

        let mut values = Vec::new();
        while let Some(value) = tasks.join_next().await {
            values.push(value.unwrap());
        }
        values.sort_unstable();
        assert_eq!(values, (1..=K).collect::<Vec<_>>());
    }

    #[test]
    fn test_client_key_prefers_first_forwarded_for_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.2, 10.0.0.3"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.9.9.9"));
        let peer: SocketAddr = "127.0.0.1:5555".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "203.0.113.9");
    }

    #[test]
    fn test_client_key_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.9.9.9"));
        let peer: SocketAddr = "127.0.0.1:5555".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "10.9.9.9");
    }

    #[test]
    fn test_client_key_uses_peer_ip_without_port() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "[2001:db8::1]:443".parse().unwrap();
        assert_eq!(client_key(&headers, Some(peer)), "2001:db8::1");
    }

    #[test]
    fn test_client_key_ignores_empty_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(""));
        headers.insert("x-real-ip", HeaderValue::from_static("  "));
        assert_eq!(client_key(&headers, None), "unknown");
    }
}
