//! Keyed rate limiting for the public submission routes.

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{connect_info::ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};

use crate::error::AppError;

pub type PublicRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

pub fn build_limiter(per_minute: u32) -> Arc<PublicRateLimiter> {
    let quota = Quota::per_minute(NonZeroU32::new(per_minute.max(1)).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::keyed(quota))
}

/// Best-effort client identity: X-Forwarded-For (first hop) when a
/// proxy set it, otherwise the socket peer address.
pub fn client_ip(req: &Request) -> Option<String> {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return Some(first.to_string());
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

pub async fn public_rate_limit(
    State(limiter): State<Arc<PublicRateLimiter>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = client_ip(&req).unwrap_or_else(|| "unknown".to_string());
    if limiter.check_key(&key).is_err() {
        tracing::warn!(client = %key, "public rate limit exceeded");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_rejects_after_quota() {
        let limiter = build_limiter(2);
        let key = "10.0.0.1".to_string();
        assert!(limiter.check_key(&key).is_ok());
        assert!(limiter.check_key(&key).is_ok());
        assert!(limiter.check_key(&key).is_err());
        // A different client is unaffected.
        assert!(limiter.check_key(&"10.0.0.2".to_string()).is_ok());
    }

    #[test]
    fn sweeping_keeps_recently_seen_clients() {
        let limiter = build_limiter(2);
        let key = "10.0.0.1".to_string();
        assert!(limiter.check_key(&key).is_ok());
        assert!(limiter.check_key(&key).is_ok());

        // The sweep must not reset live buckets.
        limiter.retain_recent();
        assert!(limiter.check_key(&key).is_err());
    }
}
