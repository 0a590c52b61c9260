//! Rate limiting middleware backed by an in-memory token bucket store.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use common::{AppError, ConfigError, EnvReader, FromEnv};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Tokens added per second
    pub rate: f64,
    pub burst: u32,
    /// Idle time after which a client is forgotten
    pub expires_in: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: 10.0,
            burst: 30,
            expires_in: Duration::from_secs(180),
        }
    }
}

impl FromEnv for RateLimitConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let env = reader.with_prefix("RATE_");
        Ok(Self {
            rate: env.parse_or("LIMIT", 10.0)?,
            burst: env.parse_or("BURST", 30)?,
            expires_in: env.duration_or("EXPIRES_IN", Duration::from_secs(180))?,
        })
    }
}

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
    pub retry_after: Duration,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_seen: Instant,
}

#[derive(Debug)]
struct Store {
    buckets: HashMap<String, Bucket>,
    last_cleanup: Instant,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Mutex<Store>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            store: Mutex::new(Store {
                buckets: HashMap::new(),
                last_cleanup: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Take one token for `identifier`.
    pub fn check(&self, identifier: &str) -> Decision {
        self.check_at(identifier, Instant::now())
    }

    pub fn check_at(&self, identifier: &str, now: Instant) -> Decision {
        let mut store = self.lock();
        let burst = f64::from(self.config.burst);

        if now.saturating_duration_since(store.last_cleanup) >= self.config.expires_in {
            let expires_in = self.config.expires_in;
            store
                .buckets
                .retain(|_, bucket| now.saturating_duration_since(bucket.last_seen) < expires_in);
            store.last_cleanup = now;
        }

        let bucket = store
            .buckets
            .entry(identifier.to_string())
            .or_insert(Bucket {
                tokens: burst,
                last_seen: now,
            });

        let elapsed = now.saturating_duration_since(bucket.last_seen).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.config.rate).min(burst);
        bucket.last_seen = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Decision {
                allowed: true,
                remaining: bucket.tokens.floor() as u32,
                retry_after: Duration::ZERO,
            }
        } else {
            let retry_after = if self.config.rate > 0.0 {
                Duration::try_from_secs_f64((1.0 - bucket.tokens) / self.config.rate)
                    .unwrap_or(Duration::MAX)
            } else {
                self.config.expires_in
            };
            Decision {
                allowed: false,
                remaining: 0,
                retry_after,
            }
        }
    }

    /// Number of tracked clients.
    pub fn tracked(&self) -> usize {
        self.lock().buckets.len()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Rate limit middleware keyed by client IP.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let identifier = get_client_ip(&request, connect_info);
    let decision = limiter.check(&identifier);
    let limit = limiter.config().burst;

    if !decision.allowed {
        tracing::info!(identifier = %identifier, "Access denied while sending too many requests");
        let mut response = AppError::RequestsLimitExceeded.into_response();
        let retry_after = decision.retry_after.as_secs_f64().ceil().max(1.0) as u64;
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        insert_limit_headers(response.headers_mut(), limit, 0);
        return response;
    }

    let mut response = next.run(request).await;
    insert_limit_headers(response.headers_mut(), limit, decision.remaining);
    response
}

fn insert_limit_headers(headers: &mut HeaderMap, limit: u32, remaining: u32) {
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
}

fn get_client_ip(request: &Request<Body>, connect_info: Option<ConnectInfo<SocketAddr>>) -> String {
    // Try X-Forwarded-For header first
    if let Some(forwarded) = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(ip) = forwarded.split(',').next() {
            return ip.trim().to_string();
        }
    }

    if let Some(real_ip) = request
        .headers()
        .get("X-Real-IP")
        .and_then(|h| h.to_str().ok())
    {
        return real_ip.to_string();
    }

    connect_info
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
