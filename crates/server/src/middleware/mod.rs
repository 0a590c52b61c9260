//! Middleware for request ids, logging, panic recovery, security and ACL.

pub mod auth;
pub mod csrf;
pub mod rate_limit;
pub mod recover;
pub mod request_id;
pub mod request_log;
pub mod secure;

pub use auth::{acl_middleware, CurrentUser};
pub use csrf::{CsrfConfig, CsrfToken};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use recover::{catch_panic_layer, install_panic_hook, RecoverConfig};
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use request_log::{body_dump_middleware, request_log_middleware, BodyDump};
pub use secure::{CorsConfig, HeaderConfig, Secure, SecureConfig};

/// Compares two secrets without short-circuiting on the first mismatch.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_in_constant_time() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secrets"));
    }
}
