//! Security headers, CORS, rate limiting and CSRF protection.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{
        header::{
            CONTENT_SECURITY_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
            X_FRAME_OPTIONS, X_XSS_PROTECTION,
        },
        HeaderName, HeaderValue, Method,
    },
    middleware::{from_fn_with_state, Next},
    response::Response,
    Router,
};
use common::{ConfigError, EnvReader, FromEnv};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use super::{
    csrf::{csrf_middleware, CsrfConfig},
    rate_limit::{rate_limit_middleware, RateLimitConfig, RateLimiter},
};

const DEFAULT_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::PUT,
    Method::PATCH,
    Method::POST,
    Method::DELETE,
];

/// Settings read from `SECURE_*` variables.
#[derive(Debug, Clone, Default)]
pub struct SecureConfig {
    pub enabled: bool,
    pub headers: HeaderConfig,
    pub cors: CorsConfig,
    pub rate_limit: RateLimitConfig,
    pub csrf: CsrfConfig,
}

impl FromEnv for SecureConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let env = reader.with_prefix("SECURE_");
        Ok(Self {
            enabled: env.bool_or("ENABLED", false)?,
            headers: HeaderConfig::from_env_reader(&env)?,
            cors: CorsConfig::from_env_reader(&env)?,
            rate_limit: RateLimitConfig::from_env_reader(&env)?,
            csrf: CsrfConfig::from_env_reader(&env)?,
        })
    }
}

/// Response security headers. Empty values are not sent.
#[derive(Debug, Clone)]
pub struct HeaderConfig {
    pub xss_protection: String,
    pub content_type_nosniff: String,
    pub xframe_options: String,
    /// `Strict-Transport-Security` max age in seconds, 0 disables it
    pub hsts_max_age: u64,
    pub content_security_policy: String,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            xss_protection: "1; mode=block".to_string(),
            content_type_nosniff: "nosniff".to_string(),
            xframe_options: "SAMEORIGIN".to_string(),
            hsts_max_age: 3600,
            content_security_policy: "default-src 'self'".to_string(),
        }
    }
}

impl FromEnv for HeaderConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let env = reader.with_prefix("HEADER_");
        let defaults = Self::default();
        Ok(Self {
            xss_protection: env.string_or("XSS", &defaults.xss_protection),
            content_type_nosniff: env.string_or("NO_SNIFF", &defaults.content_type_nosniff),
            xframe_options: env.string_or("XFRAME", &defaults.xframe_options),
            hsts_max_age: env.parse_or("MAX_AGE", defaults.hsts_max_age)?,
            content_security_policy: env.string_or("CSP", &defaults.content_security_policy),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allow_headers: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_origins: Vec<String>,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_headers: Vec::new(),
            allow_methods: Vec::new(),
            allow_origins: vec!["*".to_string()],
            allow_credentials: false,
        }
    }
}

impl FromEnv for CorsConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let env = reader.with_prefix("CORS_");
        Ok(Self {
            allow_headers: env.list("ALLOW_HEADERS"),
            allow_methods: env.list("ALLOW_METHODS"),
            allow_origins: env.list_or("ALLOW_ORIGINS", &["*"]),
            allow_credentials: env.bool_or("ALLOW_CREDENTIALS", false)?,
        })
    }
}

impl CorsConfig {
    /// Build the CORS layer.
    pub fn layer(&self) -> Result<CorsLayer, ConfigError> {
        let origins = if self.allow_origins.iter().any(|o| o == "*") {
            if self.allow_credentials {
                AllowOrigin::mirror_request()
            } else {
                AllowOrigin::any()
            }
        } else {
            AllowOrigin::list(header_values("SECURE_CORS_ALLOW_ORIGINS", &self.allow_origins)?)
        };

        let methods = if self.allow_methods.is_empty() {
            AllowMethods::list(DEFAULT_METHODS)
        } else {
            let methods = self
                .allow_methods
                .iter()
                .map(|m| {
                    Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                        .map_err(|e| ConfigError::invalid("SECURE_CORS_ALLOW_METHODS", m, e))
                })
                .collect::<Result<Vec<_>, _>>()?;
            AllowMethods::list(methods)
        };

        let headers = if self.allow_headers.is_empty() {
            AllowHeaders::mirror_request()
        } else {
            let headers = self
                .allow_headers
                .iter()
                .map(|h| {
                    HeaderName::from_bytes(h.as_bytes())
                        .map_err(|e| ConfigError::invalid("SECURE_CORS_ALLOW_HEADERS", h, e))
                })
                .collect::<Result<Vec<_>, _>>()?;
            AllowHeaders::list(headers)
        };

        Ok(CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(self.allow_credentials))
    }
}

fn header_values(key: &str, values: &[String]) -> Result<Vec<HeaderValue>, ConfigError> {
    values
        .iter()
        .map(|v| HeaderValue::from_str(v).map_err(|e| ConfigError::invalid(key, v, e)))
        .collect()
}

/// The assembled security layers.
#[derive(Debug, Clone)]
pub struct Secure {
    enabled: bool,
    headers: Arc<HeaderConfig>,
    cors: CorsLayer,
    limiter: Arc<RateLimiter>,
    csrf: Arc<CsrfConfig>,
}

impl Secure {
    pub fn new(config: &SecureConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: config.enabled,
            headers: Arc::new(config.headers.clone()),
            cors: config.cors.layer()?,
            limiter: Arc::new(RateLimiter::new(config.rate_limit.clone())),
            csrf: Arc::new(config.csrf.clone()),
        })
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Layer the security middleware onto `router`, outermost first: headers,
    /// CORS, rate limit, CSRF.
    pub fn apply(&self, router: Router) -> Router {
        if !self.enabled {
            tracing::info!("Web secure is disabled");
            return router;
        }

        router
            .layer(from_fn_with_state(self.csrf.clone(), csrf_middleware))
            .layer(from_fn_with_state(self.limiter.clone(), rate_limit_middleware))
            .layer(self.cors.clone())
            .layer(from_fn_with_state(self.headers.clone(), secure_headers_middleware))
    }
}

pub async fn secure_headers_middleware(
    State(config): State<Arc<HeaderConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let https = is_https(&request);
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    let values = [
        (X_XSS_PROTECTION, config.xss_protection.as_str()),
        (X_CONTENT_TYPE_OPTIONS, config.content_type_nosniff.as_str()),
        (X_FRAME_OPTIONS, config.xframe_options.as_str()),
        (CONTENT_SECURITY_POLICY, config.content_security_policy.as_str()),
    ];
    for (name, value) in values {
        if value.is_empty() {
            continue;
        }
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(name, value);
        }
    }

    if https && config.hsts_max_age > 0 {
        let hsts = format!("max-age={}; includeSubdomains", config.hsts_max_age);
        if let Ok(value) = HeaderValue::from_str(&hsts) {
            headers.insert(STRICT_TRANSPORT_SECURITY, value);
        }
    }

    response
}

fn is_https(request: &Request) -> bool {
    request.uri().scheme_str() == Some("https")
        || request
            .headers()
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("https"))
}
