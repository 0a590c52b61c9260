//! Double submit cookie CSRF protection.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::{AppError, ConfigError, EnvReader, FromEnv};
use rand::{distributions::Alphanumeric, Rng};

use super::constant_time_eq;

#[derive(Debug, Clone)]
pub struct CsrfConfig {
    pub token_length: usize,
    /// Request header carrying the token
    pub token_header: String,
    pub cookie_name: String,
    /// Cookie lifetime in seconds
    pub cookie_max_age: u64,
    pub cookie_secure: bool,
}

impl Default for CsrfConfig {
    fn default() -> Self {
        Self {
            token_length: 32,
            token_header: "X-CSRF-Token".to_string(),
            cookie_name: "_csrf".to_string(),
            cookie_max_age: 86400,
            cookie_secure: false,
        }
    }
}

impl FromEnv for CsrfConfig {
    fn from_env_reader(reader: &EnvReader) -> Result<Self, ConfigError> {
        let env = reader.with_prefix("CSRF_");
        Ok(Self {
            token_length: env.parse_or("TOKEN_LENGTH", 32)?,
            token_header: env.string_or("TOKEN_HEADER", "X-CSRF-Token"),
            cookie_name: env.string_or("COOKIE_NAME", "_csrf"),
            cookie_max_age: env.parse_or("COOKIE_MAX_AGE", 86400)?,
            cookie_secure: env.bool_or("COOKIE_SECURE", false)?,
        })
    }
}

impl CsrfConfig {
    fn cookie(&self, token: String) -> Cookie<'static> {
        let max_age = i64::try_from(self.cookie_max_age).unwrap_or(i64::MAX);
        Cookie::build((self.cookie_name.clone(), token))
            .path("/")
            .max_age(time::Duration::seconds(max_age))
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.cookie_secure)
            .build()
    }
}

/// CSRF token of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

pub async fn csrf_middleware(
    State(config): State<Arc<CsrfConfig>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let token = jar
        .get(&config.cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| generate_token(config.token_length));

    if !is_safe(request.method()) {
        let sent = request
            .headers()
            .get(config.token_header.as_str())
            .and_then(|value| value.to_str().ok());

        match sent {
            None | Some("") => {
                return AppError::http(StatusCode::BAD_REQUEST, "missing csrf token in request header")
                    .into_response();
            }
            Some(sent) if !constant_time_eq(sent.as_bytes(), token.as_bytes()) => {
                return AppError::http(StatusCode::FORBIDDEN, "invalid csrf token").into_response();
            }
            Some(_) => {}
        }
    }

    request.extensions_mut().insert(CsrfToken(token.clone()));

    let response = next.run(request).await;
    (jar.add(config.cookie(token)), response).into_response()
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn generate_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
