//! Request logging and debug body dumps.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use common::{AppError, ErrorDetail};

use super::request_id::RequestId;

/// Log every request once the response is known.
pub async fn request_log_middleware(request: Request, next: Next) -> Response {
    let id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let mut response = next.run(request).await;
    let status = response.status().as_u16();

    match response.extensions().get::<ErrorDetail>() {
        Some(ErrorDetail(error)) => {
            tracing::error!(
                id = %id,
                method = %method,
                uri = %uri,
                status,
                error = %error,
                "REQUEST_ERROR"
            );
            if method == Method::HEAD {
                *response.body_mut() = Body::empty();
            }
        }
        None => {
            tracing::info!(id = %id, method = %method, uri = %uri, status, "REQUEST");
        }
    }

    response
}

/// Paths excluded from the body dump.
#[derive(Debug, Clone, Default)]
pub struct BodyDump {
    skip_urls: Arc<Vec<String>>,
}

impl BodyDump {
    pub fn new(skip_urls: Vec<String>) -> Self {
        Self {
            skip_urls: Arc::new(skip_urls),
        }
    }

    fn skips(&self, path: &str) -> bool {
        self.skip_urls.iter().any(|url| url == path)
    }
}

/// Log request and response bodies. Installed only when debug is enabled.
pub async fn body_dump_middleware(
    State(dump): State<BodyDump>,
    request: Request,
    next: Next,
) -> Response {
    if dump.skips(request.uri().path()) {
        return next.run(request).await;
    }

    let id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let (parts, body) = request.into_parts();
    let request_body = match buffer(body).await {
        Ok(bytes) => bytes,
        Err(e) => return e.into_response(),
    };
    let request = Request::from_parts(parts, Body::from(request_body.clone()));

    let response = next.run(request).await;
    let (parts, body) = response.into_parts();
    let response_body = match buffer(body).await {
        Ok(bytes) => bytes,
        Err(e) => return e.into_response(),
    };

    tracing::debug!(
        id = %id,
        request = %String::from_utf8_lossy(&request_body),
        response = %String::from_utf8_lossy(&response_body),
        "BODY_DUMP"
    );

    Response::from_parts(parts, Body::from(response_body))
}

async fn buffer(body: Body) -> Result<Bytes, AppError> {
    to_bytes(body, usize::MAX)
        .await
        .map_err(|e| AppError::internal(format!("cannot read the body: {e}")))
}
