//! ACL middleware: basic authentication followed by policy enforcement.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};
use common::AppError;

use super::constant_time_eq;
use crate::acl::Acl;

/// Authenticated ACL subject of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

pub async fn acl_middleware(
    State(acl): State<Arc<Acl>>,
    credentials: Option<TypedHeader<Authorization<Basic>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let method = request.method().to_string();

    match acl.is_public(&route, &method).await {
        Ok(true) => {
            tracing::debug!(route = %route, method = %method, "Authentication skipped for route");
            return next.run(request).await;
        }
        Ok(false) => {
            tracing::debug!(route = %route, method = %method, "Authentication enforced for route");
        }
        Err(e) => {
            tracing::error!(route = %route, error = %e, "error while matching the route");
        }
    }

    let username = match authenticate(&acl, credentials.as_ref().map(|h| &h.0)) {
        Some(username) => username,
        None => return AppError::AuthFailed.into_response(),
    };
    tracing::debug!(route = %route, "Authentication is successfully for route");

    match acl.enforce(&username, &route, &method).await {
        Ok(true) => {
            request.extensions_mut().insert(CurrentUser(username));
            next.run(request).await
        }
        Ok(false) => {
            tracing::error!(
                status = 403,
                error = "permission denied",
                user = %username,
                route = %route,
                method = %method,
                "error while using the acl enforcer"
            );
            AppError::PermFailed.into_response()
        }
        Err(e) => {
            tracing::error!(status = 500, error = %e, "error while using the acl enforcer");
            AppError::PermFailed.into_response()
        }
    }
}

fn authenticate(acl: &Acl, credentials: Option<&Authorization<Basic>>) -> Option<String> {
    let credentials = credentials?;
    let config = acl.config();
    let (expected_user, expected_password) = (config.username.as_deref()?, config.password.as_deref()?);

    let user_ok = constant_time_eq(credentials.username().as_bytes(), expected_user.as_bytes());
    let password_ok = constant_time_eq(credentials.password().as_bytes(), expected_password.as_bytes());

    (user_ok & password_ok).then(|| credentials.username().to_string())
}
