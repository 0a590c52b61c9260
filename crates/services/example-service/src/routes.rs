//! Route configuration.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::example_routes;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create the application router; the server adds health and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(example_routes())
        .with_state(state)
}
