//! Example handlers.

use std::collections::HashMap;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};

use common::AppResult;
use server::{RequestId, ValidatedJson, ValidatedQuery};

use crate::model::{
    ExampleCheck, ExampleCheckQuery, ExampleListResponse, ExampleRequest, ExampleResponse,
};
use crate::state::AppState;

/// Create example routes
pub fn example_routes() -> Router<AppState> {
    Router::new()
        .route("/example/check", get(check_example))
        .route("/example/create", post(create_example))
        .route("/examples", get(list_examples))
}

/// Get example check status
#[utoipa::path(
    get,
    path = "/example/check",
    tag = "Example Actions",
    params(ExampleCheckQuery),
    responses(
        (status = 200, description = "Check status per example", body = HashMap<String, HashMap<String, bool>>),
        (status = 400, description = "Invalid filter"),
        (status = 500, description = "Check request failed")
    )
)]
pub async fn check_example(
    State(state): State<AppState>,
    request_id: RequestId,
    ValidatedQuery(filter): ValidatedQuery<ExampleCheckQuery>,
) -> AppResult<Json<ExampleCheck>> {
    let check = state
        .example_service
        .check_example(filter, request_id.0)
        .await?;
    Ok(Json(check))
}

/// Create an example
#[utoipa::path(
    post,
    path = "/example/create",
    tag = "Example Actions",
    request_body = ExampleRequest,
    responses(
        (status = 201, description = "Example created", body = ExampleResponse),
        (status = 400, description = "Invalid example data"),
        (status = 500, description = "Example could not be stored")
    )
)]
pub async fn create_example(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ExampleRequest>,
) -> AppResult<(StatusCode, Json<ExampleResponse>)> {
    let example = state.example_service.create_example(request).await?;
    Ok((StatusCode::CREATED, Json(ExampleResponse { data: example })))
}

/// Get all examples
#[utoipa::path(
    get,
    path = "/examples",
    tag = "Example Actions",
    responses(
        (status = 200, description = "All examples", body = ExampleListResponse),
        (status = 500, description = "Examples could not be loaded")
    )
)]
pub async fn list_examples(State(state): State<AppState>) -> AppResult<Json<ExampleListResponse>> {
    let examples = state.example_service.find_examples().await?;
    Ok(Json(ExampleListResponse { data: examples }))
}
