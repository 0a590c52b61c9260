//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::model::{Example, ExampleListResponse, ExampleRequest, ExampleResponse};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::example_handler::check_example,
        crate::handlers::example_handler::create_example,
        crate::handlers::example_handler::list_examples,
    ),
    components(schemas(Example, ExampleRequest, ExampleResponse, ExampleListResponse)),
    modifiers(&SecurityAddon),
    tags(
        (name = "Example Actions", description = "Store, list and check examples"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "basic_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
            );
        }
    }
}
