//! Service layer.

mod example_service;

#[cfg(any(test, feature = "test-utils"))]
pub use example_service::MockExampleService;
pub use example_service::{ExampleManager, ExampleService};
