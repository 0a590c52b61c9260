//! Repository layer for data access.

pub mod entities;
mod example_repository;

#[cfg(any(test, feature = "test-utils"))]
pub use example_repository::MockExampleRepository;
pub use example_repository::{ExampleRepository, ExampleStore, EXAMPLE_CHECK_PATH};
