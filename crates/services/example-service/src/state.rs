//! Application state for dependency injection.

use std::sync::Arc;

use httphandler::HttpHandler;
use sea_orm::DatabaseConnection;

use crate::repository::ExampleStore;
use crate::service::{ExampleManager, ExampleService};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub example_service: Arc<dyn ExampleService>,
}

impl AppState {
    pub fn new(example_service: Arc<dyn ExampleService>) -> Self {
        Self { example_service }
    }

    /// Wire the store and manager over a live connection and client.
    pub fn from_parts(db: DatabaseConnection, client: HttpHandler) -> Self {
        let repo = Arc::new(ExampleStore::new(db, client));
        Self::new(Arc::new(ExampleManager::new(repo)))
    }
}
