//! Example service - Handles example use cases.

use std::sync::Arc;

use async_trait::async_trait;

use common::AppResult;

use crate::model::{Example, ExampleCheck, ExampleCheckQuery, ExampleRequest};
use crate::repository::ExampleRepository;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Example service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ExampleService: Send + Sync {
    async fn create_example(&self, create: ExampleRequest) -> AppResult<Example>;

    async fn find_examples(&self) -> AppResult<Vec<Example>>;

    async fn check_example(&self, filter: ExampleCheckQuery, request_id: String) -> AppResult<ExampleCheck>;
}

/// Concrete implementation of ExampleService using repository.
pub struct ExampleManager {
    repo: Arc<dyn ExampleRepository>,
}

impl ExampleManager {
    pub fn new(repo: Arc<dyn ExampleRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ExampleService for ExampleManager {
    async fn create_example(&self, create: ExampleRequest) -> AppResult<Example> {
        self.repo.insert(create).await
    }

    async fn find_examples(&self) -> AppResult<Vec<Example>> {
        self.repo.find_all().await
    }

    async fn check_example(&self, filter: ExampleCheckQuery, request_id: String) -> AppResult<ExampleCheck> {
        self.repo.example_check(filter, request_id).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use common::AppError;
    use datatype::{CustomTime, NullBool, NullDate, NullString};
    use mockall::predicate::eq;

    use super::*;
    use crate::repository::MockExampleRepository;

    fn request() -> ExampleRequest {
        ExampleRequest {
            name: "Jane".to_string(),
            age: 34,
            email: "jane@example.com".to_string(),
            active: NullBool::new(true),
            birthday: NullDate::null(),
        }
    }

    fn example(id: i64) -> Example {
        Example {
            id,
            name: "Jane".to_string(),
            age: 34,
            email: "jane@example.com".to_string(),
            active: true,
            birthday: NullDate::null(),
            created_at: CustomTime::default(),
        }
    }

    #[tokio::test]
    async fn create_example_stores_request() {
        let mut repo = MockExampleRepository::new();
        repo.expect_insert()
            .with(eq(request()))
            .times(1)
            .returning(|_| Ok(example(1)));

        let service = ExampleManager::new(Arc::new(repo));
        let created = service.create_example(request()).await.unwrap();

        assert_eq!(created.id, 1);
    }

    #[tokio::test]
    async fn create_example_propagates_errors() {
        let mut repo = MockExampleRepository::new();
        repo.expect_insert()
            .returning(|_| Err(AppError::DocumentNotCreate));

        let service = ExampleManager::new(Arc::new(repo));
        let err = service.create_example(request()).await.unwrap_err();

        assert!(matches!(err, AppError::DocumentNotCreate));
    }

    #[tokio::test]
    async fn find_examples_lists_all() {
        let mut repo = MockExampleRepository::new();
        repo.expect_find_all()
            .returning(|| Ok(vec![example(1), example(2)]));

        let service = ExampleManager::new(Arc::new(repo));
        let examples = service.find_examples().await.unwrap();

        assert_eq!(examples.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn check_example_passes_filter_and_request_id() {
        let filter = ExampleCheckQuery {
            name: Some("Jane".to_string()),
            email: NullString::null(),
            active: NullBool::new(true),
        };

        let mut repo = MockExampleRepository::new();
        repo.expect_example_check()
            .with(eq(filter.clone()), eq("req-1".to_string()))
            .returning(|_, _| {
                Ok(HashMap::from([(
                    "Jane".to_string(),
                    HashMap::from([("active".to_string(), true)]),
                )]))
            });

        let service = ExampleManager::new(Arc::new(repo));
        let check = service
            .check_example(filter, "req-1".to_string())
            .await
            .unwrap();

        assert_eq!(check["Jane"]["active"], true);
    }
}
