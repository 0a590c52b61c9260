//! Example repository backed by Postgres and the example check service.

use async_trait::async_trait;
use datatype::CustomTime;
use httphandler::{to_params, HttpHandler, HttpRequest, StatusCode};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, NotSet, QueryOrder, Set};

use super::entities::example::{self, ActiveModel, Entity as ExampleEntity};
use crate::model::{Example, ExampleCheck, ExampleCheckQuery, ExampleRequest};
use common::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Route of the external example check.
pub const EXAMPLE_CHECK_PATH: &str = "/example/check";

/// Example repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ExampleRepository: Send + Sync {
    /// Store a new example
    async fn insert(&self, create: ExampleRequest) -> AppResult<Example>;

    /// List all examples
    async fn find_all(&self) -> AppResult<Vec<Example>>;

    /// Ask the example check service about the filtered examples
    async fn example_check(&self, filter: ExampleCheckQuery, request_id: String) -> AppResult<ExampleCheck>;
}

/// Concrete implementation of ExampleRepository
pub struct ExampleStore {
    db: DatabaseConnection,
    client: HttpHandler,
}

impl ExampleStore {
    pub fn new(db: DatabaseConnection, client: HttpHandler) -> Self {
        Self { db, client }
    }
}

#[async_trait]
impl ExampleRepository for ExampleStore {
    async fn insert(&self, create: ExampleRequest) -> AppResult<Example> {
        let active_model = ActiveModel {
            id: NotSet,
            name: Set(create.name),
            age: Set(create.age),
            email: Set(create.email),
            active: Set(create.active.into_option().unwrap_or(false)),
            birthday: Set(create.birthday),
            created_at: Set(CustomTime::now(false)),
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            tracing::error!(error = %e, "error while inserting example");
            AppError::DocumentNotCreate
        })?;
        Ok(Example::from(model))
    }

    async fn find_all(&self) -> AppResult<Vec<Example>> {
        let models = ExampleEntity::find()
            .order_by_asc(example::Column::Id)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Example::from).collect())
    }

    async fn example_check(&self, filter: ExampleCheckQuery, request_id: String) -> AppResult<ExampleCheck> {
        let params = to_params(&filter).map_err(|e| AppError::internal(e.to_string()))?;
        let request = HttpRequest::get(EXAMPLE_CHECK_PATH)
            .query(params)
            .force_content_type("application/json")
            .request_id(request_id);

        let response = self.client.execute(request).await.map_err(|e| {
            tracing::error!(error = %e, "error while executing example status request");
            AppError::RequestFailed
        })?;

        if response.status != StatusCode::OK {
            tracing::error!(
                status_code = response.status.as_u16(),
                "error while executing example status request - unexpected status code"
            );
            return Err(AppError::RequestFailed);
        }

        response.json().map_err(|e| {
            tracing::error!(error = %e, "error while executing example status request");
            AppError::RequestFailed
        })
    }
}
