use std::time::Duration;

use common::ConfigError;
use sea_orm::DbErr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Db(#[from] DbErr),

    #[cfg(feature = "mongodb")]
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error("ping to the database server timed out after {0:?}")]
    PingTimeout(Duration),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
